//! Scripted in-memory engine.
//!
//! Events queued with [`MockState::script`] are delivered on the next poll,
//! followed by one `Writable` event if the transport asked for one. Writes
//! are accepted according to [`MockState::plan_writes`], or in full when no
//! plan is left.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use wsio::tls::RootCertStore;
use wsio::{
    ConnectRequest, Engine, EngineEvent, Error, EventHandler, FrameBuffer, Link, Result,
    SendPadding, Session, SessionConfig,
};

/// Event the mock engine raises on a later poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Established,
    ConnectionError,
    /// Writable regardless of whether the transport asked for it.
    Writable,
    Received(Vec<u8>),
    LoadExtraVerifyCerts,
    Other,
}

/// How the next call to `write` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePlan {
    /// Accept at most this many bytes.
    Accept(usize),
    /// Fail with an I/O error.
    Fail,
}

/// Owned copy of the last connect request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub use_tls: bool,
    pub origin: String,
    pub protocol_name: String,
    pub ietf_version: Option<u8>,
}

#[derive(Debug)]
pub struct MockState {
    pub fail_create: bool,
    pub fail_connect: bool,
    /// Number of upcoming writable requests that fail.
    pub failing_writable_requests: usize,
    pub padding: SendPadding,

    pub scripted: VecDeque<Scripted>,
    pub write_plan: VecDeque<WritePlan>,

    pub sessions_created: usize,
    pub sessions_destroyed: usize,
    pub session_configs: Vec<SessionConfig>,
    pub connected: Option<Connected>,
    pub writable_requested: bool,
    pub writable_requests: usize,
    pub polls: Vec<Duration>,
    /// Payload bytes of each write call, as accepted.
    pub writes: Vec<Vec<u8>>,
    pub trust_store: RootCertStore,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            fail_create: false,
            fail_connect: false,
            failing_writable_requests: 0,
            padding: SendPadding::default(),
            scripted: VecDeque::new(),
            write_plan: VecDeque::new(),
            sessions_created: 0,
            sessions_destroyed: 0,
            session_configs: Vec::new(),
            connected: None,
            writable_requested: false,
            writable_requests: 0,
            polls: Vec::new(),
            writes: Vec::new(),
            trust_store: RootCertStore::empty(),
        }
    }
}

impl MockState {
    pub fn script(&mut self, event: Scripted) {
        self.scripted.push_back(event);
    }

    pub fn plan_writes(&mut self, plan: impl IntoIterator<Item = WritePlan>) {
        self.write_plan.extend(plan);
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions_created - self.sessions_destroyed
    }

    /// Every accepted byte, in write order.
    pub fn wire_bytes(&self) -> Vec<u8> {
        self.writes.concat()
    }

    fn request_writable(&mut self) -> Result<()> {
        self.writable_requests += 1;
        if self.failing_writable_requests > 0 {
            self.failing_writable_requests -= 1;
            return Err(Error::Engine("writable notification refused".into()));
        }
        self.writable_requested = true;
        Ok(())
    }
}

pub type Shared = Rc<RefCell<MockState>>;

#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    pub state: Shared,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> Shared {
        self.state.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockConnection(pub usize);

#[derive(Debug)]
pub struct MockSession {
    state: Shared,
    connection: Option<MockConnection>,
}

struct MockLink {
    state: Shared,
}

impl Link for MockLink {
    fn send_padding(&self) -> SendPadding {
        self.state.borrow().padding
    }

    fn write(&mut self, frame: &mut FrameBuffer) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        let accepted = match state.write_plan.pop_front() {
            Some(WritePlan::Accept(n)) => n.min(frame.len()),
            Some(WritePlan::Fail) => return Err(io::Error::other("connection reset")),
            None => frame.len(),
        };
        state.writes.push(frame.payload()[..accepted].to_vec());
        Ok(accepted)
    }

    fn request_writable(&mut self) -> Result<()> {
        self.state.borrow_mut().request_writable()
    }
}

impl Session for MockSession {
    type Connection = MockConnection;

    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<MockConnection> {
        let mut state = self.state.borrow_mut();
        if state.fail_connect {
            return Err(Error::Engine("connect refused".into()));
        }
        state.connected = Some(Connected {
            host: request.host.to_string(),
            port: request.port,
            path: request.path.to_string(),
            use_tls: request.use_tls,
            origin: request.origin.to_string(),
            protocol_name: request.protocol_name.to_string(),
            ietf_version: request.ietf_version,
        });
        let connection = MockConnection(state.sessions_created);
        self.connection = Some(connection);
        Ok(connection)
    }

    fn request_writable(&mut self, connection: MockConnection) -> Result<()> {
        assert_eq!(self.connection, Some(connection), "unknown connection");
        self.state.borrow_mut().request_writable()
    }

    fn poll(&mut self, timeout: Duration, handler: &mut dyn EventHandler) {
        self.state.borrow_mut().polls.push(timeout);
        let mut link = MockLink {
            state: self.state.clone(),
        };

        loop {
            let next = self.state.borrow_mut().scripted.pop_front();
            let Some(event) = next else { break };
            match event {
                Scripted::Established => handler.on_event(&mut link, EngineEvent::Established),
                Scripted::ConnectionError => {
                    handler.on_event(&mut link, EngineEvent::ConnectionError)
                }
                Scripted::Writable => handler.on_event(&mut link, EngineEvent::Writable),
                Scripted::Received(bytes) => {
                    handler.on_event(&mut link, EngineEvent::Received(&bytes))
                }
                Scripted::LoadExtraVerifyCerts => {
                    let mut store =
                        std::mem::replace(&mut self.state.borrow_mut().trust_store, RootCertStore::empty());
                    handler.on_event(&mut link, EngineEvent::LoadExtraVerifyCerts(&mut store));
                    self.state.borrow_mut().trust_store = store;
                }
                Scripted::Other => handler.on_event(&mut link, EngineEvent::Other),
            }
        }

        let writable = std::mem::take(&mut self.state.borrow_mut().writable_requested);
        if writable {
            handler.on_event(&mut link, EngineEvent::Writable);
        }
    }
}

impl Engine for MockEngine {
    type Session = MockSession;

    fn create_session(&mut self, config: &SessionConfig) -> Result<MockSession> {
        let mut state = self.state.borrow_mut();
        if state.fail_create {
            return Err(Error::Engine("session creation refused".into()));
        }
        assert_eq!(state.live_sessions(), 0, "more than one live session");
        state.sessions_created += 1;
        state.session_configs.push(config.clone());
        Ok(MockSession {
            state: self.state.clone(),
            connection: None,
        })
    }

    fn destroy_session(&mut self, _session: MockSession) {
        let mut state = self.state.borrow_mut();
        state.sessions_destroyed += 1;
        state.writable_requested = false;
    }
}
