use std::fmt;
use std::time::Duration;

use tracing::{Level, debug, enabled, trace, warn};

use crate::config::{ResolvedConfig, WsioConfig};
use crate::engine::{ConnectRequest, Engine, Session, SessionConfig};
use crate::error::{Error, Result};
use crate::io::{CloseComplete, IoEvents, IoInterface, IoOpenResult, IoSendResult, SendComplete};
use crate::transport::IoState;
use crate::transport::dispatch::{Core, Dispatcher};
use crate::transport::queue::PendingWrite;

struct ActiveSession<S: Session> {
    session: S,
    connection: S::Connection,
}

/// A WebSocket client transport driven by an external [`Engine`].
///
/// `WsIo` implements the five-operation I/O contract: [`create`](Self::create),
/// drop, [`open`](Self::open), [`close`](Self::close), [`send`](Self::send)
/// and the cooperative pump [`dowork`](Self::dowork). Nothing happens in the
/// background; every callback runs inside one of these calls.
///
/// ## Guarantees
///
/// - Send completions fire in `send` order, each exactly once.
/// - `close` cancels every queued write before returning.
/// - At most one engine session is alive at a time.
/// - Dropping the instance performs a full close first.
pub struct WsIo<E: Engine> {
    config: ResolvedConfig,
    session_config: SessionConfig,
    engine: E,
    active: Option<ActiveSession<E::Session>>,
    core: Core,
}

impl<E: Engine> WsIo<E> {
    /// Create a transport in the `NotOpen` state.
    ///
    /// The configuration is copied; the caller may drop or change it
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if `host`, `relative_path` or
    /// `protocol_name` is missing.
    pub fn create(config: &WsioConfig, engine: E) -> Result<Self> {
        let config = config.resolve()?;
        let session_config = SessionConfig::client(&config.protocol_name);

        debug!(
            host = %config.host,
            port = config.port,
            path = %config.relative_path,
            protocol = %config.protocol_name,
            tls = config.use_tls,
            "wsio created"
        );

        Ok(Self {
            config,
            session_config,
            engine,
            active: None,
            core: Core::new(),
        })
    }

    /// Current state.
    pub fn state(&self) -> IoState {
        self.core.state
    }

    /// Check if the transport is open and accepting sends.
    pub fn is_open(&self) -> bool {
        self.core.state == IoState::Open
    }

    /// Number of writes not yet completed.
    pub fn pending_writes(&self) -> usize {
        self.core.queue.len()
    }

    /// Get access to the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Start connecting. Returns as soon as the engine session exists; the
    /// outcome is reported to `events` during a later [`dowork`](Self::dowork).
    ///
    /// # Errors
    ///
    /// - `Error::StateViolation` unless the transport is `NotOpen`
    /// - `Error::Engine` if the session cannot be created or connect fails;
    ///   the transport stays `NotOpen`
    pub fn open(&mut self, events: impl IoEvents + 'static) -> Result<()> {
        self.start_open(Box::new(events))
    }

    /// Close the transport, blocking until teardown is complete.
    ///
    /// A pending open completes with [`IoOpenResult::Cancelled`] and every
    /// queued write with `Cancelled`, before this returns.
    ///
    /// # Errors
    ///
    /// Returns `Error::StateViolation` if the transport is `NotOpen` (nothing
    /// to close) or `Error` (only drop is allowed).
    pub fn close(&mut self) -> Result<()> {
        self.shutdown(None)
    }

    /// Like [`close`](Self::close), then runs `on_close_complete` before
    /// returning.
    pub fn close_with(&mut self, on_close_complete: impl FnOnce() + 'static) -> Result<()> {
        self.shutdown(Some(Box::new(on_close_complete)))
    }

    /// Queue a copy of `bytes` and ask the engine for a writable event.
    ///
    /// `on_send_complete` fires exactly once, from a later `dowork`, `close`
    /// or drop.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyBuffer` if `bytes` is empty
    /// - `Error::StateViolation` unless the transport is `Open`
    /// - `Error::Allocation` / `Error::Queue` if the write cannot be queued
    pub fn send(
        &mut self,
        bytes: &[u8],
        on_send_complete: impl FnOnce(IoSendResult) + 'static,
    ) -> Result<()> {
        self.enqueue(bytes, Some(Box::new(on_send_complete)))
    }

    /// Pump the engine once with a zero timeout.
    ///
    /// Does nothing unless the transport is `Opening` or `Open`. All events
    /// and callbacks of this pump cycle have run when it returns.
    pub fn dowork(&mut self) {
        if !self.core.state.is_pumpable() {
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };

        if self.core.rearm_writable && !self.core.queue.is_empty() {
            match active.session.request_writable(active.connection) {
                Ok(()) => self.core.rearm_writable = false,
                Err(e) => warn!(error = %e, "writable request still failing"),
            }
        }

        let mut dispatcher = Dispatcher::new(&mut self.core, self.config.trusted_ca.as_deref());
        active.session.poll(Duration::ZERO, &mut dispatcher);

        if std::mem::take(&mut self.core.teardown_requested) {
            self.destroy_session();
        }
    }

    fn start_open(&mut self, events: Box<dyn IoEvents>) -> Result<()> {
        if !self.core.state.can_open() {
            return Err(Error::state("open", self.core.state));
        }

        let mut session = self.engine.create_session(&self.session_config)?;

        let request = ConnectRequest {
            host: &self.config.host,
            port: self.config.port,
            path: &self.config.relative_path,
            use_tls: self.config.use_tls,
            origin: &self.config.host,
            protocol_name: &self.config.protocol_name,
            ietf_version: None,
        };

        let connection = match session.connect(&request) {
            Ok(connection) => connection,
            Err(e) => {
                warn!(error = %e, host = %self.config.host, "websocket connect failed to start");
                self.engine.destroy_session(session);
                return Err(e);
            }
        };

        self.active = Some(ActiveSession { session, connection });
        self.core.events = Some(events);
        self.core.rearm_writable = false;
        self.core.teardown_requested = false;
        self.core.state = IoState::Opening;
        debug!(host = %self.config.host, port = self.config.port, "wsio opening");
        Ok(())
    }

    fn shutdown(&mut self, on_close_complete: Option<CloseComplete>) -> Result<()> {
        if !self.core.state.can_close() {
            return Err(Error::state("close", self.core.state));
        }

        self.teardown();

        if let Some(on_close_complete) = on_close_complete {
            on_close_complete();
        }
        Ok(())
    }

    /// Cancel everything in flight and destroy the session.
    fn teardown(&mut self) {
        if self.core.state == IoState::Opening {
            self.core.indicate_open_complete(IoOpenResult::Cancelled);
        }

        let cancelled = self.core.queue.cancel_all();
        self.destroy_session();

        self.core.events = None;
        self.core.rearm_writable = false;
        self.core.state = IoState::NotOpen;
        debug!(cancelled, "wsio closed");
    }

    fn destroy_session(&mut self) {
        if let Some(active) = self.active.take() {
            self.engine.destroy_session(active.session);
        }
    }

    fn enqueue(&mut self, bytes: &[u8], on_send_complete: Option<SendComplete>) -> Result<()> {
        if bytes.is_empty() {
            return Err(Error::EmptyBuffer);
        }
        if !self.core.state.can_send() {
            return Err(Error::state("send", self.core.state));
        }

        if enabled!(Level::TRACE) {
            trace!(len = bytes.len(), bytes = %HexDump(bytes), "wsio send");
        }

        let write = PendingWrite::new(bytes, on_send_complete)?;
        self.core.queue.push_back(write)?;

        if let Some(active) = self.active.as_mut() {
            if let Err(e) = active.session.request_writable(active.connection) {
                warn!(error = %e, "writable request failed, retrying on next pump");
                self.core.rearm_writable = true;
            }
        }
        Ok(())
    }
}

impl<E: Engine> Drop for WsIo<E> {
    fn drop(&mut self) {
        if self.core.state != IoState::NotOpen {
            self.teardown();
        }
    }
}

impl<E: Engine> IoInterface for WsIo<E> {
    fn open(&mut self, events: Box<dyn IoEvents>) -> Result<()> {
        self.start_open(events)
    }

    fn close(&mut self, on_close_complete: Option<CloseComplete>) -> Result<()> {
        self.shutdown(on_close_complete)
    }

    fn send(&mut self, bytes: &[u8], on_send_complete: Option<SendComplete>) -> Result<()> {
        self.enqueue(bytes, on_send_complete)
    }

    fn dowork(&mut self) {
        WsIo::dowork(self);
    }
}

impl<E: Engine> fmt::Debug for WsIo<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsIo")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("state", &self.core.state)
            .field("pending_writes", &self.core.queue.len())
            .field("has_session", &self.active.is_some())
            .finish_non_exhaustive()
    }
}

struct HexDump<'a>(&'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
