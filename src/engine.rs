//! Contract with the external WebSocket engine.
//!
//! The engine owns the handshake, framing, TLS and socket polling. The
//! transport drives it through [`Engine`] and [`Session`] and receives every
//! engine event through a single [`EventHandler`] passed into
//! [`Session::poll`]. That handler is the owning transport instance itself;
//! the engine never has to look it up.
//!
//! ## Event flow
//!
//! ```text
//! WsIo::dowork ──► Session::poll(0) ──► EventHandler::on_event(link, event)
//!                                              │
//!                                              ├─► Link::write
//!                                              └─► Link::request_writable
//! ```

use std::fmt;
use std::io;
use std::time::Duration;

use rustls::RootCertStore;

use crate::error::{Error, Result};

/// One entry of the engine's protocol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDescriptor {
    /// Sub-protocol name offered during the upgrade.
    pub name: String,
    /// Engine-private protocol id.
    pub id: u32,
    /// Bytes of per-connection user data the engine should allocate.
    pub per_session_data_size: usize,
    /// Receive buffer size. Zero lets the engine deliver data as it arrives.
    pub rx_buffer_size: usize,
}

impl ProtocolDescriptor {
    /// Descriptor for a client speaking `name`, with no per-connection data
    /// and no atomic receive buffer.
    #[must_use]
    pub fn client(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: 0,
            per_session_data_size: 0,
            rx_buffer_size: 0,
        }
    }
}

/// Parameters for [`Engine::create_session`].
///
/// Sessions are client-only: no listening port, no proxy, no keep-alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Protocol table. Owned by the transport instance that built it.
    pub protocols: Vec<ProtocolDescriptor>,
}

impl SessionConfig {
    /// Session configuration with a single supported sub-protocol.
    #[must_use]
    pub fn client(protocol_name: &str) -> Self {
        Self {
            protocols: vec![ProtocolDescriptor::client(protocol_name)],
        }
    }
}

/// Parameters for [`Session::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRequest<'a> {
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
    pub use_tls: bool,
    /// Value of the `Origin` header.
    pub origin: &'a str,
    pub protocol_name: &'a str,
    /// WebSocket protocol version. `None` selects the latest.
    pub ietf_version: Option<u8>,
}

/// Bytes the engine needs reserved around every outgoing payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendPadding {
    /// Headroom in front of the payload (frame header).
    pub pre: usize,
    /// Tailroom after the payload.
    pub post: usize,
}

impl SendPadding {
    #[must_use]
    pub const fn new(pre: usize, post: usize) -> Self {
        Self { pre, post }
    }
}

/// Outgoing binary payload staged with engine headroom.
///
/// The engine may write its frame header into the headroom and mask the
/// payload in place.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    pre: usize,
    len: usize,
}

impl FrameBuffer {
    /// Stage `payload` between `padding.pre` and `padding.post` zeroed bytes,
    /// reusing the allocation of `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the padded size overflows or cannot
    /// be reserved.
    pub fn stage(mut buf: Vec<u8>, payload: &[u8], padding: SendPadding) -> Result<Self> {
        let total = padding
            .pre
            .checked_add(payload.len())
            .and_then(|n| n.checked_add(padding.post))
            .ok_or_else(|| Error::Allocation("padded frame size overflows usize".into()))?;

        buf.clear();
        buf.try_reserve_exact(total)?;
        buf.resize(padding.pre, 0);
        buf.extend_from_slice(payload);
        buf.resize(total, 0);

        Ok(Self {
            buf,
            pre: padding.pre,
            len: payload.len(),
        })
    }

    /// Payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.buf[self.pre..self.pre + self.len]
    }

    #[inline]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.pre..self.pre + self.len]
    }

    /// Headroom in front of the payload.
    #[inline]
    pub fn headroom_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..self.pre]
    }

    /// Payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Give the allocation back for reuse.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// An event raised by the engine while it is being polled.
#[derive(Debug)]
#[non_exhaustive]
pub enum EngineEvent<'a> {
    /// The client handshake completed.
    Established,
    /// The connection could not be established or was lost.
    ConnectionError,
    /// The connection can accept more outgoing bytes.
    Writable,
    /// Payload bytes arrived.
    Received(&'a [u8]),
    /// The TLS handshake is about to verify the peer; extra trust anchors
    /// may be added to the store.
    LoadExtraVerifyCerts(&'a mut RootCertStore),
    /// Any engine event the transport does not act on.
    Other,
}

impl EngineEvent<'_> {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            EngineEvent::Established => "established",
            EngineEvent::ConnectionError => "connection-error",
            EngineEvent::Writable => "writable",
            EngineEvent::Received(_) => "received",
            EngineEvent::LoadExtraVerifyCerts(_) => "load-extra-verify-certs",
            EngineEvent::Other => "other",
        }
    }
}

/// The live connection, as seen from inside an event callback.
pub trait Link {
    /// Headroom the engine needs around every payload.
    fn send_padding(&self) -> SendPadding {
        SendPadding::default()
    }

    /// Write the payload of `frame` as a binary message.
    ///
    /// Returns the number of payload bytes accepted, which may be fewer than
    /// `frame.len()`.
    fn write(&mut self, frame: &mut FrameBuffer) -> io::Result<usize>;

    /// Ask for a [`EngineEvent::Writable`] event on a later poll.
    fn request_writable(&mut self) -> Result<()>;
}

/// Receiver of engine events. Implemented by the transport.
pub trait EventHandler {
    fn on_event(&mut self, link: &mut dyn Link, event: EngineEvent<'_>);
}

/// An engine session holding at most one client connection.
pub trait Session {
    /// Handle to a connection created by [`Session::connect`].
    type Connection: Copy + fmt::Debug;

    /// Start a client connection. Completion is reported later through
    /// [`EngineEvent::Established`] or [`EngineEvent::ConnectionError`].
    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<Self::Connection>;

    /// Ask for a [`EngineEvent::Writable`] event on a later poll.
    fn request_writable(&mut self, connection: Self::Connection) -> Result<()>;

    /// Service the session once, dispatching every pending event to
    /// `handler` before returning.
    fn poll(&mut self, timeout: Duration, handler: &mut dyn EventHandler);
}

/// Factory and owner of engine sessions.
pub trait Engine {
    type Session: Session;

    fn create_session(&mut self, config: &SessionConfig) -> Result<Self::Session>;

    /// Tear down a session and its connection. No events are raised.
    fn destroy_session(&mut self, session: Self::Session);
}
