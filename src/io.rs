//! The transport-neutral I/O contract.
//!
//! A messaging client talks to any transport through [`IoInterface`]:
//! `open`, `close`, `send` and the cooperative pump `dowork`. Creation is the
//! transport's constructor and destruction is `Drop`.
//!
//! Results of asynchronous work are reported through callbacks. Caller state
//! travels inside the callbacks themselves (closure captures or the
//! [`IoEvents`] implementor), so no separate context pointer exists.

use crate::error::Result;

/// Outcome reported by the open-complete callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoOpenResult {
    Ok,
    Error,
    /// `close` was called before the open finished.
    Cancelled,
}

/// Outcome reported by a send-complete callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoSendResult {
    Ok,
    Error,
    /// `close` was called before the bytes were sent.
    Cancelled,
}

/// Callback fired once when a send finishes.
pub type SendComplete = Box<dyn FnOnce(IoSendResult)>;

/// Callback fired once when a close finishes.
pub type CloseComplete = Box<dyn FnOnce()>;

/// Connection-level notifications registered at `open`.
pub trait IoEvents {
    /// The pending open finished.
    fn on_open_complete(&mut self, _result: IoOpenResult) {}

    /// Bytes arrived from the peer, unmodified.
    fn on_bytes_received(&mut self, bytes: &[u8]);

    /// The connection hit an error outside of any open or send.
    fn on_error(&mut self) {}
}

/// [`IoEvents`] built from closures. Only `on_bytes_received` is required.
pub struct IoCallbacks {
    on_open_complete: Option<Box<dyn FnMut(IoOpenResult)>>,
    on_bytes_received: Box<dyn FnMut(&[u8])>,
    on_error: Option<Box<dyn FnMut()>>,
}

impl IoCallbacks {
    #[must_use]
    pub fn new(on_bytes_received: impl FnMut(&[u8]) + 'static) -> Self {
        Self {
            on_open_complete: None,
            on_bytes_received: Box::new(on_bytes_received),
            on_error: None,
        }
    }

    #[must_use]
    pub fn with_on_open_complete(mut self, f: impl FnMut(IoOpenResult) + 'static) -> Self {
        self.on_open_complete = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_on_error(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl IoEvents for IoCallbacks {
    fn on_open_complete(&mut self, result: IoOpenResult) {
        if let Some(f) = self.on_open_complete.as_mut() {
            f(result);
        }
    }

    fn on_bytes_received(&mut self, bytes: &[u8]) {
        (self.on_bytes_received)(bytes);
    }

    fn on_error(&mut self) {
        if let Some(f) = self.on_error.as_mut() {
            f();
        }
    }
}

impl std::fmt::Debug for IoCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoCallbacks")
            .field("on_open_complete", &self.on_open_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

/// Object-safe view of a transport.
pub trait IoInterface {
    /// Start opening. Completion is reported through
    /// [`IoEvents::on_open_complete`] during a later [`dowork`](Self::dowork).
    fn open(&mut self, events: Box<dyn IoEvents>) -> Result<()>;

    /// Close synchronously. `on_close_complete` runs before this returns.
    fn close(&mut self, on_close_complete: Option<CloseComplete>) -> Result<()>;

    /// Queue a copy of `bytes` for sending.
    fn send(&mut self, bytes: &[u8], on_send_complete: Option<SendComplete>) -> Result<()>;

    /// Pump the transport once without blocking.
    fn dowork(&mut self);
}
