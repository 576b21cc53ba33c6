//! Engine event dispatch.
//!
//! [`Dispatcher`] is handed to [`Session::poll`](crate::engine::Session::poll)
//! by `dowork` and translates every engine event into state and queue
//! changes plus caller callbacks, synchronously.

use tracing::{debug, trace, warn};

use crate::engine::{EngineEvent, EventHandler, FrameBuffer, Link};
use crate::io::{IoEvents, IoOpenResult, IoSendResult};
use crate::tls::{RootCertStore, add_trust_anchors};
use crate::transport::IoState;
use crate::transport::queue::PendingWriteQueue;

/// Mutable state of a transport instance that events act on.
pub(crate) struct Core {
    pub state: IoState,
    pub queue: PendingWriteQueue,
    /// Callbacks registered by the current `open`.
    pub events: Option<Box<dyn IoEvents>>,
    /// A writable request failed and must be retried on the next pump.
    pub rearm_writable: bool,
    /// The session failed during a poll and must be destroyed afterwards.
    pub teardown_requested: bool,
    frame_scratch: Vec<u8>,
}

impl Core {
    pub fn new() -> Self {
        Self {
            state: IoState::NotOpen,
            queue: PendingWriteQueue::new(),
            events: None,
            rearm_writable: false,
            teardown_requested: false,
            frame_scratch: Vec::new(),
        }
    }

    pub fn indicate_error(&mut self) {
        if let Some(events) = self.events.as_mut() {
            events.on_error();
        }
    }

    pub fn indicate_open_complete(&mut self, result: IoOpenResult) {
        if let Some(events) = self.events.as_mut() {
            events.on_open_complete(result);
        }
    }

    fn set_state(&mut self, state: IoState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "wsio state change");
            self.state = state;
        }
    }
}

enum Transmit {
    Complete,
    Partial(usize),
    Failed,
}

/// Event handler bound to one transport instance for one poll.
pub(crate) struct Dispatcher<'a> {
    core: &'a mut Core,
    trusted_ca: Option<&'a str>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(core: &'a mut Core, trusted_ca: Option<&'a str>) -> Self {
        Self { core, trusted_ca }
    }

    fn on_established(&mut self) {
        match self.core.state {
            IoState::Opening => {
                self.core.set_state(IoState::Open);
                self.core.indicate_open_complete(IoOpenResult::Ok);
            }
            IoState::Error => trace!("established event after fail-stop ignored"),
            state => {
                warn!(%state, "unexpected established event");
                self.core.indicate_error();
            }
        }
    }

    fn on_connection_error(&mut self) {
        match self.core.state {
            IoState::Opening => {
                warn!("websocket connect failed");
                self.core.indicate_open_complete(IoOpenResult::Error);
                self.core.set_state(IoState::NotOpen);
                self.core.events = None;
                self.core.teardown_requested = true;
            }
            IoState::Error => trace!("connection error after fail-stop ignored"),
            state => {
                warn!(%state, "connection error reported on an open connection");
                self.core.indicate_error();
            }
        }
    }

    fn on_writable(&mut self, link: &mut dyn Link) {
        let core = &mut *self.core;
        if core.state != IoState::Open {
            // Queued writes stay put until drop cancels them.
            trace!(state = %core.state, pending = core.queue.len(), "writable event ignored");
            return;
        }
        let Some(write) = core.queue.front_mut() else {
            return;
        };

        let scratch = std::mem::take(&mut core.frame_scratch);
        let outcome = match FrameBuffer::stage(scratch, write.remaining(), link.send_padding()) {
            Ok(mut frame) => {
                let requested = frame.len();
                let outcome = match link.write(&mut frame) {
                    Ok(n) if n >= requested => Transmit::Complete,
                    Ok(n) => Transmit::Partial(n),
                    Err(e) => {
                        warn!(error = %e, sent = write.sent(), "websocket write failed");
                        Transmit::Failed
                    }
                };
                core.frame_scratch = frame.into_inner();
                outcome
            }
            Err(e) => {
                warn!(error = %e, "cannot stage outgoing frame");
                Transmit::Failed
            }
        };

        match outcome {
            Transmit::Partial(n) => {
                write.advance(n);
                trace!(accepted = n, sent = write.sent(), total = write.len(), "partial write");
            }
            Transmit::Complete => {
                if let Some(write) = core.queue.pop_front() {
                    trace!(len = write.len(), "write complete");
                    write.complete(IoSendResult::Ok);
                }
            }
            Transmit::Failed => {
                if let Some(write) = core.queue.pop_front() {
                    let partially_sent = write.is_partially_sent();
                    write.complete(IoSendResult::Error);
                    if partially_sent {
                        core.set_state(IoState::Error);
                        core.indicate_error();
                    }
                }
            }
        }

        if !core.queue.is_empty() && core.state == IoState::Open {
            if let Err(e) = link.request_writable() {
                warn!(error = %e, "writable request failed, retrying on next pump");
                core.rearm_writable = true;
            }
        }
    }

    fn on_received(&mut self, bytes: &[u8]) {
        trace!(len = bytes.len(), "bytes received");
        if let Some(events) = self.core.events.as_mut() {
            events.on_bytes_received(bytes);
        }
    }

    fn on_load_verify_certs(&mut self, store: &mut RootCertStore) {
        let Some(pem) = self.trusted_ca else {
            return;
        };
        match add_trust_anchors(pem, store) {
            Ok(added) => debug!(added, "trusted CA loaded"),
            Err(e) => warn!(error = %e, "trusted CA only partially loaded"),
        }
    }
}

impl EventHandler for Dispatcher<'_> {
    fn on_event(&mut self, link: &mut dyn Link, event: EngineEvent<'_>) {
        if self.core.teardown_requested {
            trace!(event = event.name(), "event after connection failure ignored");
            return;
        }

        match event {
            EngineEvent::Established => self.on_established(),
            EngineEvent::ConnectionError => self.on_connection_error(),
            EngineEvent::Writable => self.on_writable(link),
            EngineEvent::Received(bytes) => self.on_received(bytes),
            EngineEvent::LoadExtraVerifyCerts(store) => self.on_load_verify_certs(store),
            EngineEvent::Other => {}
        }
    }
}
