//! Records every callback a transport fires, in order.

use std::cell::RefCell;
use std::rc::Rc;

use wsio::{IoEvents, IoOpenResult, IoSendResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    OpenComplete(IoOpenResult),
    Received(Vec<u8>),
    Error,
    SendComplete(usize, IoSendResult),
    CloseComplete,
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<Observed>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connection-level callbacks for `open`.
    pub fn events(&self) -> RecordingEvents {
        RecordingEvents {
            log: self.log.clone(),
        }
    }

    /// Completion callback for the send tagged `id`.
    pub fn on_send(&self, id: usize) -> impl FnOnce(IoSendResult) + 'static {
        let log = self.log.clone();
        move |result| log.borrow_mut().push(Observed::SendComplete(id, result))
    }

    pub fn on_close(&self) -> impl FnOnce() + 'static {
        let log = self.log.clone();
        move || log.borrow_mut().push(Observed::CloseComplete)
    }

    pub fn observed(&self) -> Vec<Observed> {
        self.log.borrow().clone()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Observed> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    pub fn send_completions(&self) -> Vec<(usize, IoSendResult)> {
        self.log
            .borrow()
            .iter()
            .filter_map(|o| match o {
                Observed::SendComplete(id, result) => Some((*id, *result)),
                _ => None,
            })
            .collect()
    }
}

pub struct RecordingEvents {
    log: Rc<RefCell<Vec<Observed>>>,
}

impl IoEvents for RecordingEvents {
    fn on_open_complete(&mut self, result: IoOpenResult) {
        self.log.borrow_mut().push(Observed::OpenComplete(result));
    }

    fn on_bytes_received(&mut self, bytes: &[u8]) {
        self.log.borrow_mut().push(Observed::Received(bytes.to_vec()));
    }

    fn on_error(&mut self) {
        self.log.borrow_mut().push(Observed::Error);
    }
}
