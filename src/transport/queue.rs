//! Ordered queue of outgoing writes.

use std::collections::VecDeque;

use bytes::{Buf, Bytes};

use crate::error::{Error, Result};
use crate::io::{IoSendResult, SendComplete};

/// One accepted `send`: an owned copy of the caller's bytes plus its
/// completion callback.
///
/// Partial transmission advances the buffer in place; the unsent tail is
/// never copied or reallocated.
pub(crate) struct PendingWrite {
    remaining: Bytes,
    sent: usize,
    on_send_complete: Option<SendComplete>,
}

impl PendingWrite {
    /// Copy `bytes` into a new write.
    pub fn new(bytes: &[u8], on_send_complete: Option<SendComplete>) -> Result<Self> {
        let mut owned = Vec::new();
        owned.try_reserve_exact(bytes.len())?;
        owned.extend_from_slice(bytes);

        Ok(Self {
            remaining: Bytes::from(owned),
            sent: 0,
            on_send_complete,
        })
    }

    /// Bytes not yet accepted by the engine.
    #[inline]
    pub fn remaining(&self) -> &[u8] {
        &self.remaining
    }

    /// Bytes already accepted by the engine.
    #[inline]
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Total size as submitted.
    #[inline]
    pub fn len(&self) -> usize {
        self.sent + self.remaining.len()
    }

    /// A frame for this write is partly on the wire and cannot be withdrawn.
    #[inline]
    pub fn is_partially_sent(&self) -> bool {
        self.sent > 0
    }

    /// Record that the engine accepted `n` more bytes.
    pub fn advance(&mut self, n: usize) {
        let n = n.min(self.remaining.len());
        self.remaining.advance(n);
        self.sent += n;
    }

    /// Fire the completion callback and release the buffer.
    pub fn complete(mut self, result: IoSendResult) {
        if let Some(on_send_complete) = self.on_send_complete.take() {
            on_send_complete(result);
        }
    }
}

impl std::fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWrite")
            .field("len", &self.len())
            .field("sent", &self.sent)
            .field("has_callback", &self.on_send_complete.is_some())
            .finish()
    }
}

/// Pending writes in `send` order. Only the head is ever transmitted.
#[derive(Debug, Default)]
pub(crate) struct PendingWriteQueue {
    writes: VecDeque<PendingWrite>,
}

impl PendingWriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail.
    ///
    /// On failure the write is dropped without firing its callback.
    pub fn push_back(&mut self, write: PendingWrite) -> Result<()> {
        self.writes
            .try_reserve(1)
            .map_err(|e| Error::Queue(e.to_string()))?;
        self.writes.push_back(write);
        Ok(())
    }

    pub fn front_mut(&mut self) -> Option<&mut PendingWrite> {
        self.writes.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<PendingWrite> {
        self.writes.pop_front()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Complete every write with [`IoSendResult::Cancelled`], head first.
    /// Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        while let Some(write) = self.writes.pop_front() {
            write.complete(IoSendResult::Cancelled);
            cancelled += 1;
        }
        cancelled
    }
}
