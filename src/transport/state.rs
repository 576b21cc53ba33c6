//! Transport lifecycle state machine.

/// Transport instance state.
///
/// `Error` is terminal: once entered, only dropping (destroying) the instance
/// is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum IoState {
    /// No engine session exists.
    #[default]
    NotOpen,
    /// Session requested, handshake in progress.
    Opening,
    /// Handshake complete, data can flow.
    Open,
    /// A partially sent frame could not be completed.
    Error,
}

impl IoState {
    /// Check if `open` is allowed in this state.
    #[must_use]
    #[inline]
    pub const fn can_open(&self) -> bool {
        matches!(self, IoState::NotOpen)
    }

    /// Check if `close` is allowed in this state.
    ///
    /// Returns `true` for `Opening` or `Open`.
    #[must_use]
    #[inline]
    pub const fn can_close(&self) -> bool {
        matches!(self, IoState::Opening | IoState::Open)
    }

    /// Check if sending data is allowed in this state.
    ///
    /// Returns `true` only for `Open` state.
    #[must_use]
    #[inline]
    pub const fn can_send(&self) -> bool {
        matches!(self, IoState::Open)
    }

    /// Check if the engine should be pumped in this state.
    #[must_use]
    #[inline]
    pub const fn is_pumpable(&self) -> bool {
        matches!(self, IoState::Opening | IoState::Open)
    }
}

impl std::fmt::Display for IoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoState::NotOpen => write!(f, "NotOpen"),
            IoState::Opening => write!(f, "Opening"),
            IoState::Open => write!(f, "Open"),
            IoState::Error => write!(f, "Error"),
        }
    }
}
