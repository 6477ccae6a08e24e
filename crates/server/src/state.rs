//! Per-session lifecycle state machine.

/// Lifecycle state of a session.
///
/// ```text
/// Opening ──▶ Open ──▶ Closing ──▶ Closed
///    │                    ▲
///    └────────────────────┘
/// ```
///
/// `Closed` is terminal. A session that fails before it opens goes
/// straight from `Opening` to `Closing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Opening = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl SessionState {
    /// Returns `true` if moving from `self` to `next` is a valid transition.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Opening, Open) | (Opening, Closing) | (Open, Closing) | (Closing, Closed)
        )
    }

    /// Returns `true` once the session has started shutting down.
    pub fn is_terminating(self) -> bool {
        matches!(self, SessionState::Closing | SessionState::Closed)
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SessionState::Opening,
            1 => SessionState::Open,
            2 => SessionState::Closing,
            _ => SessionState::Closed,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Opening => "opening",
            SessionState::Open => "open",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
