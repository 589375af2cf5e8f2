//! UI-agnostic state types
//!
//! The only stateful control flow of a session: whether an exchange is
//! pending. Front ends read [`UiState::controls_enabled`] to decide whether
//! input and send are usable.

/// Awaiting-response state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Thinking,
}

impl UiState {
    pub fn is_thinking(&self) -> bool {
        *self == UiState::Thinking
    }

    /// Input and send controls are enabled only while idle.
    pub fn controls_enabled(&self) -> bool {
        *self == UiState::Idle
    }

    /// `Idle -> Thinking`. Returns false if an exchange is already pending.
    pub fn begin(&mut self) -> bool {
        match self {
            UiState::Idle => {
                *self = UiState::Thinking;
                true
            }
            UiState::Thinking => false,
        }
    }

    /// `Thinking -> Idle`, unconditionally.
    pub fn finish(&mut self) {
        *self = UiState::Idle;
    }
}
