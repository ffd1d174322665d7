//! Outbound presentation seam.
//!
//! The core never talks to a transport directly. Everything user-visible
//! goes through [`Presenter::present`], which a channel adapter (Telegram
//! in production, a recording stub in tests) implements however its
//! transport requires.

use async_trait::async_trait;

/// A single actionable button: human label plus an opaque action token
/// that comes back verbatim as a choice event when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Button label shown to the user.
    pub label: String,
    /// Opaque action token, e.g. `"phone:<trip-id>"`.
    pub action: String,
}

impl Choice {
    /// Build a choice from a label and an action token.
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

/// Error delivering a message to a participant.
#[derive(Debug, thiserror::Error)]
#[error("delivery failed: {0}")]
pub struct PresentError(pub String);

/// Delivers a message (optionally with buttons) to a participant.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Present `text` to `user_id`, with `choices` rendered as buttons
    /// when non-empty.
    async fn present(&self, user_id: i64, text: &str, choices: &[Choice])
        -> Result<(), PresentError>;
}
