//! Form adapters
//!
//! View-models standing between an operator and the flow layer. They check
//! input against the same constraints the flow layer enforces, publish a
//! pending indicator while an invocation is outstanding, render results as
//! text, and turn every failure into a generic message. Error details only go
//! to the log.

mod adapter;
mod avatar;
mod chat;
mod dashboard;
mod present;

pub use adapter::FormAdapter;
pub use avatar::{AvatarGenerator, ProfilePictureError};
pub use chat::{AssistantChat, ChatMessage, ChatRole, GREETING};
pub use dashboard::DashboardPanel;
pub use present::Presentable;

use crate::schema::FieldError;

/// What a form currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum FormState<O> {
    /// Nothing submitted yet
    Idle,

    /// Rejected before dispatch
    Invalid(Vec<FieldError>),

    /// Invocation outstanding
    Pending,

    Ready(O),

    /// Generic, user-facing failure message
    Failed(String),
}

impl<O> FormState<O> {
    pub fn is_pending(&self) -> bool {
        matches!(self, FormState::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FormState::Ready(_))
    }

    pub fn output(&self) -> Option<&O> {
        match self {
            FormState::Ready(output) => Some(output),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            FormState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl<O> Default for FormState<O> {
    fn default() -> Self {
        FormState::Idle
    }
}
