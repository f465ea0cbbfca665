//! Per-invocation lifecycle
//!
//! ```text
//! Idle -> Validating -> Dispatched -> Succeeded
//!              |             |
//!              v             v
//!      ValidationFailed  GenerationFailed
//! ```
//!
//! There is no way back to `Dispatched`: an invocation makes at most one
//! backend call.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::CapabilityKind;

/// Where an invocation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Idle,
    Validating,
    Dispatched,
    Succeeded,
    ValidationFailed,
    GenerationFailed,
}

impl InvocationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::ValidationFailed | Self::GenerationFailed)
    }

    /// Whether `next` may follow `self`
    pub fn can_transition_to(&self, next: InvocationState) -> bool {
        use InvocationState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Dispatched)
                | (Validating, ValidationFailed)
                | (Dispatched, Succeeded)
                | (Dispatched, GenerationFailed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Dispatched => "dispatched",
            Self::Succeeded => "succeeded",
            Self::ValidationFailed => "validation-failed",
            Self::GenerationFailed => "generation-failed",
        }
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flow invocation
#[derive(Debug)]
pub struct Invocation {
    id: Uuid,
    capability: CapabilityKind,
    started_at: DateTime<Utc>,
    clock: Instant,
    state: InvocationState,
}

impl Invocation {
    pub fn new(capability: CapabilityKind) -> Self {
        let id = Uuid::now_v7();
        debug!(%id, %capability, "Invocation::new: called");
        Self {
            id,
            capability,
            started_at: Utc::now(),
            clock: Instant::now(),
            state: InvocationState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn capability(&self) -> CapabilityKind {
        self.capability
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.clock.elapsed().as_millis()
    }

    /// Move to `next`, refusing transitions the lifecycle does not allow
    pub fn transition(&mut self, next: InvocationState) -> bool {
        if !self.state.can_transition_to(next) {
            warn!(
                id = %self.id,
                capability = %self.capability,
                from = %self.state,
                to = %next,
                "Invocation::transition: illegal transition ignored"
            );
            return false;
        }

        debug!(id = %self.id, capability = %self.capability, from = %self.state, to = %next, "Invocation::transition");
        self.state = next;
        if next.is_terminal() {
            info!(
                id = %self.id,
                capability = %self.capability,
                state = %next,
                elapsed_ms = self.elapsed_ms(),
                "invocation finished"
            );
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut inv = Invocation::new(CapabilityKind::Irrigation);
        assert_eq!(inv.state(), InvocationState::Idle);
        assert!(inv.transition(InvocationState::Validating));
        assert!(inv.transition(InvocationState::Dispatched));
        assert!(inv.transition(InvocationState::Succeeded));
        assert!(inv.state().is_terminal());
    }

    #[test]
    fn test_no_redispatch() {
        let mut inv = Invocation::new(CapabilityKind::Irrigation);
        inv.transition(InvocationState::Validating);
        inv.transition(InvocationState::Dispatched);
        inv.transition(InvocationState::GenerationFailed);

        assert!(!inv.transition(InvocationState::Dispatched));
        assert_eq!(inv.state(), InvocationState::GenerationFailed);
    }

    #[test]
    fn test_validation_failure_never_dispatches() {
        let mut inv = Invocation::new(CapabilityKind::Yield);
        inv.transition(InvocationState::Validating);
        assert!(inv.transition(InvocationState::ValidationFailed));
        assert!(!inv.transition(InvocationState::Dispatched));
    }

    #[test]
    fn test_cannot_skip_validation() {
        let mut inv = Invocation::new(CapabilityKind::Pest);
        assert!(!inv.transition(InvocationState::Dispatched));
        assert_eq!(inv.state(), InvocationState::Idle);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(Invocation::new(CapabilityKind::Ask).id(), Invocation::new(CapabilityKind::Ask).id());
    }
}
