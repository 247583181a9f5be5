//! Checkout composition lifecycle.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// Where a checkout attempt stands.
///
/// State transitions:
/// ```text
/// Composing ──► Validated ──► Submitting ──┬──► Committed
///     ▲             │                      │
///     └─────────────┘◄──────── Failed ◄────┘
/// ```
///
/// Abandoning a validated checkout returns to `Composing` with no side
/// effects. A failed submission keeps the cart so the customer can retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CompositionState {
    /// Cart is being edited.
    #[default]
    Composing,

    /// Cart and details passed validation and a plan can be built.
    Validated,

    /// Persistence plan is being written.
    Submitting,

    /// Every row was written (terminal state).
    Committed,

    /// A write failed part way through.
    Failed,
}

impl CompositionState {
    pub fn can_validate(&self) -> bool {
        matches!(self, CompositionState::Composing)
    }

    pub fn can_submit(&self) -> bool {
        matches!(self, CompositionState::Validated)
    }

    pub fn can_resume_composing(&self) -> bool {
        matches!(self, CompositionState::Validated | CompositionState::Failed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CompositionState::Committed)
    }

    pub fn can_transition_to(&self, target: CompositionState) -> bool {
        match target {
            CompositionState::Composing => self.can_resume_composing(),
            CompositionState::Validated => self.can_validate(),
            CompositionState::Submitting => self.can_submit(),
            CompositionState::Committed | CompositionState::Failed => {
                matches!(self, CompositionState::Submitting)
            }
        }
    }

    /// Moves to `target` if the transition is allowed.
    pub fn transition(self, target: CompositionState) -> Result<CompositionState, OrderError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(OrderError::InvalidCompositionTransition {
                from: self,
                to: target,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionState::Composing => "Composing",
            CompositionState::Validated => "Validated",
            CompositionState::Submitting => "Submitting",
            CompositionState::Committed => "Committed",
            CompositionState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CompositionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
