//! Flow invocation states.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// State of one flow invocation.
///
/// ```text
/// Pending → Rendering → Requesting → Validating → (Enriching)? → Assembling → Completed
///    ↘            ↘             ↘              ↘                      ↘
///                                  Failed
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// Accepted; input not yet validated.
    Pending,
    /// Preparing the input and rendering the prompt.
    Rendering,
    /// Waiting on the primary generation call.
    Requesting,
    /// Checking the guard and the generation schema.
    Validating,
    /// Running per-entity enrichment.
    Enriching,
    /// Merging, post-processing and the final output check.
    Assembling,
    /// Finished with a valid result.
    Completed,
    /// Finished with an error.
    Failed,
}

impl FlowState {
    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the engine may move from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        use FlowState::*;

        matches!(
            (self, next),
            (Pending, Rendering | Failed)
                | (Rendering, Requesting | Failed)
                | (Requesting, Validating | Failed)
                | (Validating, Enriching | Assembling | Failed)
                | (Enriching, Assembling)
                | (Assembling, Completed | Failed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enriching_never_fails_directly() {
        assert!(FlowState::Enriching.can_transition_to(FlowState::Assembling));
        assert!(!FlowState::Enriching.can_transition_to(FlowState::Failed));
    }

    #[test]
    fn terminal_states_are_final() {
        for next in [FlowState::Pending, FlowState::Failed, FlowState::Completed] {
            assert!(!FlowState::Completed.can_transition_to(next));
            assert!(!FlowState::Failed.can_transition_to(next));
        }
        assert!(FlowState::Failed.is_terminal());
    }

    #[test]
    fn string_form() {
        assert_eq!(FlowState::Enriching.to_string(), "enriching");
        assert_eq!("assembling".parse::<FlowState>().unwrap(), FlowState::Assembling);
    }
}
