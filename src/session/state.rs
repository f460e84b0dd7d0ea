//! Session lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The phases of a respondent session.
///
/// Progresses Uninitialized → Restoring → Active → Completing → Completed.
/// A retake moves Completed → Retaking → Uninitialized; Active → Retaking
/// is also allowed (abandoning mid-survey and starting over).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uninitialized,
    Restoring,
    Active,
    Completing,
    Completed,
    Retaking,
}

impl SessionPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, target),
            (Uninitialized, Restoring)
                | (Restoring, Active)
                | (Restoring, Completed)
                | (Active, Completing)
                | (Completing, Completed)
                | (Active, Retaking)
                | (Completed, Retaking)
                | (Retaking, Uninitialized)
        )
    }

    /// Whether the session has reached completion.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        Self::Uninitialized
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Restoring => "restoring",
            Self::Active => "active",
            Self::Completing => "completing",
            Self::Completed => "completed",
            Self::Retaking => "retaking",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use SessionPhase::*;
        let transitions = [
            (Uninitialized, Restoring),
            (Restoring, Active),
            (Restoring, Completed),
            (Active, Completing),
            (Completing, Completed),
            (Active, Retaking),
            (Completed, Retaking),
            (Retaking, Uninitialized),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use SessionPhase::*;
        // Skipping restore
        assert!(!Uninitialized.can_transition_to(Active));
        // Completion without the completing phase
        assert!(!Active.can_transition_to(Completed));
        // Going backward
        assert!(!Completed.can_transition_to(Active));
        // Retake must pass through Retaking
        assert!(!Completed.can_transition_to(Uninitialized));
        // Self-transition
        assert!(!Active.can_transition_to(Active));
    }

    #[test]
    fn retake_cycle_reaches_uninitialized() {
        use SessionPhase::*;
        let mut phase = Completed;
        for next in [Retaking, Uninitialized, Restoring, Active] {
            assert!(phase.can_transition_to(next));
            phase = next;
        }
    }

    #[test]
    fn display_matches_serde() {
        use SessionPhase::*;
        for phase in [Uninitialized, Restoring, Active, Completing, Completed, Retaking] {
            let display = format!("{phase}");
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
