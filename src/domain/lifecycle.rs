//! Lifecycle state machine for video library items.
//!
//! The transition table is exhaustive: anything not listed here is rejected.
//! Same-state transitions are re-entrant no-ops, which is what makes approve
//! idempotent and lets poll re-entry keep an item in `generating`.

use crate::domain::error::DomainError;
use crate::domain::types::AssetStatus;

/// Whether `from -> to` is a legal lifecycle transition.
pub fn is_legal(from: AssetStatus, to: AssetStatus) -> bool {
    use AssetStatus::*;

    if from == to {
        return true;
    }
    // Explicit archive is allowed from every state and never leaves.
    if to == Archived {
        return true;
    }
    if from == Archived {
        return false;
    }
    matches!(
        (from, to),
        (Planned, Generating)
            | (Generating, Extending)
            | (Extending, Generating)
            | (Generating, Ready)
            | (Generating, Planned)
            | (Ready, Approved)
            | (Approved, Generating)
            | (Approved, Published)
    )
}

/// Check a transition, returning the domain error callers propagate.
pub fn check(from: AssetStatus, to: AssetStatus) -> Result<(), DomainError> {
    if is_legal(from, to) {
        Ok(())
    } else {
        Err(DomainError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AssetStatus::*;

    const ALL: [AssetStatus; 7] = [
        Planned, Generating, Extending, Ready, Approved, Published, Archived,
    ];

    #[test]
    fn listed_transitions_are_legal() {
        for (from, to) in [
            (Planned, Generating),
            (Generating, Extending),
            (Extending, Generating),
            (Generating, Ready),
            (Generating, Planned),
            (Ready, Approved),
            (Approved, Generating),
            (Approved, Published),
        ] {
            assert!(is_legal(from, to), "{from:?} -> {to:?} should be legal");
        }
    }

    #[test]
    fn archive_is_reachable_from_everywhere_and_terminal() {
        for from in ALL {
            assert!(is_legal(from, Archived));
        }
        for to in ALL {
            if to != Archived {
                assert!(!is_legal(Archived, to), "archived -> {to:?} must be rejected");
            }
        }
    }

    #[test]
    fn self_transitions_are_reentrant() {
        for status in ALL {
            assert!(is_legal(status, status));
        }
    }

    #[test]
    fn unlisted_transitions_are_rejected() {
        for (from, to) in [
            (Planned, Published),
            (Planned, Ready),
            (Planned, Approved),
            (Ready, Generating),
            (Ready, Published),
            (Published, Generating),
            (Published, Approved),
            (Extending, Ready),
            (Generating, Approved),
            (Generating, Published),
        ] {
            assert!(!is_legal(from, to), "{from:?} -> {to:?} must be rejected");
            assert!(matches!(
                check(from, to),
                Err(DomainError::IllegalTransition { .. })
            ));
        }
    }
}
