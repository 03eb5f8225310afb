//! Routing decision made after every review.

use crate::reviewer::is_approval;

/// Default maximum number of draft attempts before the safety valve.
pub const DEFAULT_RETRY_CEILING: u32 = 3;

/// Where the workflow goes after a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The latest verdict approved the draft.
    Proceed,
    /// Send the draft back to the writer.
    Revise,
    /// Retry ceiling exceeded; produce assets without approval.
    ForcedProceed,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Proceed => write!(f, "proceed_to_asset"),
            Route::Revise => write!(f, "revise"),
            Route::ForcedProceed => write!(f, "proceed_to_asset_forced"),
        }
    }
}

/// Pick the next step. First match wins: retry ceiling, then approval.
pub fn route(attempt_count: u32, latest_feedback: Option<&str>, retry_ceiling: u32) -> Route {
    if attempt_count > retry_ceiling {
        return Route::ForcedProceed;
    }
    match latest_feedback {
        Some(text) if is_approval(text) => Route::Proceed,
        _ => Route::Revise,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_proceeds() {
        assert_eq!(route(1, Some("APPROVED"), 3), Route::Proceed);
    }

    #[test]
    fn rejection_revises_until_ceiling() {
        for attempt in 1..=3 {
            assert_eq!(route(attempt, Some("[CLAIM] nope"), 3), Route::Revise);
        }
    }

    #[test]
    fn over_ceiling_forces_regardless_of_feedback() {
        for feedback in [Some("APPROVED"), Some("[TONE] flat"), Some(""), None] {
            assert_eq!(route(4, feedback, 3), Route::ForcedProceed);
        }
    }

    #[test]
    fn missing_feedback_revises() {
        assert_eq!(route(0, None, 3), Route::Revise);
    }

    #[test]
    fn rejection_mentioning_approved_revises() {
        let feedback = "[CLAIM] The previously approved claim '100%' is unverified";
        assert_eq!(route(1, Some(feedback), 3), Route::Revise);
    }

    #[test]
    fn display_names_transitions() {
        assert_eq!(Route::ForcedProceed.to_string(), "proceed_to_asset_forced");
    }
}
