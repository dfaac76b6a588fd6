//! Tagged results for the optional pipeline stages
//!
//! Geocoding and semantic matching never fail the search; instead each stage
//! reports whether it produced a value, legitimately found nothing, or did
//! not run at all.

use serde::Serialize;

/// Why a stage did not run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Nothing to look up
    EmptyInput,
    /// "Remote" is never geocoded
    Remote,
    /// No authenticated session for the semantic oracle
    Unauthenticated,
    /// Disabled in configuration
    Disabled,
    /// The request does not need this stage
    NotRequested,
    /// External service failed; carries the diagnostic message
    Unavailable(String),
}

/// Result of an optional stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StageOutcome<T> {
    Resolved(T),
    /// The stage ran and found nothing
    Unresolved,
    Skipped(SkipReason),
}

impl<T> StageOutcome<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, StageOutcome::Resolved(_))
    }

    pub fn resolved(self) -> Option<T> {
        match self {
            StageOutcome::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_resolved(&self) -> Option<&T> {
        match self {
            StageOutcome::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// Diagnostic message when the stage was skipped because of a failure
    pub fn failure(&self) -> Option<&str> {
        match self {
            StageOutcome::Skipped(SkipReason::Unavailable(message)) => Some(message),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for StageOutcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => StageOutcome::Resolved(value),
            None => StageOutcome::Unresolved,
        }
    }
}
