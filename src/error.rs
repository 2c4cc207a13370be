//! Structured planning failures
//!
//! Classification and selection never fail; these are the only error kinds
//! the planning core surfaces to callers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanningError {
    /// A request was structurally invalid (e.g. a transition that skips phases)
    #[error("Validation failed ({from} -> {to}): {reason}")]
    ValidationFailure {
        from: String,
        to: String,
        reason: String,
    },

    /// A stage's prerequisite has not been recorded complete
    #[error("Stage {stage} requires {prerequisite} to be completed first")]
    DependencyUnsatisfied { stage: String, prerequisite: String },

    /// A rule or keyword pattern failed the safety validator and was skipped
    #[error("Pattern rejected: {pattern} ({reason})")]
    PatternRejected { pattern: String, reason: String },
}

impl PlanningError {
    pub fn validation(
        from: impl Into<String>,
        to: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PlanningError::ValidationFailure {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }

    pub fn rejected(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanningError::PatternRejected {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}
