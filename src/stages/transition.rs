//! Lifecycle phase tracking
//!
//! Phases advance strictly one step at a time, and only once the current
//! phase has been recorded complete.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::WorkerCategory;
use crate::error::PlanningError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowPhase {
    Analysis,
    Design,
    Implementation,
    Testing,
    Deployment,
    Documentation,
}

impl WorkflowPhase {
    pub const ORDERED: [WorkflowPhase; 6] = [
        WorkflowPhase::Analysis,
        WorkflowPhase::Design,
        WorkflowPhase::Implementation,
        WorkflowPhase::Testing,
        WorkflowPhase::Deployment,
        WorkflowPhase::Documentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowPhase::Analysis => "analysis",
            WorkflowPhase::Design => "design",
            WorkflowPhase::Implementation => "implementation",
            WorkflowPhase::Testing => "testing",
            WorkflowPhase::Deployment => "deployment",
            WorkflowPhase::Documentation => "documentation",
        }
    }

    /// The phase that may follow this one
    pub fn successor(&self) -> Option<WorkflowPhase> {
        let idx = Self::ORDERED.iter().position(|p| p == self)?;
        Self::ORDERED.get(idx + 1).copied()
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<WorkerCategory> for WorkflowPhase {
    fn from(category: WorkerCategory) -> Self {
        match category {
            WorkerCategory::Design => WorkflowPhase::Design,
            WorkerCategory::Implementation => WorkflowPhase::Implementation,
            WorkerCategory::Quality => WorkflowPhase::Testing,
            WorkerCategory::Deployment => WorkflowPhase::Deployment,
            WorkerCategory::Documentation => WorkflowPhase::Documentation,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhaseTracker {
    completed: BTreeSet<WorkflowPhase>,
    current: Option<WorkflowPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_complete(&mut self, phase: WorkflowPhase) {
        self.completed.insert(phase);
    }

    pub fn is_complete(&self, phase: WorkflowPhase) -> bool {
        self.completed.contains(&phase)
    }

    /// Last phase successfully transitioned into
    pub fn current(&self) -> Option<WorkflowPhase> {
        self.current
    }

    pub fn request_transition(
        &mut self,
        from: WorkflowPhase,
        to: WorkflowPhase,
    ) -> Result<(), PlanningError> {
        if from.successor() != Some(to) {
            let reason = match from.successor() {
                Some(next) => format!("{} may only advance to {}", from, next),
                None => format!("{} is the final phase", from),
            };
            return Err(PlanningError::validation(from.as_str(), to.as_str(), reason));
        }
        if !self.is_complete(from) {
            return Err(PlanningError::DependencyUnsatisfied {
                stage: to.to_string(),
                prerequisite: from.to_string(),
            });
        }

        tracing::debug!(%from, %to, "Phase transition");
        self.current = Some(to);
        Ok(())
    }
}
