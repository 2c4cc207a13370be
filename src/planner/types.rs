use serde::{Deserialize, Serialize};

use crate::analysis::Complexity;
use crate::stages::WorkflowPlan;

/// Input to one planning call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub task_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_override: Option<Complexity>,
    /// Always selected and never dropped by truncation
    #[serde(default)]
    pub required_workers: Vec<String>,
    /// Free-text notes of earlier runs
    #[serde(default)]
    pub execution_history: Vec<String>,
}

impl PlanRequest {
    pub fn new(task_text: impl Into<String>) -> Self {
        Self {
            task_text: task_text.into(),
            ..Default::default()
        }
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity_override = Some(complexity);
        self
    }

    pub fn require(mut self, worker: impl Into<String>) -> Self {
        self.required_workers.push(worker.into());
        self
    }

    pub fn with_history(mut self, entry: impl Into<String>) -> Self {
        self.execution_history.push(entry.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan: WorkflowPlan,
    /// One line per selection decision
    pub rationale: String,
    pub selection_time_ms: u64,
    pub cache_hit: bool,
}

/// Cached part of a response
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CachedPlan {
    pub plan: WorkflowPlan,
    pub rationale: String,
}
