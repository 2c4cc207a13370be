//! Contracts with collaborators outside the planning core
//!
//! The planner never runs workers itself. An [`ExecutionHost`] runs them,
//! a [`DecisionStore`] keeps decision records and an [`EventSink`] receives
//! lifecycle events.

mod decision;
mod events;

pub use decision::{DecisionRecord, DecisionStore, MemoryDecisionStore};
pub use events::{EventSink, LifecycleEvent, TracingEventSink};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of running one worker.
///
/// Timeouts and crashes are reported as values with `success = false`,
/// never as a hung call or a propagated error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub worker: String,
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    /// Context handed back for the next stage
    #[serde(default)]
    pub context: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerResult {
    pub fn success(worker: impl Into<String>, result: Value) -> Self {
        Self {
            worker: worker.into(),
            success: true,
            result,
            context: Value::Null,
            error: None,
        }
    }

    pub fn failure(worker: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            worker: worker.into(),
            success: false,
            result: Value::Null,
            context: Value::Null,
            error: Some(error.into()),
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

/// Runs individual workers. Implementations enforce their own per-worker
/// timeouts and must return a failure result when one fires.
#[async_trait]
pub trait ExecutionHost: Send + Sync {
    async fn execute(&self, worker: &str, task: &str, context: &Value) -> Result<WorkerResult>;

    /// Host name for display
    fn name(&self) -> &str;
}
