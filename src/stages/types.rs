//! Execution-stage graph types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::analysis::TaskAnalysis;
use crate::catalog::WorkerCategory;

/// How the workers of one stage are to be run by the execution host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageMode {
    Sequential,
    Parallel,
}

impl fmt::Display for StageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageMode::Sequential => write!(f, "sequential"),
            StageMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// Overall execution shape of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowMode {
    Sequential,
    Parallel,
    /// Mix of sequential and parallel stages
    Hybrid,
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowMode::Sequential => write!(f, "sequential"),
            WorkflowMode::Parallel => write!(f, "parallel"),
            WorkflowMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// An ordered group of workers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    /// Category the stage was built from; `None` for the synthesized fallback stage
    #[serde(default)]
    pub category: Option<WorkerCategory>,
    pub workers: Vec<String>,
    pub mode: StageMode,
    /// All outputs must be reconciled before the next stage starts
    pub sync_point: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_gate: Option<BTreeMap<String, String>>,
}

/// A complete plan for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    pub analysis: TaskAnalysis,
    pub worker_set: Vec<String>,
    pub stages: Vec<Stage>,
    pub overall_mode: WorkflowMode,
    /// Approximate effort in hours. A heuristic, not a commitment.
    pub estimated_hours: f64,
}

impl WorkflowPlan {
    pub fn stage(&self, category: WorkerCategory) -> Option<&Stage> {
        self.stages.iter().find(|s| s.category == Some(category))
    }

    /// Multi-line human readable overview
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} task ({} domain), {} workers, ~{:.1}h, {} execution\n",
            self.analysis.complexity,
            self.analysis.domain,
            self.worker_set.len(),
            self.estimated_hours,
            self.overall_mode
        );
        for (i, stage) in self.stages.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {} [{}{}]: {}\n",
                i + 1,
                stage.name,
                stage.mode,
                if stage.sync_point { ", sync" } else { "" },
                stage.workers.join(", ")
            ));
            if let Some(gate) = &stage.quality_gate {
                let criteria: Vec<String> =
                    gate.iter().map(|(k, v)| format!("{} {}", k, v)).collect();
                out.push_str(&format!("     gate: {}\n", criteria.join(", ")));
            }
        }
        out
    }
}
