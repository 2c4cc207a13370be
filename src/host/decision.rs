use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::analysis::Complexity;
use crate::stages::WorkflowPlan;

/// Architecture decision captured from a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub title: String,
    pub context: String,
    pub decision_text: String,
    pub consequences: Vec<String>,
    pub workers_involved: Vec<String>,
    pub complexity: Complexity,
    pub created_at: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn from_plan(task_text: &str, plan: &WorkflowPlan, rationale: &str) -> Self {
        let title: String = task_text.chars().take(80).collect();
        let stages: Vec<&str> = plan.stages.iter().map(|s| s.name.as_str()).collect();

        let mut consequences = vec![
            format!("Estimated effort of about {:.1} hours", plan.estimated_hours),
            format!("{} execution across {} stages", plan.overall_mode, plan.stages.len()),
        ];
        if plan.stages.iter().any(|s| s.quality_gate.is_some()) {
            consequences.push("Work must pass the quality gate before deployment".to_string());
        }

        Self {
            title: format!("Plan: {}", title),
            context: format!(
                "{} task in the {} domain touching {} module(s)",
                plan.analysis.complexity, plan.analysis.domain, plan.analysis.module_count
            ),
            decision_text: format!(
                "Run {} through stages {}.\n{}",
                plan.worker_set.join(", "),
                stages.join(" -> "),
                rationale
            ),
            consequences,
            workers_involved: plan.worker_set.clone(),
            complexity: plan.analysis.complexity,
            created_at: Utc::now(),
        }
    }
}

/// Storage for decision records. Layout is up to the implementation.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Store a record and return its generated id
    async fn record(&self, record: DecisionRecord) -> Result<String>;

    async fn get(&self, id: &str) -> Result<Option<DecisionRecord>>;

    /// All records, oldest first
    async fn list(&self) -> Result<Vec<(String, DecisionRecord)>>;
}

/// Process-local store; contents are lost on exit
#[derive(Default)]
pub struct MemoryDecisionStore {
    records: RwLock<Vec<(String, DecisionRecord)>>,
}

impl MemoryDecisionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DecisionStore for MemoryDecisionStore {
    async fn record(&self, record: DecisionRecord) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.records.write().await.push((id.clone(), record));
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<DecisionRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|(rid, _)| rid == id)
            .map(|(_, record)| record.clone()))
    }

    async fn list(&self) -> Result<Vec<(String, DecisionRecord)>> {
        Ok(self.records.read().await.clone())
    }
}
