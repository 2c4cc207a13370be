//! Cross-worker aggregation for one stage

use serde_json::Value;
use std::collections::BTreeMap;

use crate::catalog::WorkerCategory;
use crate::error::PlanningError;

use super::todo::generate_todos;
use super::types::{
    ConsensusEntry, DivergenceEntry, DivergentValue, Finding, RankedIssue, Severity,
    StageAggregate, StageSummary, WorkerOutput,
};

/// Merges worker outputs into stage summaries and next-stage TODOs
#[derive(Debug, Clone, Default)]
pub struct ContextAggregator {
    /// Reject issues without a severity instead of defaulting to medium
    strict_severity: bool,
}

impl ContextAggregator {
    pub fn new(strict_severity: bool) -> Self {
        Self { strict_severity }
    }

    pub fn is_strict(&self) -> bool {
        self.strict_severity
    }

    /// Summary and next-stage TODO list for one stage's outputs
    pub fn aggregate(
        &self,
        stage: WorkerCategory,
        outputs: &[WorkerOutput],
    ) -> Result<StageAggregate, PlanningError> {
        let summary = self.summarize(stage, outputs)?;
        let todos = generate_todos(&summary, outputs);
        tracing::debug!(
            %stage,
            outputs = outputs.len(),
            consensus = summary.consensus.len(),
            divergence = summary.divergence.len(),
            todos = todos.len(),
            "Stage aggregated"
        );
        Ok(StageAggregate { summary, todos })
    }

    pub fn summarize(
        &self,
        stage: WorkerCategory,
        outputs: &[WorkerOutput],
    ) -> Result<StageSummary, PlanningError> {
        let findings = outputs
            .iter()
            .flat_map(|o| {
                o.key_findings.iter().map(move |f| Finding {
                    worker: o.worker.clone(),
                    finding: f.clone(),
                })
            })
            .collect();

        let recommendations = outputs
            .iter()
            .flat_map(|o| {
                o.recommendations.iter().map(move |r| Finding {
                    worker: o.worker.clone(),
                    finding: r.clone(),
                })
            })
            .collect();

        let critical_issues = self.rank_issues(stage, outputs)?;
        let (consensus, divergence) = compare_keys(outputs);

        Ok(StageSummary {
            stage,
            findings,
            recommendations,
            consensus,
            divergence,
            critical_issues,
        })
    }

    fn rank_issues(
        &self,
        stage: WorkerCategory,
        outputs: &[WorkerOutput],
    ) -> Result<Vec<RankedIssue>, PlanningError> {
        let mut issues = Vec::new();
        for output in outputs {
            for issue in &output.issues {
                let severity = match issue.severity {
                    Some(severity) => severity,
                    None if self.strict_severity => {
                        return Err(PlanningError::validation(
                            output.worker.as_str(),
                            stage.as_str(),
                            format!("issue without a recognized severity: {}", issue.text),
                        ));
                    }
                    None => Severity::default(),
                };
                issues.push(RankedIssue {
                    worker: output.worker.clone(),
                    text: issue.text.clone(),
                    severity,
                });
            }
        }

        // Stable: equal severities keep report order
        issues.sort_by(|a, b| b.severity.rank().cmp(&a.severity.rank()));
        Ok(issues)
    }
}

/// Consensus and divergence over keys reported by more than one worker,
/// in key order
fn compare_keys(outputs: &[WorkerOutput]) -> (Vec<ConsensusEntry>, Vec<DivergenceEntry>) {
    let mut by_key: BTreeMap<&str, Vec<(&str, &Value)>> = BTreeMap::new();
    for output in outputs {
        for (key, value) in &output.data {
            by_key
                .entry(key.as_str())
                .or_default()
                .push((output.worker.as_str(), value));
        }
    }

    let mut consensus = Vec::new();
    let mut divergence = Vec::new();

    for (key, reports) in by_key {
        if reports.len() < 2 {
            continue;
        }

        // Distinct values in first-seen order
        let mut groups: Vec<DivergentValue> = Vec::new();
        for (worker, value) in reports {
            match groups.iter_mut().find(|g| g.value == *value) {
                Some(group) => group.workers.push(worker.to_string()),
                None => groups.push(DivergentValue {
                    value: value.clone(),
                    workers: vec![worker.to_string()],
                }),
            }
        }

        if groups.len() == 1 {
            if let Some(group) = groups.pop() {
                consensus.push(ConsensusEntry {
                    key: key.to_string(),
                    value: group.value,
                    workers: group.workers,
                });
            }
        } else {
            divergence.push(DivergenceEntry {
                key: key.to_string(),
                values: groups,
            });
        }
    }

    (consensus, divergence)
}
