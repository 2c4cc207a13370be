//! Worker output and stage summary types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::catalog::WorkerCategory;
use crate::host::WorkerResult;

/// Issue severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Higher is more severe
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Unrecognized severities read as missing, so the aggregator applies its
/// default (or rejects them in strict mode) instead of failing the record.
fn lenient_severity<'de, D>(deserializer: D) -> Result<Option<Severity>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match s.parse() {
            Ok(severity) => Some(severity),
            Err(e) => {
                tracing::warn!("Ignoring issue severity: {}", e);
                None
            }
        },
        Some(other) => {
            tracing::warn!("Ignoring non-string issue severity {}", other);
            None
        }
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub text: String,
    #[serde(
        default,
        deserialize_with = "lenient_severity",
        skip_serializing_if = "Option::is_none"
    )]
    pub severity: Option<Severity>,
}

impl Issue {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity: Some(severity),
        }
    }
}

/// One worker's output for one stage, as reported by the execution host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerOutput {
    pub worker: String,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Free-form keys compared across workers for consensus
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl WorkerOutput {
    pub fn new(worker: impl Into<String>) -> Self {
        Self {
            worker: worker.into(),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn with_finding(mut self, finding: impl Into<String>) -> Self {
        self.key_findings.push(finding.into());
        self
    }

    pub fn with_issue(mut self, issue: Issue) -> Self {
        self.issues.push(issue);
        self
    }

    /// Convert a host result into aggregator input.
    ///
    /// A failed result becomes a single high-severity issue so the rest of
    /// the stage still aggregates.
    pub fn from_result(result: &WorkerResult) -> Self {
        if !result.success {
            let reason = result.error.as_deref().unwrap_or("no error reported");
            return WorkerOutput::new(&result.worker).with_issue(Issue::new(
                format!("Worker {} failed: {}", result.worker, reason),
                Severity::High,
            ));
        }

        match &result.result {
            Value::Object(map) => Self::from_object(&result.worker, map),
            Value::Null => WorkerOutput::new(&result.worker),
            other => WorkerOutput::new(&result.worker).with_data("result", other.clone()),
        }
    }

    /// Field by field, so one malformed field never hides the others.
    /// Anything that cannot be read as a finding, issue or recommendation
    /// is kept in `data` under its own key.
    fn from_object(worker: &str, map: &Map<String, Value>) -> Self {
        let mut output = WorkerOutput::new(worker);

        for (key, value) in map {
            match key.as_str() {
                "worker" => {}
                "keyFindings" => match string_list(value) {
                    Some(list) => output.key_findings = list,
                    None => output.keep_malformed(key, value),
                },
                "recommendations" => match string_list(value) {
                    Some(list) => output.recommendations = list,
                    None => output.keep_malformed(key, value),
                },
                "issues" => match value {
                    Value::Array(items) => {
                        output.issues = items.iter().map(issue_from_value).collect()
                    }
                    _ => output.keep_malformed(key, value),
                },
                _ => {
                    output.data.insert(key.clone(), value.clone());
                }
            }
        }

        output
    }

    fn keep_malformed(&mut self, key: &str, value: &Value) {
        tracing::warn!("Malformed {} in output from {}; kept as data", key, self.worker);
        self.data.insert(key.to_string(), value.clone());
    }
}

/// Strings pass through, other scalars and objects become their JSON text
fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::String(s) => Some(vec![s.clone()]),
        _ => None,
    }
}

fn issue_from_value(value: &Value) -> Issue {
    match value {
        Value::String(text) => Issue {
            text: text.clone(),
            severity: None,
        },
        Value::Object(_) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::warn!("Unstructured issue {}: {}", value, e);
            Issue {
                text: value.to_string(),
                severity: None,
            }
        }),
        other => Issue {
            text: other.to_string(),
            severity: None,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub worker: String,
    pub finding: String,
}

/// An issue after severity defaulting, tagged with its source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedIssue {
    pub worker: String,
    pub text: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusEntry {
    pub key: String,
    pub value: Value,
    pub workers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergentValue {
    pub value: Value,
    pub workers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceEntry {
    pub key: String,
    pub values: Vec<DivergentValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: WorkerCategory,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Finding>,
    pub consensus: Vec<ConsensusEntry>,
    pub divergence: Vec<DivergenceEntry>,
    /// Every issue, most severe first
    pub critical_issues: Vec<RankedIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoKind {
    /// From the next phase's template list
    Planned,
    /// Added because a data marker was present
    Conditional,
    /// Fixes a high or critical issue
    Corrective,
    /// Settles a divergence
    Decision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub task: String,
    pub priority: TodoPriority,
    pub assigned_worker: String,
    #[serde(rename = "type")]
    pub kind: TodoKind,
}

impl TodoItem {
    pub fn new(
        task: impl Into<String>,
        priority: TodoPriority,
        assigned_worker: impl Into<String>,
        kind: TodoKind,
    ) -> Self {
        Self {
            task: task.into(),
            priority,
            assigned_worker: assigned_worker.into(),
            kind,
        }
    }
}

/// Summary plus the work it generates for the next stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageAggregate {
    pub summary: StageSummary,
    pub todos: Vec<TodoItem>,
}
