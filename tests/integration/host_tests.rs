use super::common::*;
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};

use workforce_planner::aggregation::{ContextAggregator, Severity, TodoKind, WorkerOutput};
use workforce_planner::catalog::WorkerCategory;
use workforce_planner::host::{
    DecisionRecord, DecisionStore, ExecutionHost, MemoryDecisionStore, WorkerResult,
};
use workforce_planner::PlanRequest;

/// Host that answers from a script; one worker always times out
struct ScriptedHost;

#[async_trait]
impl ExecutionHost for ScriptedHost {
    async fn execute(&self, worker: &str, _task: &str, _context: &Value) -> Result<WorkerResult> {
        if worker == "security-auditor" {
            return Ok(WorkerResult::failure(worker, "timed out after 30s"));
        }
        Ok(WorkerResult::success(
            worker,
            json!({
                "keyFindings": [format!("{} reviewed the change", worker)],
                "verdict": "ship"
            }),
        ))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[tokio::test]
async fn test_partial_failure_flows_into_summary() {
    let host = ScriptedHost;
    let workers = ["test-engineer", "security-auditor", "code-reviewer"];

    let results = join_all(
        workers
            .iter()
            .map(|w| host.execute(w, "review", &Value::Null)),
    )
    .await;

    let outputs: Vec<WorkerOutput> = results
        .into_iter()
        .map(|r| WorkerOutput::from_result(&r.unwrap()))
        .collect();

    let aggregate = test_planner()
        .aggregate(WorkerCategory::Quality, &outputs)
        .unwrap();
    let summary = &aggregate.summary;

    assert_eq!(summary.findings.len(), 2);
    assert_eq!(summary.consensus.len(), 1);
    assert_eq!(summary.consensus[0].workers, vec!["test-engineer", "code-reviewer"]);

    assert_eq!(summary.critical_issues.len(), 1);
    assert_eq!(summary.critical_issues[0].severity, Severity::High);
    assert_contains(&summary.critical_issues[0].text, "timed out");

    assert!(aggregate
        .todos
        .iter()
        .any(|t| t.kind == TodoKind::Corrective));
}

#[test]
fn test_capitalized_critical_issue_reaches_summary() {
    let result = WorkerResult::success(
        "security-auditor",
        json!({
            "keyFindings": ["Session tokens are readable from scripts"],
            "issues": [{"text": "XSS exfiltrates tokens", "severity": "Critical"}]
        }),
    );
    let outputs = vec![WorkerOutput::from_result(&result)];

    let aggregate = test_planner()
        .aggregate(WorkerCategory::Quality, &outputs)
        .unwrap();

    assert_eq!(aggregate.summary.findings.len(), 1);
    assert_eq!(aggregate.summary.critical_issues.len(), 1);
    assert_eq!(aggregate.summary.critical_issues[0].severity, Severity::Critical);
    assert!(aggregate
        .todos
        .iter()
        .any(|t| t.kind == TodoKind::Corrective && t.task.contains("XSS")));
}

#[test]
fn test_unknown_severity_defaults_or_fails_strict() {
    let result = WorkerResult::success(
        "performance-engineer",
        json!({"issues": [{"text": "Cold start is slow", "severity": "severe"}]}),
    );
    let outputs = vec![WorkerOutput::from_result(&result)];

    let summary = ContextAggregator::new(false)
        .summarize(WorkerCategory::Quality, &outputs)
        .unwrap();
    assert_eq!(summary.critical_issues[0].severity, Severity::Medium);

    assert!(ContextAggregator::new(true)
        .summarize(WorkerCategory::Quality, &outputs)
        .is_err());
}

#[test]
fn test_non_object_results_are_kept_as_data() {
    let output = WorkerOutput::from_result(&WorkerResult::success("technical-writer", json!("done")));
    assert_eq!(output.data.get("result"), Some(&json!("done")));

    let output = WorkerOutput::from_result(&WorkerResult::success("technical-writer", Value::Null));
    assert!(output.data.is_empty());
    assert!(output.issues.is_empty());
}

#[tokio::test]
async fn test_decision_record_from_plan_is_stored() -> Result<()> {
    let response = test_planner().plan(PlanRequest::new(AUTH_TASK)).await;
    let record = DecisionRecord::from_plan(AUTH_TASK, &response.plan, &response.rationale);

    assert_eq!(record.workers_involved, response.plan.worker_set);
    assert_eq!(record.complexity, response.plan.analysis.complexity);
    assert!(record
        .consequences
        .iter()
        .any(|c| c.contains("quality gate")));

    let store = MemoryDecisionStore::new();
    let id = store.record(record.clone()).await?;
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(store.get(&id).await?, Some(record));

    Ok(())
}

#[test]
fn test_memory_store_lists_in_insertion_order() {
    let plan = tokio_test::block_on(test_planner().plan(PlanRequest::new("fix typo"))).plan;
    let store = MemoryDecisionStore::new();

    let ids: Vec<String> = ["first", "second", "third"]
        .iter()
        .map(|title| {
            let record = DecisionRecord::from_plan(title, &plan, "");
            tokio_test::block_on(store.record(record)).unwrap()
        })
        .collect();

    let listed = tokio_test::block_on(store.list()).unwrap();
    let listed_ids: Vec<&String> = listed.iter().map(|(id, _)| id).collect();
    assert_eq!(listed_ids, ids.iter().collect::<Vec<_>>());
    assert_eq!(listed[2].1.title, "Plan: third");
}
