use super::common::*;
use serde_json::json;

use workforce_planner::aggregation::{Severity, TodoKind, WorkerOutput};
use workforce_planner::catalog::WorkerCategory;
use workforce_planner::config::Config;
use workforce_planner::{PlanningError, WorkflowPlanner};

fn design_outputs() -> Vec<WorkerOutput> {
    serde_json::from_value(json!([
        {
            "worker": "api-designer",
            "keyFindings": ["Token refresh needs its own endpoint"],
            "issues": [
                {"text": "Login endpoint lacks rate limiting, a security gap", "severity": "critical"},
                {"text": "Naming is inconsistent"}
            ],
            "recommendations": ["Version the API from day one"],
            "auth_scheme": "jwt",
            "token_ttl_minutes": 15,
            "api_spec": {"paths": ["/login", "/refresh"]}
        },
        {
            "worker": "database-specialist",
            "keyFindings": ["Sessions table needs an index on user_id"],
            "issues": [
                {"text": "Database migrations are missing", "severity": "high"},
                {"text": "Consider partitioning later", "severity": "info"}
            ],
            "auth_scheme": "jwt",
            "token_ttl_minutes": 60,
            "database_schema": "users, sessions"
        }
    ]))
    .expect("valid worker outputs")
}

#[test]
fn test_design_stage_aggregation() {
    let aggregate = test_planner()
        .aggregate(WorkerCategory::Design, &design_outputs())
        .unwrap();
    let summary = &aggregate.summary;

    assert_eq!(summary.findings.len(), 2);
    assert_eq!(summary.recommendations.len(), 1);

    assert_eq!(summary.consensus.len(), 1);
    assert_eq!(summary.consensus[0].key, "auth_scheme");
    assert_eq!(summary.consensus[0].workers, vec!["api-designer", "database-specialist"]);

    assert_eq!(summary.divergence.len(), 1);
    assert_eq!(summary.divergence[0].key, "token_ttl_minutes");
    assert_eq!(summary.divergence[0].values.len(), 2);

    let severities: Vec<Severity> = summary.critical_issues.iter().map(|i| i.severity).collect();
    assert_eq!(
        severities,
        vec![Severity::Critical, Severity::High, Severity::Medium, Severity::Info]
    );

    let corrective: Vec<&str> = aggregate
        .todos
        .iter()
        .filter(|t| t.kind == TodoKind::Corrective)
        .map(|t| t.assigned_worker.as_str())
        .collect();
    assert_eq!(corrective, vec!["security-auditor", "database-specialist"]);

    let kinds: Vec<TodoKind> = aggregate.todos.iter().map(|t| t.kind).collect();
    assert!(kinds.contains(&TodoKind::Planned));
    assert_eq!(kinds.iter().filter(|k| **k == TodoKind::Conditional).count(), 2);
    assert_eq!(kinds.iter().filter(|k| **k == TodoKind::Decision).count(), 1);
}

#[test]
fn test_strict_severity_from_config() {
    let mut config = Config::default();
    config.planner.warmup_enabled = false;
    config.aggregation.strict_severity = true;
    let planner = WorkflowPlanner::new(&config).unwrap();

    let err = planner
        .aggregate(WorkerCategory::Design, &design_outputs())
        .unwrap_err();
    assert!(matches!(err, PlanningError::ValidationFailure { .. }));
    assert_contains(&err.to_string(), "Naming is inconsistent");
}

#[test]
fn test_worker_output_round_trips_free_form_keys() {
    let outputs = design_outputs();
    let json = serde_json::to_value(&outputs).unwrap();

    assert_eq!(json[0]["auth_scheme"], "jwt");
    assert_eq!(json[1]["keyFindings"][0], "Sessions table needs an index on user_id");

    let restored: Vec<WorkerOutput> = serde_json::from_value(json).unwrap();
    assert_eq!(restored, outputs);
}
