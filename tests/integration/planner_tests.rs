use super::common::*;
use anyhow::Result;
use assert_fs::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use workforce_planner::analysis::Complexity;
use workforce_planner::catalog::WorkerCategory;
use workforce_planner::config::Config;
use workforce_planner::host::{EventSink, LifecycleEvent};
use workforce_planner::stages::{PhaseTracker, WorkflowPhase, WorkflowPlan};
use workforce_planner::{PlanRequest, PlanningError, WorkflowPlanner};

#[tokio::test]
async fn test_secure_authentication_plan() {
    let planner = test_planner();
    let response = planner.plan(PlanRequest::new(AUTH_TASK)).await;
    let plan = &response.plan;

    assert_eq!(plan.analysis.complexity, Complexity::Complex);
    assert!(plan.worker_set.len() >= 5);

    let catalog = planner.catalog();
    assert!(plan
        .worker_set
        .iter()
        .filter_map(|w| catalog.get(w))
        .any(|w| has_tag_containing(w, "security")));
    assert!(plan
        .worker_set
        .iter()
        .any(|w| catalog.category_of(w) == Some(WorkerCategory::Quality)));

    let quality = plan.stage(WorkerCategory::Quality).expect("quality stage");
    assert!(quality.quality_gate.is_some());
    assert!(response.rationale.contains("user authentication"));
}

#[tokio::test]
async fn test_typo_fix_plan() {
    let response = test_planner().plan(PlanRequest::new("fix typo")).await;
    let plan = &response.plan;

    assert_eq!(plan.analysis.complexity, Complexity::Simple);
    assert_eq!(plan.worker_set.len(), Complexity::Simple.min_workers());
    assert!(plan.stage(WorkerCategory::Quality).is_none());
}

#[tokio::test]
async fn test_repeated_task_is_served_from_cache() {
    let planner = test_planner();
    let request = PlanRequest::new("build a REST API with database integration and unit tests");

    let mut hits = 0;
    let mut first: Option<WorkflowPlan> = None;
    for _ in 0..20 {
        let response = planner.plan(request.clone()).await;
        if response.cache_hit {
            hits += 1;
        }
        match &first {
            Some(plan) => assert_eq!(plan, &response.plan),
            None => first = Some(response.plan),
        }
    }

    assert!(hits >= 19, "only {} cache hits", hits);
    let stats = planner.cache_stats().await;
    assert_eq!(stats.hits, 19);
    assert_eq!(stats.misses, 1);
    assert!(stats.hit_rate() > 90.0);
}

#[tokio::test]
async fn test_worker_count_within_tier_bounds() {
    let planner = test_planner();
    let tasks = [
        "",
        "   ",
        "fix typo",
        "update readme",
        "add a settings page to the react dashboard",
        "migrate the data pipeline to kafka and also add monitoring",
        AUTH_TASK,
        "design a distributed microservices architecture with event sourcing, \
         kubernetes deployment, observability, compliance audit logging, \
         multi-region failover and a migration plan for legacy systems",
        "🚀 ünïcödé task ✨",
    ];

    for task in tasks {
        for complexity in [None, Some(Complexity::Simple), Some(Complexity::Complex)] {
            let mut request = PlanRequest::new(task);
            request.complexity_override = complexity;
            let plan = planner.plan(request).await.plan;

            let (min, max) = plan.analysis.complexity.worker_bounds();
            let n = plan.worker_set.len();
            assert!(
                (min..=max).contains(&n),
                "{:?} ({:?}): {} workers outside [{}, {}]",
                task,
                complexity,
                n,
                min,
                max
            );
        }
    }
}

#[tokio::test]
async fn test_plan_survives_json_round_trip() -> Result<()> {
    let response = test_planner().plan(PlanRequest::new(AUTH_TASK)).await;

    let json = serde_json::to_string(&response)?;
    let restored: workforce_planner::PlanResponse = serde_json::from_str(&json)?;

    let names = |p: &WorkflowPlan| p.stages.iter().map(|s| s.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&response.plan), names(&restored.plan));
    for (a, b) in response.plan.stages.iter().zip(&restored.plan.stages) {
        assert_eq!(a.workers, b.workers);
        assert_eq!(a.mode, b.mode);
    }
    assert_eq!(response, restored);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_requests_compute_once() {
    let planner = Arc::new(test_planner());

    let mut handles = Vec::new();
    for _ in 0..12 {
        let planner = Arc::clone(&planner);
        handles.push(tokio::spawn(async move {
            planner.plan(PlanRequest::new(AUTH_TASK)).await
        }));
    }

    let mut plans = Vec::new();
    for handle in handles {
        plans.push(handle.await.unwrap().plan);
    }

    assert!(plans.windows(2).all(|w| w[0] == w[1]));
    let stats = planner.cache_stats().await;
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 11);
}

#[tokio::test]
async fn test_cache_evicts_oldest_in_bulk() {
    let mut config = Config::default();
    config.planner.warmup_enabled = false;
    config.planner.cache_capacity = 4;
    config.planner.cache_evict_batch = 2;
    let planner = WorkflowPlanner::new(&config).unwrap();

    for task in ["task one", "task two", "task three", "task four", "task five"] {
        planner.plan(PlanRequest::new(task)).await;
    }

    let stats = planner.cache_stats().await;
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.evictions, 2);

    // oldest entries are gone, newest survive
    assert!(!planner.plan(PlanRequest::new("task one")).await.cache_hit);
    assert!(planner.plan(PlanRequest::new("task five")).await.cache_hit);
}

#[tokio::test]
async fn test_request_fields_take_part_in_caching() {
    let planner = test_planner();
    let base = PlanRequest::new("add unit tests");

    assert!(!planner.plan(base.clone()).await.cache_hit);
    assert!(!planner.plan(base.clone().require("security-auditor")).await.cache_hit);
    assert!(!planner.plan(base.clone().with_history("test-engineer success")).await.cache_hit);
    assert!(!planner.plan(base.clone().with_complexity(Complexity::Complex)).await.cache_hit);
    assert!(planner.plan(base).await.cache_hit);
}

#[tokio::test]
async fn test_required_workers_are_kept() {
    let planner = test_planner();
    let response = planner
        .plan(PlanRequest::new(AUTH_TASK).require("mobile-developer"))
        .await;

    assert!(response.plan.worker_set.contains(&"mobile-developer".to_string()));
    assert!(response.plan.worker_set.len() <= Complexity::Complex.max_workers());
    assert!(response.rationale.contains("mobile-developer was explicitly required"));
}

#[tokio::test]
async fn test_warmup_fills_cache() {
    let mut config = Config::default();
    config.planner.warmup_tasks = vec!["fix typo".to_string(), "build rest api".to_string()];
    let planner = Arc::new(WorkflowPlanner::new(&config).unwrap());

    assert!(planner.start_warmup().await);

    let mut entries = 0;
    for _ in 0..100 {
        entries = planner.cache_stats().await.entries;
        if entries == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(entries, 2);

    assert!(planner.plan(PlanRequest::new("fix typo")).await.cache_hit);
    planner.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_cancels_warmup() {
    let mut config = Config::default();
    config.planner.warmup_tasks = (0..500).map(|i| format!("warm task {}", i)).collect();
    let planner = Arc::new(WorkflowPlanner::new(&config).unwrap());

    assert!(planner.start_warmup().await);
    planner.shutdown().await;

    // foreground planning still works after teardown of the background task
    let response = planner.plan(PlanRequest::new("fix typo")).await;
    assert_eq!(response.plan.analysis.complexity, Complexity::Simple);

    // can be restarted once stopped
    assert!(planner.start_warmup().await);
    planner.shutdown().await;
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &LifecycleEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[tokio::test]
async fn test_plan_emits_lifecycle_events() {
    let sink = Arc::new(RecordingSink::default());
    let planner = test_planner().with_event_sink(sink.clone());

    planner.plan(PlanRequest::new("fix typo")).await;
    planner.plan(PlanRequest::new("fix typo")).await;

    let events = sink.events.lock().unwrap();
    let created: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            LifecycleEvent::PlanCreated { cache_hit, .. } => Some(*cache_hit),
            _ => None,
        })
        .collect();
    assert_eq!(created, vec![false, true]);
    assert!(events.iter().any(|e| matches!(
        e,
        LifecycleEvent::ResourceGauge { name, value, .. } if name == "plan_cache_entries" && *value == 1.0
    )));
}

#[test]
fn test_phase_transitions() {
    let mut tracker = PhaseTracker::new();
    tracker.record_complete(WorkflowPhase::Analysis);

    assert!(tracker
        .request_transition(WorkflowPhase::Analysis, WorkflowPhase::Design)
        .is_ok());

    match tracker.request_transition(WorkflowPhase::Analysis, WorkflowPhase::Testing) {
        Err(PlanningError::ValidationFailure { from, to, .. }) => {
            assert_eq!(from, "analysis");
            assert_eq!(to, "testing");
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_table_overrides_are_loaded_and_versioned() -> Result<()> {
    let dir = assert_fs::TempDir::new()?;
    let catalog = dir.child("catalog.toml");
    catalog.write_str(
        r#"
version = 1

[[workers]]
name = "solo"
category = "implementation"
priority = 1
tags = ["anything"]

[[workers]]
name = "checker"
category = "quality"
priority = 2
"#,
    )?;

    let mut config = Config::default();
    config.planner.warmup_enabled = false;
    config.tables.catalog_path = Some(catalog.path().to_path_buf());
    let planner = WorkflowPlanner::new(&config)?;
    assert_eq!(planner.catalog().len(), 2);

    let future = dir.child("future.toml");
    future.write_str("version = 2\n")?;
    config.tables.catalog_path = Some(future.path().to_path_buf());
    let err = WorkflowPlanner::new(&config).err().expect("version 2 is rejected");
    assert_contains(&format!("{:#}", err), "version");

    Ok(())
}
