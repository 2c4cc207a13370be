//! The planning service object
//!
//! Owns the catalog, rule tables, cache and warm-up task. Callers construct
//! it explicitly and control its lifetime; nothing here is process-global.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::aggregation::{ContextAggregator, StageAggregate, WorkerOutput};
use crate::analysis::{AnalysisTables, TaskAnalyzer};
use crate::cache::{CacheStats, Fingerprint, PlanCache};
use crate::catalog::{WorkerCatalog, WorkerCategory};
use crate::config::Config;
use crate::error::PlanningError;
use crate::host::{EventSink, LifecycleEvent, TracingEventSink};
use crate::selection::{SelectionContext, SelectionTables, WorkerSelector};
use crate::stages::StageGraphBuilder;

use super::types::{CachedPlan, PlanRequest, PlanResponse};
use super::warmup::WarmupHandle;

pub struct WorkflowPlanner {
    catalog: Arc<WorkerCatalog>,
    analyzer: TaskAnalyzer,
    selector: WorkerSelector,
    builder: StageGraphBuilder,
    aggregator: ContextAggregator,
    cache: PlanCache<Arc<CachedPlan>>,
    prefix_chars: usize,
    warmup_enabled: bool,
    warmup_tasks: Vec<String>,
    events: Arc<dyn EventSink>,
    warmup: Mutex<Option<WarmupHandle>>,
}

impl WorkflowPlanner {
    /// Build a planner from configuration, loading any table overrides
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let catalog = match &config.tables.catalog_path {
            Some(path) => WorkerCatalog::from_path(path)?,
            None => WorkerCatalog::builtin()?,
        };
        let analysis = match &config.tables.analysis_path {
            Some(path) => AnalysisTables::from_path(path)?,
            None => AnalysisTables::builtin()?,
        };
        let selection = match &config.tables.selection_path {
            Some(path) => SelectionTables::from_path(path)?,
            None => SelectionTables::builtin()?,
        };

        Ok(Self::from_parts(catalog, analysis, selection, config))
    }

    /// Planner over the built-in tables and default settings
    pub fn builtin() -> Result<Self> {
        Self::new(&Config::default()).context("Failed to build planner from built-in tables")
    }

    pub fn from_parts(
        catalog: WorkerCatalog,
        analysis: AnalysisTables,
        selection: SelectionTables,
        config: &Config,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let analyzer = TaskAnalyzer::new(analysis);
        let selector = WorkerSelector::new(Arc::clone(&catalog), selection);
        let builder = StageGraphBuilder::new(Arc::clone(&catalog));

        let rejected = analyzer.rejected_patterns().len() + selector.rejected_patterns().len();
        if rejected > 0 {
            tracing::warn!("{} table pattern(s) rejected and skipped", rejected);
        }

        Self {
            catalog,
            analyzer,
            selector,
            builder,
            aggregator: ContextAggregator::new(config.aggregation.strict_severity),
            cache: PlanCache::new(config.planner.cache_capacity, config.planner.cache_evict_batch),
            prefix_chars: config.planner.fingerprint_prefix_chars,
            warmup_enabled: config.planner.warmup_enabled,
            warmup_tasks: config.planner.warmup_tasks.clone(),
            events: Arc::new(TracingEventSink),
            warmup: Mutex::new(None),
        }
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    pub fn catalog(&self) -> &WorkerCatalog {
        &self.catalog
    }

    /// Plan a task. Identical requests are served from the cache.
    pub async fn plan(&self, request: PlanRequest) -> PlanResponse {
        let started = Instant::now();
        let key = self.fingerprint(&request);

        let (cached, cache_hit) = self
            .cache
            .get_or_compute(&key, || Arc::new(self.compute(&request)))
            .await;

        let selection_time_ms = started.elapsed().as_millis() as u64;
        self.events.emit(&LifecycleEvent::PlanCreated {
            timestamp: chrono::Utc::now(),
            complexity: cached.plan.analysis.complexity.to_string(),
            workers: cached.plan.worker_set.clone(),
            cache_hit,
            selection_time_ms,
        });
        self.events.emit(&LifecycleEvent::gauge(
            "plan_cache_entries",
            self.cache.len().await as f64,
        ));

        PlanResponse {
            plan: cached.plan.clone(),
            rationale: cached.rationale.clone(),
            selection_time_ms,
            cache_hit,
        }
    }

    /// Plan several independent tasks concurrently, results in input order
    pub async fn plan_many(&self, requests: Vec<PlanRequest>) -> Vec<PlanResponse> {
        join_all(requests.into_iter().map(|r| self.plan(r))).await
    }

    /// Summarize one stage's outputs and derive the next stage's TODOs
    pub fn aggregate(
        &self,
        stage: WorkerCategory,
        outputs: &[WorkerOutput],
    ) -> Result<StageAggregate, PlanningError> {
        self.aggregator.aggregate(stage, outputs)
    }

    /// Patterns skipped at load time because they failed the safety check
    pub fn load_diagnostics(&self) -> Vec<PlanningError> {
        self.analyzer
            .rejected_patterns()
            .iter()
            .chain(self.selector.rejected_patterns())
            .cloned()
            .collect()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Start warming the cache in the background. Returns false when warm-up
    /// is disabled or already running.
    pub async fn start_warmup(self: &Arc<Self>) -> bool {
        if !self.warmup_enabled || self.warmup_tasks.is_empty() {
            return false;
        }

        let mut slot = self.warmup.lock().await;
        if slot.as_ref().map_or(false, |w| !w.is_finished()) {
            return false;
        }
        *slot = Some(WarmupHandle::spawn(
            Arc::downgrade(self),
            self.warmup_tasks.clone(),
        ));
        true
    }

    /// Cancel background work and wait for it to stop
    pub async fn shutdown(&self) {
        let handle = self.warmup.lock().await.take();
        if let Some(handle) = handle {
            handle.cancel().await;
        }
    }

    fn fingerprint(&self, request: &PlanRequest) -> Fingerprint {
        Fingerprint::compute(
            &request.task_text,
            self.prefix_chars,
            request.complexity_override,
            &request.required_workers,
            &request.execution_history,
        )
    }

    fn compute(&self, request: &PlanRequest) -> CachedPlan {
        let mut analysis = self.analyzer.analyze(&request.task_text);
        if let Some(complexity) = request.complexity_override {
            if complexity != analysis.complexity {
                tracing::debug!(from = %analysis.complexity, to = %complexity, "Complexity overridden");
            }
            analysis = analysis.with_complexity(complexity);
        }

        let outcome = self.selector.select(
            &analysis,
            SelectionContext {
                task_text: &request.task_text,
                required_workers: &request.required_workers,
                execution_history: &request.execution_history,
            },
        );
        let plan = self.builder.build_plan(&analysis, &outcome.workers);

        let mut rationale = format!(
            "Classified as {} (score {}) in the {} domain.",
            analysis.complexity, analysis.score, analysis.domain
        );
        if request.complexity_override.is_some() {
            rationale.push_str(" Complexity set by caller.");
        }
        let lines = outcome.rationale();
        if !lines.is_empty() {
            rationale.push('\n');
            rationale.push_str(&lines);
        }

        CachedPlan { plan, rationale }
    }
}

impl Drop for WorkflowPlanner {
    fn drop(&mut self) {
        if let Some(handle) = self.warmup.get_mut().take() {
            handle.abort();
        }
    }
}
