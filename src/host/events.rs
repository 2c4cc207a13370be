use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle events offered to an observability sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    StageStarted {
        timestamp: DateTime<Utc>,
        stage: String,
        workers: Vec<String>,
    },
    StageCompleted {
        timestamp: DateTime<Utc>,
        stage: String,
        duration_ms: u64,
    },
    StageFailed {
        timestamp: DateTime<Utc>,
        stage: String,
        error: String,
    },
    PlanCreated {
        timestamp: DateTime<Utc>,
        complexity: String,
        workers: Vec<String>,
        cache_hit: bool,
        selection_time_ms: u64,
    },
    /// Point-in-time resource reading
    ResourceGauge {
        timestamp: DateTime<Utc>,
        name: String,
        value: f64,
    },
}

impl LifecycleEvent {
    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        LifecycleEvent::ResourceGauge {
            timestamp: Utc::now(),
            name: name.into(),
            value,
        }
    }

    pub fn stage_started(stage: impl Into<String>, workers: Vec<String>) -> Self {
        LifecycleEvent::StageStarted {
            timestamp: Utc::now(),
            stage: stage.into(),
            workers,
        }
    }

    pub fn stage_completed(stage: impl Into<String>, duration_ms: u64) -> Self {
        LifecycleEvent::StageCompleted {
            timestamp: Utc::now(),
            stage: stage.into(),
            duration_ms,
        }
    }

    pub fn stage_failed(stage: impl Into<String>, error: impl Into<String>) -> Self {
        LifecycleEvent::StageFailed {
            timestamp: Utc::now(),
            stage: stage.into(),
            error: error.into(),
        }
    }
}

/// Receives lifecycle events. Transport is the implementation's concern;
/// emitting must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LifecycleEvent);
}

/// Forwards events as structured tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::StageStarted { stage, workers, .. } => {
                tracing::info!(stage = %stage, workers = ?workers, "Stage started");
            }
            LifecycleEvent::StageCompleted {
                stage, duration_ms, ..
            } => {
                tracing::info!(stage = %stage, duration_ms, "Stage completed");
            }
            LifecycleEvent::StageFailed { stage, error, .. } => {
                tracing::warn!(stage = %stage, error = %error, "Stage failed");
            }
            LifecycleEvent::PlanCreated {
                complexity,
                workers,
                cache_hit,
                selection_time_ms,
                ..
            } => {
                tracing::debug!(
                    complexity = %complexity,
                    workers = ?workers,
                    cache_hit,
                    selection_time_ms,
                    "Plan created"
                );
            }
            LifecycleEvent::ResourceGauge { name, value, .. } => {
                tracing::debug!(gauge = %name, value, "Resource gauge");
            }
        }
    }
}
