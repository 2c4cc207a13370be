//! Background cache warm-up
//!
//! Runs common tasks through the planner so their plans are cached before
//! anyone asks. The task holds only a weak reference to the planner and is
//! cancelled by [`WorkflowPlanner::shutdown`] or when the planner drops.

use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::service::WorkflowPlanner;
use super::types::PlanRequest;

pub(super) struct WarmupHandle {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl WarmupHandle {
    pub(super) fn spawn(planner: Weak<WorkflowPlanner>, tasks: Vec<String>) -> Self {
        let (cancel, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run(planner, tasks, cancel_rx));
        Self { cancel, handle }
    }

    pub(super) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal cancellation and wait for the task to stop
    pub(super) async fn cancel(self) {
        let _ = self.cancel.send(true);
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::warn!("Warm-up task ended abnormally: {}", e);
            }
        }
    }

    pub(super) fn abort(self) {
        self.handle.abort();
    }
}

async fn run(planner: Weak<WorkflowPlanner>, tasks: Vec<String>, mut cancel: watch::Receiver<bool>) {
    tracing::info!("Plan cache warm-up started ({} tasks)", tasks.len());
    let mut warmed = 0;

    for task in tasks {
        if *cancel.borrow() {
            tracing::info!("Plan cache warm-up cancelled after {} tasks", warmed);
            return;
        }
        let Some(planner) = planner.upgrade() else {
            tracing::info!("Planner dropped, stopping warm-up");
            return;
        };

        let mut job = tokio::spawn(warm_one(planner, task.clone()));
        tokio::select! {
            result = &mut job => match result {
                Ok(()) => warmed += 1,
                Err(e) => tracing::warn!("Warm-up failed for {:?}: {}", task, e),
            },
            _ = cancel.changed() => {
                job.abort();
                tracing::info!("Plan cache warm-up cancelled after {} tasks", warmed);
                return;
            }
        }
    }

    tracing::info!("Plan cache warm-up finished ({} tasks)", warmed);
}

async fn warm_one(planner: Arc<WorkflowPlanner>, task: String) {
    planner.plan(PlanRequest::new(task)).await;
}
