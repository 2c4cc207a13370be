//! Planning service
//!
//! [`WorkflowPlanner`] runs a task through analysis, selection and stage
//! building, memoizing results in a [`PlanCache`](crate::cache::PlanCache).

mod service;
mod types;
mod warmup;

pub use service::WorkflowPlanner;
pub use types::{PlanRequest, PlanResponse};
