// Library exports for workforce-planner
// This allows the modules to be imported in tests and external code

pub mod aggregation;
pub mod analysis;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod host;
pub mod planner;
pub mod rules;
pub mod selection;
pub mod stages;

pub use error::PlanningError;
pub use planner::{PlanRequest, PlanResponse, WorkflowPlanner};
