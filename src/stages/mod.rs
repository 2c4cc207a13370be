//! Execution stages
//!
//! Arranges a selected worker set into category-ordered stages with
//! execution modes, synchronization points and quality gates.

mod builder;
mod transition;
mod types;

pub use builder::{default_quality_gate, estimate_hours, StageGraphBuilder, FALLBACK_STAGE_NAME};
pub use transition::{PhaseTracker, WorkflowPhase};
pub use types::{Stage, StageMode, WorkflowMode, WorkflowPlan};
