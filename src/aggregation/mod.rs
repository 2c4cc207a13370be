//! Stage output aggregation
//!
//! Merges the outputs of one stage's workers into findings, severity-ranked
//! issues and consensus/divergence entries, then derives the TODO list for
//! the next stage.

mod aggregator;
mod todo;
mod types;

pub use aggregator::ContextAggregator;
pub use todo::{generate_todos, resolver_for, DECISION_OWNER, DEFAULT_RESOLVER};
pub use types::{
    ConsensusEntry, DivergenceEntry, DivergentValue, Finding, Issue, RankedIssue, Severity,
    StageAggregate, StageSummary, TodoItem, TodoKind, TodoPriority, WorkerOutput,
};
