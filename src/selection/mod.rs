//! Worker selection
//!
//! Produces a worker set within the bounds of the task's complexity tier,
//! deterministically for a given input.

mod optimize;
mod selector;
mod tables;

pub use optimize::{MIN_SYNERGY_GAIN, SYNERGY_TARGET};
pub use selector::{
    successful_workers, Provenance, SelectionContext, SelectionOutcome, WorkerSelector,
    HISTORY_BONUS,
};
pub use tables::{DomainWorkers, MandatoryQuality, PriorityTier, ProvenPattern, SelectionTables};
