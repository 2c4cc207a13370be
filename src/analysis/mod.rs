//! Task analysis
//!
//! Turns free-text task descriptions into a complexity tier, a domain, a
//! keyword set and rough size estimates.

mod analyzer;
mod tables;
mod types;

pub use analyzer::{complexity_from_score, TaskAnalyzer, GENERAL_DOMAIN};
pub use tables::{AnalysisTables, ComplexityDimensions, DomainKeywords, KeywordPattern, ModuleIndicators};
pub use types::{Complexity, TaskAnalysis};
