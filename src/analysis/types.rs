//! Task classification types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Complexity tier of a task. Bounds worker-set size and default duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Standard,
    Complex,
}

impl Complexity {
    /// Inclusive (min, max) worker-set size for this tier
    pub fn worker_bounds(&self) -> (usize, usize) {
        match self {
            Complexity::Simple => (2, 3),
            Complexity::Standard => (3, 5),
            Complexity::Complex => (4, 8),
        }
    }

    pub fn min_workers(&self) -> usize {
        self.worker_bounds().0
    }

    pub fn max_workers(&self) -> usize {
        self.worker_bounds().1
    }

    /// Base duration estimate in hours
    pub fn base_hours(&self) -> f64 {
        match self {
            Complexity::Simple => 0.5,
            Complexity::Standard => 2.0,
            Complexity::Complex => 5.0,
        }
    }

    /// Rough size of the change, per touched module
    pub fn size_per_module(&self) -> u32 {
        match self {
            Complexity::Simple => 50,
            Complexity::Standard => 200,
            Complexity::Complex => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Standard => "standard",
            Complexity::Complex => "complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Complexity::Simple),
            "standard" | "medium" => Ok(Complexity::Standard),
            "complex" => Ok(Complexity::Complex),
            other => Err(format!("Unknown complexity: {}", other)),
        }
    }
}

/// Classification of one task description. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    /// Deduplicated keywords extracted from the text
    pub keywords: BTreeSet<String>,
    pub complexity: Complexity,
    pub domain: String,
    /// Rough size of the change (lines)
    pub estimated_size: u32,
    pub module_count: u32,
    /// Raw complexity score the tier was derived from
    pub score: i32,
}

impl TaskAnalysis {
    /// Copy of this analysis with a different tier
    pub fn with_complexity(&self, complexity: Complexity) -> Self {
        Self {
            complexity,
            estimated_size: complexity.size_per_module() * self.module_count,
            ..self.clone()
        }
    }
}
