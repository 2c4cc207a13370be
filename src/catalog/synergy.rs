//! Pairwise worker synergy weights

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of the synergy table as stored in catalog files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyEntry {
    pub pair: [String; 2],
    pub weight: f64,
}

/// Symmetric lookup table of worker-pair weights
#[derive(Debug, Clone, Default)]
pub struct SynergyTable {
    weights: HashMap<(String, String), f64>,
}

impl SynergyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[SynergyEntry]) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.insert(&entry.pair[0], &entry.pair[1], entry.weight);
        }
        table
    }

    pub fn insert(&mut self, a: &str, b: &str, weight: f64) {
        self.weights.insert(Self::key(a, b), weight);
    }

    /// Weight for a pair, if the pair is known
    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        self.weights.get(&Self::key(a, b)).copied()
    }

    /// Sum of weights over every selected pair present in the table
    pub fn total(&self, workers: &[String]) -> f64 {
        let mut total = 0.0;
        for (i, a) in workers.iter().enumerate() {
            for b in &workers[i + 1..] {
                total += self.weight(a, b).unwrap_or(0.0);
            }
        }
        total
    }

    /// Synergy a candidate would add against the current set
    pub fn gain(&self, candidate: &str, current: &[String]) -> f64 {
        current
            .iter()
            .filter(|w| w.as_str() != candidate)
            .filter_map(|w| self.weight(candidate, w))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }
}
