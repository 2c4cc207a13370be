//! Optimization pass over a gathered worker set: tier-ranked truncation,
//! mandatory quality coverage and a single greedy synergy addition.

use std::cmp::Ordering;

use crate::analysis::Complexity;

use super::selector::{Provenance, WorkerSelector};

/// Synergy total below which the set is considered poorly matched
pub const SYNERGY_TARGET: f64 = 2.0;

/// Minimum gain for a synergy addition
pub const MIN_SYNERGY_GAIN: f64 = 1.0;

impl WorkerSelector {
    /// Bound the set to the tier maximum and top it up.
    ///
    /// Precedence when something has to go: mandatory quality workers, then
    /// caller-required workers, then everything else, each ranked by priority
    /// tier. `len <= max` holds on return.
    pub(super) fn optimize(
        &self,
        complexity: Complexity,
        workers: &mut Vec<String>,
        required: Vec<String>,
        provenance: &mut Vec<Provenance>,
    ) {
        let max = complexity.max_workers();
        let mandatory = self.tables.mandatory_quality.for_tier(complexity);
        let missing: Vec<String> = mandatory
            .iter()
            .filter(|m| !workers.contains(m))
            .cloned()
            .collect();

        // Make room for the mandatory workers still to come
        let room = max.saturating_sub(missing.len());
        if workers.len() > room {
            self.sort_by_rank(workers, mandatory, &required);
            let removed = workers.split_off(room);
            self.record_truncation(complexity, removed, &required, provenance);
        }

        for worker in missing {
            workers.push(worker.clone());
            provenance.push(Provenance::MandatoryQuality { worker });
        }

        // Only reachable when the mandatory list alone exceeds the maximum
        if workers.len() > max {
            self.sort_by_rank(workers, mandatory, &required);
            let removed = workers.split_off(max);
            self.record_truncation(complexity, removed, &required, provenance);
        }

        if let Some((worker, gain)) = self.best_synergy_addition(workers, max) {
            workers.push(worker.clone());
            provenance.push(Provenance::Synergy { worker, gain });
        }
    }

    fn record_truncation(
        &self,
        complexity: Complexity,
        removed: Vec<String>,
        required: &[String],
        provenance: &mut Vec<Provenance>,
    ) {
        if removed.is_empty() {
            return;
        }
        let dropped_required: Vec<&String> =
            removed.iter().filter(|w| required.contains(w)).collect();
        if !dropped_required.is_empty() {
            tracing::warn!(
                dropped = ?dropped_required,
                "Required workers exceed the {} tier maximum of {}",
                complexity,
                complexity.max_workers()
            );
        }
        tracing::debug!(removed = ?removed, "Truncated worker set");
        provenance.push(Provenance::Truncated { removed });
    }

    /// The one catalog worker worth adding for synergy, if any
    pub(super) fn best_synergy_addition(
        &self,
        workers: &[String],
        max: usize,
    ) -> Option<(String, f64)> {
        let synergy = self.catalog.synergy();
        if synergy.total(workers) >= SYNERGY_TARGET || workers.len() >= max {
            return None;
        }

        let mut names: Vec<&str> = self
            .catalog
            .iter()
            .map(|w| w.name.as_str())
            .filter(|name| !workers.iter().any(|w| w == name))
            .collect();
        names.sort_unstable();

        let mut best: Option<(&str, f64)> = None;
        for name in names {
            let gain = synergy.gain(name, workers);
            if best.map_or(true, |(_, g)| gain > g) {
                best = Some((name, gain));
            }
        }

        best.filter(|(_, gain)| *gain > MIN_SYNERGY_GAIN)
            .map(|(name, gain)| (name.to_string(), gain))
    }

    /// Mandatory first, then required, then priority tier, then name
    fn sort_by_rank(&self, workers: &mut [String], mandatory: &[String], required: &[String]) {
        let class = |w: &String| {
            if mandatory.contains(w) {
                0
            } else if required.contains(w) {
                1
            } else {
                2
            }
        };
        workers.sort_by(|a, b| {
            class(a)
                .cmp(&class(b))
                .then_with(|| self.compare_rank(a, b))
        });
    }

    fn compare_rank(&self, a: &str, b: &str) -> Ordering {
        self.tier_of(a).cmp(&self.tier_of(b)).then_with(|| a.cmp(b))
    }

    fn tier_of(&self, worker: &str) -> usize {
        self.tier_rank
            .get(worker)
            .copied()
            .unwrap_or(self.tables.priority_tiers.len())
    }
}
