//! Worker selection
//!
//! Gathers candidates in a fixed order (required workers, proven patterns,
//! dispatch rules, capability-based supplementation, fallback lists), stopping
//! as soon as the tier minimum is met, then runs the optimization pass in
//! `optimize.rs`. Candidate order is insertion order, so identical input
//! always yields an identical worker set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::analysis::{TaskAnalysis, GENERAL_DOMAIN};
use crate::catalog::WorkerCatalog;
use crate::error::PlanningError;
use crate::rules::RuleSet;

use super::tables::SelectionTables;

/// Supplementation bonus for workers named in successful history entries
pub const HISTORY_BONUS: usize = 2;

/// Why a worker entered (or left) the selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    Required { worker: String },
    ProvenPattern { phrase: String, workers: Vec<String> },
    Rule { pattern: String, workers: Vec<String> },
    DomainCore { domain: String, workers: Vec<String> },
    CapabilityMatch { worker: String, score: usize },
    Essential { workers: Vec<String> },
    Fallback { domain: String, workers: Vec<String> },
    Generic { workers: Vec<String> },
    Truncated { removed: Vec<String> },
    MandatoryQuality { worker: String },
    Synergy { worker: String, gain: f64 },
}

impl Provenance {
    /// One line of the plan rationale
    pub fn describe(&self) -> String {
        match self {
            Provenance::Required { worker } => format!("{} was explicitly required", worker),
            Provenance::ProvenPattern { phrase, workers } => format!(
                "Proven pattern \"{}\" selected {}",
                phrase,
                workers.join(", ")
            ),
            Provenance::Rule { pattern, workers } => {
                format!("Rule `{}` matched: {}", pattern, workers.join(", "))
            }
            Provenance::DomainCore { domain, workers } => format!(
                "Core workers for the {} domain: {}",
                domain,
                workers.join(", ")
            ),
            Provenance::CapabilityMatch { worker, score } => {
                format!("{} matched {} capability tag(s)", worker, score)
            }
            Provenance::Essential { workers } => {
                format!("Essential workers added: {}", workers.join(", "))
            }
            Provenance::Fallback { domain, workers } => format!(
                "Fallback defaults for the {} domain: {}",
                domain,
                workers.join(", ")
            ),
            Provenance::Generic { workers } => {
                format!("Generic workers added: {}", workers.join(", "))
            }
            Provenance::Truncated { removed } => {
                format!("Dropped to respect the tier maximum: {}", removed.join(", "))
            }
            Provenance::MandatoryQuality { worker } => {
                format!("{} is mandatory for this complexity tier", worker)
            }
            Provenance::Synergy { worker, gain } => {
                format!("{} added for team synergy (+{:.1})", worker, gain)
            }
        }
    }
}

/// Result of one selection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    pub workers: Vec<String>,
    pub provenance: Vec<Provenance>,
    /// Total pairwise synergy of the final set
    pub synergy_score: f64,
}

impl SelectionOutcome {
    pub fn rationale(&self) -> String {
        self.provenance
            .iter()
            .map(|p| format!("- {}", p.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Insertion-ordered set of worker names
#[derive(Debug, Clone, Default)]
pub(super) struct CandidateSet {
    workers: Vec<String>,
}

impl CandidateSet {
    pub(super) fn add(&mut self, worker: &str) -> bool {
        if worker.is_empty() || self.contains(worker) {
            return false;
        }
        self.workers.push(worker.to_string());
        true
    }

    /// Add several workers, returning the ones that were new
    pub(super) fn extend<'a, I>(&mut self, workers: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        workers
            .into_iter()
            .filter(|w| self.add(w))
            .cloned()
            .collect()
    }

    pub(super) fn contains(&self, worker: &str) -> bool {
        self.workers.iter().any(|w| w == worker)
    }

    pub(super) fn len(&self) -> usize {
        self.workers.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub(super) fn into_vec(self) -> Vec<String> {
        self.workers
    }
}

/// Everything a selection run looks at besides the analysis
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionContext<'a> {
    pub task_text: &'a str,
    pub required_workers: &'a [String],
    pub execution_history: &'a [String],
}

/// Turns an analysis into a bounded, optimized worker set
pub struct WorkerSelector {
    pub(super) catalog: Arc<WorkerCatalog>,
    pub(super) tables: SelectionTables,
    rules: RuleSet,
    /// Worker name -> priority tier index (0 = highest)
    pub(super) tier_rank: HashMap<String, usize>,
    rejected: Vec<PlanningError>,
}

impl WorkerSelector {
    pub fn new(catalog: Arc<WorkerCatalog>, tables: SelectionTables) -> Self {
        let (rules, rejected) = RuleSet::compile(&tables.rules);

        let mut tier_rank = HashMap::new();
        for (rank, tier) in tables.priority_tiers.iter().enumerate() {
            for worker in &tier.workers {
                tier_rank.entry(worker.clone()).or_insert(rank);
            }
        }

        Self {
            catalog,
            tables,
            rules,
            tier_rank,
            rejected,
        }
    }

    /// Rules skipped by the pattern safety check at construction
    pub fn rejected_patterns(&self) -> &[PlanningError] {
        &self.rejected
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn catalog(&self) -> &WorkerCatalog {
        &self.catalog
    }

    /// Select workers for an analyzed task
    pub fn select(&self, analysis: &TaskAnalysis, ctx: SelectionContext<'_>) -> SelectionOutcome {
        let min = analysis.complexity.min_workers();
        let lower = ctx.task_text.to_lowercase();
        let mut candidates = CandidateSet::default();
        let mut provenance = Vec::new();

        let required: Vec<String> = ctx
            .required_workers
            .iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        for worker in &required {
            if candidates.add(worker) {
                provenance.push(Provenance::Required {
                    worker: worker.clone(),
                });
            }
        }

        self.gather(analysis, &lower, ctx.execution_history, &mut candidates, &mut provenance);

        if candidates.len() < min {
            tracing::warn!(
                "Selection below tier minimum ({} < {}) after fallback",
                candidates.len(),
                min
            );
        }

        let mut workers = candidates.into_vec();
        self.optimize(analysis.complexity, &mut workers, required, &mut provenance);

        let synergy_score = self.catalog.synergy().total(&workers);
        tracing::debug!(workers = ?workers, synergy_score, "Workers selected");

        SelectionOutcome {
            workers,
            provenance,
            synergy_score,
        }
    }

    fn gather(
        &self,
        analysis: &TaskAnalysis,
        lower: &str,
        history: &[String],
        candidates: &mut CandidateSet,
        provenance: &mut Vec<Provenance>,
    ) {
        let min = analysis.complexity.min_workers();
        if candidates.len() >= min {
            return;
        }

        // 1. Proven patterns
        for pattern in &self.tables.proven_patterns {
            if lower.contains(pattern.phrase.to_lowercase().as_str()) {
                let added = candidates.extend(&pattern.workers);
                provenance.push(Provenance::ProvenPattern {
                    phrase: pattern.phrase.clone(),
                    workers: added,
                });
            }
        }
        if candidates.len() >= min {
            return;
        }

        // 2. Dispatch rules
        for rule in self.rules.matching(lower) {
            let added = candidates.extend(&rule.workers);
            provenance.push(Provenance::Rule {
                pattern: rule.pattern.clone(),
                workers: added,
            });
        }
        if candidates.len() >= min {
            return;
        }

        // 3. Smart supplementation
        self.supplement(analysis, lower, history, candidates, provenance);
        if candidates.len() >= min {
            return;
        }

        // 4. Fallback
        self.fallback(analysis, candidates, provenance);
    }

    fn supplement(
        &self,
        analysis: &TaskAnalysis,
        lower: &str,
        history: &[String],
        candidates: &mut CandidateSet,
        provenance: &mut Vec<Provenance>,
    ) {
        let min = analysis.complexity.min_workers();

        if let Some(domain) = self.tables.domain(&analysis.domain) {
            let added = candidates.extend(&domain.core);
            if !added.is_empty() {
                provenance.push(Provenance::DomainCore {
                    domain: domain.name.clone(),
                    workers: added,
                });
            }
        }
        if candidates.len() >= min {
            return;
        }

        let proven = successful_workers(history, &self.catalog);
        let mut scored: Vec<(usize, &str)> = self
            .catalog
            .iter()
            .filter(|w| !candidates.contains(&w.name))
            .map(|w| {
                let bonus = if proven.contains(&w.name) { HISTORY_BONUS } else { 0 };
                (w.tag_score(lower) + bonus, w.name.as_str())
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        for (score, name) in scored {
            if candidates.len() >= min {
                break;
            }
            if candidates.add(name) {
                provenance.push(Provenance::CapabilityMatch {
                    worker: name.to_string(),
                    score,
                });
            }
        }

        if candidates.len() < min {
            let added = candidates.extend(&self.tables.essential_workers);
            if !added.is_empty() {
                provenance.push(Provenance::Essential { workers: added });
            }
        }
    }

    fn fallback(
        &self,
        analysis: &TaskAnalysis,
        candidates: &mut CandidateSet,
        provenance: &mut Vec<Provenance>,
    ) {
        let min = analysis.complexity.min_workers();

        if candidates.is_empty() {
            let domain = self
                .tables
                .domain(&analysis.domain)
                .or_else(|| self.tables.domain(GENERAL_DOMAIN));
            if let Some(domain) = domain {
                let added = candidates.extend(&domain.defaults);
                provenance.push(Provenance::Fallback {
                    domain: domain.name.clone(),
                    workers: added,
                });
            }
        }

        let mut generic = Vec::new();
        for worker in &self.tables.generic_workers {
            if candidates.len() >= min {
                break;
            }
            if candidates.add(worker) {
                generic.push(worker.clone());
            }
        }
        if !generic.is_empty() {
            provenance.push(Provenance::Generic { workers: generic });
        }
    }
}

/// Catalog workers named in history entries that mention "success".
///
/// Plain substring matching: "unsuccessful" counts as a success.
pub fn successful_workers(history: &[String], catalog: &WorkerCatalog) -> BTreeSet<String> {
    let mut workers = BTreeSet::new();
    for entry in history {
        let entry = entry.to_lowercase();
        if !entry.contains("success") {
            continue;
        }
        for worker in catalog.iter() {
            if entry.contains(worker.name.as_str()) {
                workers.insert(worker.name.clone());
            }
        }
    }
    workers
}
