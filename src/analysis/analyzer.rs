//! Complexity and domain classification of task descriptions
//!
//! Scores a task across five weighted keyword dimensions, adjusts for
//! "simple task" phrasing and overall size, then maps the score to a tier.
//! Never fails: empty or degenerate input classifies as Simple / "general".

use regex::Regex;
use std::collections::BTreeSet;

use crate::error::PlanningError;
use crate::rules::compile_pattern;

use super::tables::AnalysisTables;
use super::types::{Complexity, TaskAnalysis};

/// Domain used when no domain keyword matches
pub const GENERAL_DOMAIN: &str = "general";

const LONG_TEXT_CHARS: usize = 150;
const LONG_TEXT_BONUS: i32 = 2;
const MANY_WORDS: usize = 25;
const MANY_WORDS_BONUS: i32 = 2;
const MANY_COMMAS: usize = 3;
const MANY_COMMAS_BONUS: i32 = 1;
const CONJUNCTION_BONUS: i32 = 1;

const COMPLEX_THRESHOLD: i32 = 8;
const STANDARD_THRESHOLD: i32 = 3;
/// Wordy tasks reach Standard with any positive score
const STANDARD_WORDY_THRESHOLD: i32 = 1;
const WORDY_TASK_WORDS: usize = 15;

/// Map a raw score to a tier
pub fn complexity_from_score(score: i32, word_count: usize) -> Complexity {
    if score >= COMPLEX_THRESHOLD {
        Complexity::Complex
    } else if score >= STANDARD_THRESHOLD
        || (score >= STANDARD_WORDY_THRESHOLD && word_count > WORDY_TASK_WORDS)
    {
        Complexity::Standard
    } else {
        Complexity::Simple
    }
}

/// Classifies task text into a [`TaskAnalysis`]
pub struct TaskAnalyzer {
    tables: AnalysisTables,
    /// (category, compiled pattern) for keyword extraction
    keyword_patterns: Vec<(String, Regex)>,
    rejected: Vec<PlanningError>,
}

impl TaskAnalyzer {
    pub fn new(tables: AnalysisTables) -> Self {
        let mut keyword_patterns = Vec::with_capacity(tables.keyword_patterns.len());
        let mut rejected = Vec::new();

        for kp in &tables.keyword_patterns {
            match compile_pattern(&kp.pattern) {
                Ok(regex) => keyword_patterns.push((kp.category.clone(), regex)),
                Err(e) => {
                    tracing::warn!("Skipping {} keyword pattern: {}", kp.category, e);
                    rejected.push(e);
                }
            }
        }

        Self {
            tables,
            keyword_patterns,
            rejected,
        }
    }

    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self::new(AnalysisTables::builtin()?))
    }

    /// Keyword patterns skipped at construction
    pub fn rejected_patterns(&self) -> &[PlanningError] {
        &self.rejected
    }

    pub fn tables(&self) -> &AnalysisTables {
        &self.tables
    }

    /// Classify a task description
    pub fn analyze(&self, text: &str) -> TaskAnalysis {
        let lower = text.to_lowercase();
        let word_count = count_words(&lower);

        let score = self.complexity_score(&lower);
        let complexity = complexity_from_score(score, word_count);
        let keywords = self.extract_keywords(&lower);
        let domain = self.identify_domain(&keywords);
        let module_count = self.count_modules(&lower);

        tracing::debug!(
            score,
            %complexity,
            %domain,
            keywords = keywords.len(),
            "Task analyzed"
        );

        TaskAnalysis {
            keywords,
            complexity,
            domain,
            estimated_size: complexity.size_per_module() * module_count,
            module_count,
            score,
        }
    }

    /// Signed complexity score for lowercased text
    pub fn complexity_score(&self, lower: &str) -> i32 {
        let mut score: i32 = 0;

        // Weighted keyword dimensions
        for (_, table) in self.tables.dimensions.iter() {
            score += table
                .iter()
                .filter(|(phrase, _)| lower.contains(phrase.as_str()))
                .map(|(_, weight)| *weight)
                .sum::<i32>();
        }

        // Simple-task phrasing pulls the score down
        let simple_hits = self
            .tables
            .simple_phrases
            .iter()
            .filter(|p| lower.contains(p.as_str()))
            .count() as i32;
        score -= simple_hits * self.tables.simple_penalty;

        // Size and structure bonuses
        if lower.chars().count() > LONG_TEXT_CHARS {
            score += LONG_TEXT_BONUS;
        }
        if count_words(lower) > MANY_WORDS {
            score += MANY_WORDS_BONUS;
        }
        if lower.matches(',').count() > MANY_COMMAS {
            score += MANY_COMMAS_BONUS;
        }
        if self.has_conjunction(lower) {
            score += CONJUNCTION_BONUS;
        }

        score
    }

    /// Deduplicated keywords over every keyword pattern
    pub fn extract_keywords(&self, lower: &str) -> BTreeSet<String> {
        let mut keywords = BTreeSet::new();
        for (_, regex) in &self.keyword_patterns {
            for m in regex.find_iter(lower) {
                keywords.insert(m.as_str().to_string());
            }
        }
        keywords
    }

    /// Domain with the most keyword hits; ties go to the first declared
    pub fn identify_domain(&self, keywords: &BTreeSet<String>) -> String {
        let mut best: Option<(&str, usize)> = None;

        for domain in &self.tables.domains {
            let score = domain
                .keywords
                .iter()
                .filter(|k| keywords.contains(k.as_str()))
                .count();
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((domain.name.as_str(), score));
            }
        }

        best.map(|(name, _)| name.to_string())
            .unwrap_or_else(|| GENERAL_DOMAIN.to_string())
    }

    fn count_modules(&self, lower: &str) -> u32 {
        let count = self
            .tables
            .modules
            .indicators
            .iter()
            .filter(|i| lower.contains(i.as_str()))
            .count() as u32;
        count.max(1)
    }

    fn has_conjunction(&self, lower: &str) -> bool {
        lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .any(|w| self.tables.conjunctions.iter().any(|c| c == w))
    }
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
