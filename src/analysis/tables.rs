//! Loadable classification tables

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::TABLE_VERSION;

const BUILTIN_ANALYSIS: &str = include_str!("../../data/analysis.toml");

fn default_version() -> u32 {
    TABLE_VERSION
}

fn default_simple_penalty() -> i32 {
    2
}

/// Phrase to weight tables for the five scoring dimensions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplexityDimensions {
    #[serde(default)]
    pub architectural: BTreeMap<String, i32>,
    #[serde(default)]
    pub technical: BTreeMap<String, i32>,
    #[serde(default)]
    pub scope: BTreeMap<String, i32>,
    #[serde(default)]
    pub integration: BTreeMap<String, i32>,
    #[serde(default)]
    pub risk: BTreeMap<String, i32>,
}

impl ComplexityDimensions {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &BTreeMap<String, i32>)> {
        [
            ("architectural", &self.architectural),
            ("technical", &self.technical),
            ("scope", &self.scope),
            ("integration", &self.integration),
            ("risk", &self.risk),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainKeywords {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordPattern {
    pub category: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleIndicators {
    #[serde(default)]
    pub indicators: Vec<String>,
}

/// Everything the analyzer needs to classify a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisTables {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_simple_penalty")]
    pub simple_penalty: i32,
    #[serde(default)]
    pub simple_phrases: Vec<String>,
    #[serde(default)]
    pub conjunctions: Vec<String>,
    #[serde(default)]
    pub dimensions: ComplexityDimensions,
    /// Domains in tie-break order
    #[serde(default)]
    pub domains: Vec<DomainKeywords>,
    #[serde(default)]
    pub keyword_patterns: Vec<KeywordPattern>,
    #[serde(default)]
    pub modules: ModuleIndicators,
}

impl Default for AnalysisTables {
    fn default() -> Self {
        Self {
            version: TABLE_VERSION,
            simple_penalty: default_simple_penalty(),
            simple_phrases: Vec::new(),
            conjunctions: Vec::new(),
            dimensions: ComplexityDimensions::default(),
            domains: Vec::new(),
            keyword_patterns: Vec::new(),
            modules: ModuleIndicators::default(),
        }
    }
}

impl AnalysisTables {
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_ANALYSIS).context("Failed to parse built-in analysis tables")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read analysis tables {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse analysis tables {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let tables: AnalysisTables = toml::from_str(content)?;
        if tables.version != TABLE_VERSION {
            bail!(
                "Unsupported analysis table version {} (expected {})",
                tables.version,
                TABLE_VERSION
            );
        }
        Ok(tables)
    }
}
