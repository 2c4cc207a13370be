//! Loadable selection tables

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::Complexity;
use crate::catalog::TABLE_VERSION;
use crate::rules::RuleSpec;

const BUILTIN_SELECTION: &str = include_str!("../../data/selection.toml");

fn default_version() -> u32 {
    TABLE_VERSION
}

/// A literal phrase mapped to a curated worker list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenPattern {
    pub phrase: String,
    pub workers: Vec<String>,
}

/// Per-domain worker lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainWorkers {
    pub name: String,
    /// Pair added first during supplementation
    #[serde(default)]
    pub core: Vec<String>,
    /// Used when nothing else selected any worker
    #[serde(default)]
    pub defaults: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityTier {
    pub name: String,
    pub workers: Vec<String>,
}

/// Quality workers that must be present per tier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MandatoryQuality {
    #[serde(default)]
    pub simple: Vec<String>,
    #[serde(default)]
    pub standard: Vec<String>,
    #[serde(default)]
    pub complex: Vec<String>,
}

impl MandatoryQuality {
    pub fn for_tier(&self, complexity: Complexity) -> &[String] {
        match complexity {
            Complexity::Simple => &self.simple,
            Complexity::Standard => &self.standard,
            Complexity::Complex => &self.complex,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionTables {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub essential_workers: Vec<String>,
    #[serde(default)]
    pub generic_workers: Vec<String>,
    #[serde(default)]
    pub mandatory_quality: MandatoryQuality,
    #[serde(default)]
    pub proven_patterns: Vec<ProvenPattern>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    #[serde(default)]
    pub domains: Vec<DomainWorkers>,
    /// Highest tier first
    #[serde(default)]
    pub priority_tiers: Vec<PriorityTier>,
}

impl Default for SelectionTables {
    fn default() -> Self {
        Self {
            version: TABLE_VERSION,
            essential_workers: Vec::new(),
            generic_workers: Vec::new(),
            mandatory_quality: MandatoryQuality::default(),
            proven_patterns: Vec::new(),
            rules: Vec::new(),
            domains: Vec::new(),
            priority_tiers: Vec::new(),
        }
    }
}

impl SelectionTables {
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_SELECTION).context("Failed to parse built-in selection tables")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read selection tables {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse selection tables {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let tables: SelectionTables = toml::from_str(content)?;
        if tables.version != TABLE_VERSION {
            bail!(
                "Unsupported selection table version {} (expected {})",
                tables.version,
                TABLE_VERSION
            );
        }
        Ok(tables)
    }

    pub fn domain(&self, name: &str) -> Option<&DomainWorkers> {
        self.domains.iter().find(|d| d.name == name)
    }
}
