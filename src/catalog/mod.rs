//! Worker catalog
//!
//! Static registry of worker capability profiles and their pairwise synergy
//! weights. The default catalog ships as versioned TOML under `data/` and can
//! be replaced by a file on disk without touching selection logic.

mod synergy;
mod types;

pub use synergy::{SynergyEntry, SynergyTable};
pub use types::{WorkerCategory, WorkerDescriptor};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Table format version understood by this build
pub const TABLE_VERSION: u32 = 1;

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.toml");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: u32,
    #[serde(default)]
    workers: Vec<WorkerDescriptor>,
    #[serde(default)]
    synergy: Vec<SynergyEntry>,
}

/// Read-only registry of worker descriptors
#[derive(Debug, Clone, Default)]
pub struct WorkerCatalog {
    /// Descriptors in declaration order
    workers: Vec<WorkerDescriptor>,
    index: HashMap<String, usize>,
    synergy: SynergyTable,
}

impl WorkerCatalog {
    /// Catalog compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG).context("Failed to parse built-in worker catalog")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read worker catalog {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse worker catalog {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        if file.version != TABLE_VERSION {
            bail!(
                "Unsupported catalog version {} (expected {})",
                file.version,
                TABLE_VERSION
            );
        }
        Ok(Self::new(file.workers, SynergyTable::from_entries(&file.synergy)))
    }

    /// Build a catalog from descriptors. Later duplicates of a name are ignored.
    pub fn new(workers: Vec<WorkerDescriptor>, synergy: SynergyTable) -> Self {
        let mut catalog = Self {
            workers: Vec::with_capacity(workers.len()),
            index: HashMap::new(),
            synergy,
        };
        for worker in workers {
            if catalog.index.contains_key(&worker.name) {
                tracing::warn!("Duplicate worker in catalog ignored: {}", worker.name);
                continue;
            }
            catalog
                .index
                .insert(worker.name.clone(), catalog.workers.len());
            catalog.workers.push(worker);
        }
        catalog
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&WorkerDescriptor> {
        self.index.get(name).map(|&i| &self.workers[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn category_of(&self, name: &str) -> Option<WorkerCategory> {
        self.get(name).map(|w| w.category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkerDescriptor> {
        self.workers.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.workers.iter().map(|w| w.name.clone()).collect()
    }

    pub fn in_category(&self, category: WorkerCategory) -> Vec<&WorkerDescriptor> {
        self.workers
            .iter()
            .filter(|w| w.category == category)
            .collect()
    }

    pub fn synergy(&self) -> &SynergyTable {
        &self.synergy
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
