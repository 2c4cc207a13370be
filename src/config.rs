use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_EVICT_BATCH};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

/// Planning service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Cached plans kept before bulk eviction (default: 100)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Oldest entries dropped per eviction (default: 20)
    #[serde(default = "default_cache_evict_batch")]
    pub cache_evict_batch: usize,

    /// Characters of task text that take part in the cache fingerprint (default: 200)
    #[serde(default = "default_fingerprint_prefix_chars")]
    pub fingerprint_prefix_chars: usize,

    /// Pre-compute plans for common tasks in the background (default: true)
    #[serde(default = "default_true")]
    pub warmup_enabled: bool,

    #[serde(default = "default_warmup_tasks")]
    pub warmup_tasks: Vec<String>,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_cache_evict_batch() -> usize {
    DEFAULT_EVICT_BATCH
}

fn default_fingerprint_prefix_chars() -> usize {
    200
}

fn default_true() -> bool {
    true
}

fn default_warmup_tasks() -> Vec<String> {
    vec![
        "implement user authentication".to_string(),
        "fix bug in api endpoint".to_string(),
        "add unit tests".to_string(),
        "update documentation".to_string(),
        "optimize database queries".to_string(),
        "build rest api".to_string(),
        "create landing page".to_string(),
    ]
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            cache_evict_batch: default_cache_evict_batch(),
            fingerprint_prefix_chars: default_fingerprint_prefix_chars(),
            warmup_enabled: true,
            warmup_tasks: default_warmup_tasks(),
        }
    }
}

/// Override paths for the planning tables. Unset uses the built-in tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Fail aggregation on issues without a severity instead of assuming medium
    #[serde(default)]
    pub strict_severity: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;
        Ok(config_dir.join("workforce-planner").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.planner.cache_capacity == 0 {
            bail!("planner.cache_capacity must be at least 1");
        }
        if self.planner.cache_evict_batch == 0 {
            bail!("planner.cache_evict_batch must be at least 1");
        }
        if self.planner.cache_evict_batch > self.planner.cache_capacity {
            bail!(
                "planner.cache_evict_batch ({}) exceeds planner.cache_capacity ({})",
                self.planner.cache_evict_batch,
                self.planner.cache_capacity
            );
        }
        if self.planner.fingerprint_prefix_chars == 0 {
            bail!("planner.fingerprint_prefix_chars must be at least 1");
        }
        Ok(())
    }
}
