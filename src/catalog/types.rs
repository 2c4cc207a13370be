//! Worker metadata types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Functional category of a worker. Determines which stage it runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerCategory {
    Design,
    Implementation,
    Quality,
    Deployment,
    Documentation,
}

impl WorkerCategory {
    /// All categories in stage order
    pub const ORDERED: [WorkerCategory; 5] = [
        WorkerCategory::Design,
        WorkerCategory::Implementation,
        WorkerCategory::Quality,
        WorkerCategory::Deployment,
        WorkerCategory::Documentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerCategory::Design => "design",
            WorkerCategory::Implementation => "implementation",
            WorkerCategory::Quality => "quality",
            WorkerCategory::Deployment => "deployment",
            WorkerCategory::Documentation => "documentation",
        }
    }

    /// Display name used for stage names
    pub fn display_name(&self) -> &'static str {
        match self {
            WorkerCategory::Design => "Design",
            WorkerCategory::Implementation => "Implementation",
            WorkerCategory::Quality => "Quality",
            WorkerCategory::Deployment => "Deployment",
            WorkerCategory::Documentation => "Documentation",
        }
    }
}

impl fmt::Display for WorkerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for WorkerCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "design" => Ok(WorkerCategory::Design),
            "implementation" => Ok(WorkerCategory::Implementation),
            "quality" | "testing" => Ok(WorkerCategory::Quality),
            "deployment" => Ok(WorkerCategory::Deployment),
            "documentation" => Ok(WorkerCategory::Documentation),
            other => Err(format!("Unknown worker category: {}", other)),
        }
    }
}

/// A named capability profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerDescriptor {
    pub name: String,
    pub category: WorkerCategory,
    /// Lower is more important (1 = highest)
    pub priority: u8,
    /// Capability tags, matched as substrings against task text
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl WorkerDescriptor {
    pub fn new(name: impl Into<String>, category: WorkerCategory, priority: u8) -> Self {
        Self {
            name: name.into(),
            category,
            priority,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Number of capability tags that occur in the (lowercased) task text
    pub fn tag_score(&self, text_lower: &str) -> usize {
        self.tags
            .iter()
            .filter(|tag| text_lower.contains(tag.to_lowercase().as_str()))
            .count()
    }
}
