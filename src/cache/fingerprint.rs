use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::analysis::Complexity;

/// Field separator fed to the hasher so adjacent fields cannot run together
const SEP: &[u8] = &[0x1f];

/// Hex digest identifying a planning request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of `(text prefix, override, required workers, history)`.
    ///
    /// Only the first `prefix_chars` characters of the task text take part,
    /// so tasks sharing a long common prefix share a cache entry.
    pub fn compute(
        task_text: &str,
        prefix_chars: usize,
        complexity_override: Option<Complexity>,
        required_workers: &[String],
        execution_history: &[String],
    ) -> Self {
        let prefix: String = task_text.chars().take(prefix_chars).collect();

        let mut history = Sha256::new();
        for entry in execution_history {
            history.update(entry.as_bytes());
            history.update(SEP);
        }

        let mut hasher = Sha256::new();
        hasher.update(prefix.as_bytes());
        hasher.update(SEP);
        hasher.update(complexity_override.map_or("", |c| c.as_str()).as_bytes());
        hasher.update(SEP);
        for worker in required_workers {
            hasher.update(worker.as_bytes());
            hasher.update(SEP);
        }
        hasher.update(SEP);
        hasher.update(history.finalize());

        Self(to_hex(&hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough for logs
        write!(f, "{}", &self.0[..self.0.len().min(12)])
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
