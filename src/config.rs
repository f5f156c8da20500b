//! Pipeline configuration with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_BYTES;
use crate::queue::{DropPolicy, DEFAULT_QUEUE_DEPTH};

/// Tunables for one pipeline instance.
///
/// All fields have defaults, so a partial JSON file (or `{}`) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of render worker threads.
    pub workers: usize,
    /// Per-lane render queue depth.
    pub queue_depth: usize,
    /// Cache byte budget for resized pages.
    pub cache_bytes: usize,
    /// Navigation debounce window, milliseconds.
    pub debounce_ms: u64,
    /// Overflow behavior for a saturated request queue.
    pub drop_policy: DropPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            cache_bytes: DEFAULT_CACHE_BYTES,
            debounce_ms: 150,
            drop_policy: DropPolicy::Oldest,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn from_json(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save configuration to a JSON file.
    pub fn to_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }
}

/// Worker count derived from the machine: 75% of cores, at least one.
///
/// Leaves headroom for the interactive thread the same way heavier decode
/// pools do.
pub fn auto_workers() -> usize {
    (num_cpus::get() * 3 / 4).max(1)
}
