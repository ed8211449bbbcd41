//! Daemon settings
//!
//! Loaded once at startup from a JSON file; the store treats the tuner
//! count and per-tuner capacity as immutable for the process lifetime.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Settings for the scheduling daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvrSettings {
    /// Number of tuner ("video") resources
    #[serde(default = "default_max_videos")]
    pub max_videos: usize,
    /// Per-tuner ceiling on pending entries
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Profile applied when a request names none
    #[serde(default = "default_profile")]
    pub default_profile: String,
    /// Registered transcoding profiles
    #[serde(default = "default_profiles")]
    pub profiles: Vec<String>,
    /// Separator used in mangled filenames
    #[serde(default = "default_mangling_prefix")]
    pub default_mangling_prefix: String,
}

fn default_max_videos() -> usize {
    2
}
fn default_max_entries() -> usize {
    1024
}
fn default_profile() -> String {
    "normal".to_string()
}
fn default_profiles() -> Vec<String> {
    vec!["low".to_string(), "normal".to_string(), "high".to_string()]
}
fn default_mangling_prefix() -> String {
    "_".to_string()
}

impl Default for PvrSettings {
    fn default() -> Self {
        Self {
            max_videos: default_max_videos(),
            max_entries: default_max_entries(),
            default_profile: default_profile(),
            profiles: default_profiles(),
            default_mangling_prefix: default_mangling_prefix(),
        }
    }
}

impl PvrSettings {
    /// Load settings from a JSON file; missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {path:?}"))?;
        let settings: PvrSettings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file {path:?}"))?;
        info!(
            "Loaded settings: {} tuners, {} entries per tuner",
            settings.max_videos, settings.max_entries
        );
        Ok(settings)
    }
}
