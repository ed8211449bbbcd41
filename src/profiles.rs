//! Transcoding-profile registry
//!
//! The scheduler validates profile names against this seam; the actual
//! transcoding settings behind a name belong to the (external) ffmpeg
//! layer and are not modeled here.

use crate::config::PvrSettings;

/// Lookup interface the scheduling core validates profile names against
pub trait ProfileRegistry: Send + Sync {
    fn exists(&self, name: &str) -> bool;
    /// Profile applied when a request names none
    fn default_profile(&self) -> &str;
}

/// Fixed registry seeded from the daemon settings
#[derive(Debug, Clone)]
pub struct StaticProfiles {
    names: Vec<String>,
    default: String,
}

impl StaticProfiles {
    pub fn new(mut names: Vec<String>, default: String) -> Self {
        if !names.iter().any(|n| n == &default) {
            names.push(default.clone());
        }
        Self { names, default }
    }

    pub fn from_settings(settings: &PvrSettings) -> Self {
        Self::new(settings.profiles.clone(), settings.default_profile.clone())
    }
}

impl ProfileRegistry for StaticProfiles {
    fn exists(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    fn default_profile(&self) -> &str {
        &self.default
    }
}
