//! Identifiers and bookkeeping types for loadable fragments.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::retry::RetryConfig;

/// Identifier of a mount point, the named slot a fragment is inserted into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountId(String);

impl MountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Cache and dedup key: one mount/source pair is loaded at most once unless
/// a reload is forced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    pub mount: MountId,
    pub source_path: String,
}

impl ComponentKey {
    pub fn new(mount: MountId, source_path: impl Into<String>) -> Self {
        Self {
            mount,
            source_path: source_path.into(),
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.mount, self.source_path)
    }
}

/// Lifecycle of a fragment, tracked per [`ComponentKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

/// One fragment of a batch: which mount it fills, where its HTML comes from
/// and which priority tier it belongs to. Lower priorities load first;
/// fragments sharing a priority load concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentRequest {
    pub mount: MountId,
    #[serde(rename = "path")]
    pub source_path: String,
    #[serde(default = "default_priority")]
    pub priority: u32,
}

impl FragmentRequest {
    pub fn new(mount: impl Into<MountId>, source_path: impl Into<String>, priority: u32) -> Self {
        Self {
            mount: mount.into(),
            source_path: source_path.into(),
            priority,
        }
    }

    pub fn key(&self) -> ComponentKey {
        ComponentKey::new(self.mount.clone(), self.source_path.clone())
    }
}

fn default_priority() -> u32 {
    1
}

/// Per-call options for [`ComponentLoader::load`](super::ComponentLoader::load).
///
/// Unset retry fields fall back to the loader's configured defaults.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub force_reload: bool,
    pub max_retries: Option<u32>,
    pub retry_backoff: Option<Duration>,
}

impl LoadOptions {
    pub fn force() -> Self {
        Self {
            force_reload: true,
            ..Self::default()
        }
    }

    /// Merge the per-call overrides over the loader defaults.
    pub(crate) fn retry_config(&self, base: &RetryConfig) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            backoff: self.retry_backoff.unwrap_or(base.backoff),
            jitter: base.jitter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_matches_mount_and_path() {
        let key = ComponentKey::new("profile-section-container".into(), "components/profile.html");
        assert_eq!(
            key.to_string(),
            "profile-section-container-components/profile.html"
        );
    }

    #[test]
    fn options_fall_back_to_loader_defaults() {
        let base = RetryConfig {
            max_retries: 3,
            backoff: Duration::from_millis(1000),
            jitter: false,
        };

        let merged = LoadOptions::default().retry_config(&base);
        assert_eq!(merged.max_retries, 3);
        assert_eq!(merged.backoff, Duration::from_millis(1000));

        let overridden = LoadOptions {
            max_retries: Some(1),
            retry_backoff: Some(Duration::from_millis(50)),
            ..LoadOptions::default()
        }
        .retry_config(&base);
        assert_eq!(overridden.max_retries, 1);
        assert_eq!(overridden.backoff, Duration::from_millis(50));
    }

    #[test]
    fn request_priority_defaults_to_one() {
        let request: FragmentRequest =
            toml::from_str("mount = \"nav\"\npath = \"components/nav.html\"\n").unwrap();
        assert_eq!(request.priority, 1);
    }
}
