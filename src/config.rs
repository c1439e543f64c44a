//! Book manifest: which fragments to load, how the tracks are laid out and
//! how transitions are timed. Loaded from a TOML file next to the book.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::fetch::{DirFetcher, FragmentFetcher, HttpFetcher};
use crate::loader::{FragmentRequest, LoaderConfig, RetryConfig};
use crate::nav::{SectionTable, Track, TransitionTiming};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_title")]
    pub title: String,
    /// Base of all fragment paths: an `http(s)://` URL or a local directory.
    pub source: String,
    #[serde(default)]
    pub components: Vec<FragmentRequest>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub timing: TimingSettings,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    #[serde(default = "default_exit_ms")]
    pub exit_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_tier_delay_ms")]
    pub tier_delay_ms: u64,
    #[serde(default = "default_auto_advance_ms")]
    pub auto_advance_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            exit_ms: default_exit_ms(),
            settle_ms: default_settle_ms(),
            tier_delay_ms: default_tier_delay_ms(),
            auto_advance_ms: default_auto_advance_ms(),
        }
    }
}

impl TimingSettings {
    pub fn transition(&self) -> TransitionTiming {
        TransitionTiming {
            exit: Duration::from_millis(self.exit_ms),
            settle: Duration::from_millis(self.settle_ms),
        }
    }

    pub fn tier_delay(&self) -> Duration {
        Duration::from_millis(self.tier_delay_ms)
    }

    pub fn auto_advance(&self) -> Duration {
        Duration::from_millis(self.auto_advance_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            jitter: false,
        }
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("reading manifest from {}", path.display());
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let manifest: Manifest = toml::from_str(&raw)
            .with_context(|| format!("failed to parse manifest {}", path.display()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            bail!("manifest source must not be empty");
        }
        for component in &self.components {
            if component.mount.as_str().is_empty() || component.source_path.is_empty() {
                bail!("components need a non-empty mount and path");
            }
        }
        self.section_table()?;
        Ok(())
    }

    pub fn section_table(&self) -> Result<SectionTable> {
        SectionTable::new(self.tracks.clone())
    }

    /// Pick the fetcher matching the source base.
    pub fn fetcher(&self) -> Arc<dyn FragmentFetcher> {
        if self.source.starts_with("http://") || self.source.starts_with("https://") {
            Arc::new(HttpFetcher::new(self.source.clone()))
        } else {
            Arc::new(DirFetcher::new(self.source.clone()))
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.retry.max_retries,
            backoff: Duration::from_millis(self.retry.backoff_ms),
            jitter: self.retry.jitter,
        }
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            retry: self.retry_config(),
            tier_delay: self.timing.tier_delay(),
        }
    }
}

fn default_title() -> String {
    "pagebook".to_string()
}

fn default_exit_ms() -> u64 {
    300
}

fn default_settle_ms() -> u64 {
    600
}

fn default_tier_delay_ms() -> u64 {
    100
}

fn default_auto_advance_ms() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        title = "Jane Doe"
        source = "demos/book"

        [[components]]
        mount = "profile-section-container"
        path = "components/profile.html"
        priority = 1

        [[components]]
        mount = "contact-section-container"
        path = "components/contact.html"
        priority = 2

        [[tracks]]
        name = "left"
        sections = ["profile-page"]

        [[tracks]]
        name = "right"
        sections = ["section-contact"]

        [timing]
        settle_ms = 400

        [retry]
        max_retries = 2
    "#;

    #[test]
    fn parses_manifest_with_defaults() {
        let manifest: Manifest = toml::from_str(SAMPLE).unwrap();
        manifest.validate().unwrap();

        assert_eq!(manifest.title, "Jane Doe");
        assert_eq!(manifest.components.len(), 2);
        assert_eq!(manifest.components[1].priority, 2);

        // Explicit values win, everything else falls back.
        assert_eq!(manifest.timing.settle_ms, 400);
        assert_eq!(manifest.timing.exit_ms, 300);
        assert_eq!(manifest.timing.tier_delay_ms, 100);
        assert_eq!(manifest.retry.max_retries, 2);
        assert_eq!(manifest.retry.backoff_ms, 1000);

        let table = manifest.section_table().unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn rejects_unequal_tracks() {
        let mut manifest: Manifest = toml::from_str(SAMPLE).unwrap();
        manifest.tracks[0].sections.push("section-extra".into());
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn rejects_empty_source() {
        let mut manifest: Manifest = toml::from_str(SAMPLE).unwrap();
        manifest.source = "  ".to_string();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn ships_a_valid_demo_manifest() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/book.toml");
        let manifest = Manifest::load(&path).unwrap();
        assert!(!manifest.components.is_empty());
        assert_eq!(manifest.section_table().unwrap().len(), 3);
    }
}
