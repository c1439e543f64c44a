//! In-memory content surface the loader writes into.
//!
//! A [`Document`] is a registry of mount points, each holding the HTML of
//! one loaded fragment (or an inline error after a terminal load failure).
//! Section readiness is derived from the mounted markup, so the navigator
//! can gate on fragments actually being present.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;

use super::sanitize;
use crate::loader::{LoadError, MountId};
use crate::nav::SectionId;

/// What a mount point currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountContent {
    Empty,
    Html(String),
    /// Inline error indicator rendered after retries were exhausted.
    Error {
        source_path: String,
        message: String,
    },
}

impl MountContent {
    pub fn is_loaded(&self) -> bool {
        matches!(self, MountContent::Html(_))
    }
}

/// Consumer of loaded fragments. Implemented by [`Document`]; tests may
/// substitute a recording fake.
pub trait MountHost: Send + Sync {
    fn has_mount(&self, mount: &MountId) -> bool;
    fn set_content(&self, mount: &MountId, html: &str);
    fn render_mount_error(&self, mount: &MountId, source_path: &str, error: &LoadError);
}

/// Readiness probe consulted by the navigator before the first page is shown.
pub trait SectionProbe: Send + Sync {
    fn is_section_ready(&self, section: &SectionId) -> bool;
}

#[derive(Default)]
pub struct Document {
    mounts: Mutex<HashMap<MountId, MountContent>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mounts<I>(mounts: I) -> Self
    where
        I: IntoIterator<Item = MountId>,
    {
        let document = Self::new();
        for mount in mounts {
            document.register_mount(mount);
        }
        document
    }

    /// Register an empty mount point. Registering an existing mount keeps
    /// its current content.
    pub fn register_mount(&self, mount: MountId) {
        self.mounts
            .lock()
            .unwrap()
            .entry(mount)
            .or_insert(MountContent::Empty);
    }

    pub fn content(&self, mount: &MountId) -> Option<MountContent> {
        self.mounts.lock().unwrap().get(mount).cloned()
    }

    pub fn mount_ids(&self) -> Vec<MountId> {
        let mut ids: Vec<MountId> = self.mounts.lock().unwrap().keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    /// Element ids present across all mounted fragments.
    pub fn section_ids(&self) -> Vec<String> {
        let mounts = self.mounts.lock().unwrap();
        let mut ids: Vec<String> = mounts
            .values()
            .filter_map(|content| match content {
                MountContent::Html(html) => Some(sanitize::element_ids(html)),
                _ => None,
            })
            .flatten()
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Plain-text rendering of the fragment that declares `section`.
    pub fn section_text(&self, section: &SectionId) -> Option<String> {
        let mounts = self.mounts.lock().unwrap();
        mounts.values().find_map(|content| match content {
            MountContent::Html(html)
                if sanitize::element_ids(html).iter().any(|id| id == section.as_str()) =>
            {
                Some(sanitize::visible_text(html))
            }
            _ => None,
        })
    }
}

impl MountHost for Document {
    fn has_mount(&self, mount: &MountId) -> bool {
        self.mounts.lock().unwrap().contains_key(mount)
    }

    fn set_content(&self, mount: &MountId, html: &str) {
        debug!("mount '{mount}' received {} bytes", html.len());
        self.mounts
            .lock()
            .unwrap()
            .insert(mount.clone(), MountContent::Html(html.to_string()));
    }

    fn render_mount_error(&self, mount: &MountId, source_path: &str, error: &LoadError) {
        self.mounts.lock().unwrap().insert(
            mount.clone(),
            MountContent::Error {
                source_path: source_path.to_string(),
                message: error.to_string(),
            },
        );
    }
}

impl SectionProbe for Document {
    fn is_section_ready(&self, section: &SectionId) -> bool {
        let mounts = self.mounts.lock().unwrap();
        mounts.values().any(|content| match content {
            MountContent::Html(html) => {
                sanitize::element_ids(html).iter().any(|id| id == section.as_str())
            }
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample() -> Document {
        let document = Document::with_mounts(["left".into(), "right".into()]);
        document.set_content(
            &"left".into(),
            r#"<section id="profile-page"><h1>Jane</h1></section>"#,
        );
        document
    }

    #[test]
    fn registered_mounts_start_empty() {
        let document = sample();
        assert!(document.has_mount(&"right".into()));
        assert_eq!(document.content(&"right".into()), Some(MountContent::Empty));
        assert_eq!(document.content(&"nope".into()), None);
    }

    #[test]
    fn sections_become_ready_when_their_fragment_mounts() {
        let document = sample();
        assert!(document.is_section_ready(&"profile-page".into()));
        assert!(!document.is_section_ready(&"section-skills".into()));

        document.set_content(&"right".into(), r#"<div id="section-skills"></div>"#);
        assert!(document.is_section_ready(&"section-skills".into()));
        assert_eq!(document.section_ids(), vec!["profile-page", "section-skills"]);
    }

    #[test]
    fn section_text_renders_the_owning_fragment() {
        let document = sample();
        assert_eq!(
            document.section_text(&"profile-page".into()),
            Some("Jane".to_string())
        );
        assert_eq!(document.section_text(&"section-skills".into()), None);
    }

    #[test]
    fn mount_error_replaces_content() {
        let document = sample();
        let error = LoadError::MountNotFound {
            mount: "left".into(),
            source_path: "components/profile.html".to_string(),
        };
        document.render_mount_error(&"left".into(), "components/profile.html", &error);

        match document.content(&"left".into()) {
            Some(MountContent::Error { source_path, message }) => {
                assert_eq!(source_path, "components/profile.html");
                assert!(message.contains("not found"));
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn document_is_shareable_across_tasks() {
        let document: Arc<dyn MountHost> = Arc::new(sample());
        document.set_content(&"right".into(), "<p>hi</p>");
        assert!(document.has_mount(&"right".into()));
    }
}
