//! Static section configuration.
//!
//! A book is a set of parallel tracks (the left and right pages of a spread,
//! for instance) that advance in lockstep under one shared index. Tracks are
//! fixed at startup and validated once.

use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Identifier of one section, matching an element id in a loaded fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One parallel sequence of sections, e.g. the left page of each spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub sections: Vec<SectionId>,
}

impl Track {
    pub fn new(name: impl Into<String>, sections: Vec<SectionId>) -> Self {
        Self {
            name: name.into(),
            sections,
        }
    }
}

/// Validated set of equal-length tracks.
#[derive(Debug, Clone)]
pub struct SectionTable {
    tracks: Vec<Track>,
}

impl SectionTable {
    /// Tracks must all have the same length and section ids must be unique
    /// across the whole table, otherwise `go_to_section` would be ambiguous.
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        if let Some(first) = tracks.first() {
            let expected = first.sections.len();
            for track in &tracks {
                if track.sections.len() != expected {
                    bail!(
                        "track '{}' has {} section(s), expected {} to match track '{}'",
                        track.name,
                        track.sections.len(),
                        expected,
                        first.name
                    );
                }
            }
        }

        let mut seen: Vec<&SectionId> = Vec::new();
        for track in &tracks {
            for section in &track.sections {
                if seen.contains(&section) {
                    bail!("section '{section}' appears more than once");
                }
                seen.push(section);
            }
        }

        Ok(Self { tracks })
    }

    /// Number of pages, the common length of all tracks.
    pub fn len(&self) -> usize {
        self.tracks.first().map_or(0, |track| track.sections.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// The section shown by each track at `index`, in track order.
    pub fn sections_at(&self, index: usize) -> Vec<(&str, &SectionId)> {
        self.tracks
            .iter()
            .filter_map(|track| {
                track
                    .sections
                    .get(index)
                    .map(|section| (track.name.as_str(), section))
            })
            .collect()
    }

    /// Resolve a section id to its page index, across all tracks.
    pub fn index_of(&self, section: &SectionId) -> Option<usize> {
        self.tracks
            .iter()
            .find_map(|track| track.sections.iter().position(|s| s == section))
    }

    pub fn all_sections(&self) -> impl Iterator<Item = &SectionId> {
        self.tracks.iter().flat_map(|track| track.sections.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread() -> SectionTable {
        SectionTable::new(vec![
            Track::new("left", vec!["profile-page".into(), "section-education".into()]),
            Track::new("right", vec!["section-contact".into(), "section-experience".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn equal_length_tracks_are_accepted() {
        let table = spread();
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
    }

    #[test]
    fn unequal_tracks_are_rejected() {
        let result = SectionTable::new(vec![
            Track::new("left", vec!["a".into(), "b".into()]),
            Track::new("right", vec!["x".into()]),
        ]);
        assert!(result.unwrap_err().to_string().contains("expected 2"));
    }

    #[test]
    fn duplicate_sections_are_rejected() {
        let result = SectionTable::new(vec![
            Track::new("left", vec!["a".into()]),
            Track::new("right", vec!["a".into()]),
        ]);
        assert!(result.unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn empty_table_is_permitted() {
        let table = SectionTable::new(vec![]).unwrap();
        assert_eq!(table.len(), 0);
        assert!(table.sections_at(0).is_empty());
        assert_eq!(table.index_of(&"a".into()), None);
    }

    #[test]
    fn sections_resolve_across_tracks() {
        let table = spread();
        assert_eq!(table.index_of(&"profile-page".into()), Some(0));
        assert_eq!(table.index_of(&"section-experience".into()), Some(1));
        assert_eq!(table.index_of(&"unknown".into()), None);

        let at_one = table.sections_at(1);
        assert_eq!(at_one.len(), 2);
        assert_eq!(at_one[0].0, "left");
        assert_eq!(at_one[0].1.as_str(), "section-education");
        assert_eq!(at_one[1].1.as_str(), "section-experience");
    }
}
