pub mod document;
pub mod sanitize;

pub use document::{Document, MountContent, MountHost, SectionProbe};
