//! Book navigation: parallel section tracks advanced in lockstep by one
//! shared index, with strictly serialized transitions.

mod navigator;
pub mod sections;

pub use navigator::{
    CurrentPage, EventHooks, NoopHooks, PageNavigator, TransitionHooks, TransitionTiming,
};
pub use sections::{SectionId, SectionTable, Track};
