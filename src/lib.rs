//! pagebook: a book-style paginated content engine.
//!
//! Fragments of HTML are fetched asynchronously (with caching, request
//! dedup, linear-backoff retries and priority-tiered batches) into an
//! in-memory document, and a navigator advances parallel section tracks in
//! lockstep under one shared index with strictly serialized transitions.
//! A terminal front-end reads the result as a book.

pub mod cli;
pub mod config;
pub mod events;
pub mod fetch;
pub mod loader;
pub mod nav;
pub mod page;
pub mod tui;

pub use config::Manifest;
pub use events::{EventBus, ListenerId, topics};
pub use fetch::{DirFetcher, FragmentFetcher, HttpFetcher};
pub use loader::{
    ComponentKey, ComponentLoader, FetchError, FragmentRequest, LoadError, LoadOptions, LoadState,
    LoaderConfig, MountId, RetryConfig, RetryPolicy,
};
pub use nav::{
    CurrentPage, EventHooks, NoopHooks, PageNavigator, SectionId, SectionTable, Track,
    TransitionHooks, TransitionTiming,
};
pub use page::{Document, MountContent, MountHost, SectionProbe};
