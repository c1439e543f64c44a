//! Asynchronous fragment loading with caching, dedup, retries and
//! priority-tiered batches.

pub mod component;
pub mod error;
mod loader;
pub mod retry;

pub use component::{ComponentKey, FragmentRequest, LoadOptions, LoadState, MountId};
pub use error::{FetchError, LoadError};
pub use loader::{ComponentLoader, LoaderConfig};
pub use retry::{RetryConfig, RetryPolicy};
