//! Failure taxonomy for fragment loading.
//!
//! Transport failures are retryable up to the configured budget; a missing
//! mount is terminal immediately. Both variants stay `Clone` so a terminal
//! outcome can be handed to every caller sharing a deduplicated load.

use std::sync::Arc;

use thiserror::Error;

use super::component::MountId;

/// A single fetch attempt failed. Network errors and non-2xx statuses are
/// treated the same by the retry loop.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("GET {source_path} failed: {message}")]
    Network { source_path: String, message: String },

    #[error("GET {source_path} returned HTTP {status}")]
    Status { source_path: String, status: u16 },
}

impl FetchError {
    pub fn source_path(&self) -> &str {
        match self {
            FetchError::Network { source_path, .. } => source_path,
            FetchError::Status { source_path, .. } => source_path,
        }
    }
}

/// Terminal outcome of a [`load`](crate::loader::ComponentLoader::load) call.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The target mount is not registered; nothing was fetched.
    #[error("mount '{mount}' not found for {source_path}")]
    MountNotFound { mount: MountId, source_path: String },

    /// Every fetch attempt failed.
    #[error("loading {source_path} into '{mount}' failed after {attempts} attempt(s): {cause}")]
    Transport {
        mount: MountId,
        source_path: String,
        attempts: u32,
        cause: Arc<FetchError>,
    },
}

impl LoadError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadError::Transport { .. })
    }

    pub fn mount(&self) -> &MountId {
        match self {
            LoadError::MountNotFound { mount, .. } => mount,
            LoadError::Transport { mount, .. } => mount,
        }
    }

    pub fn source_path(&self) -> &str {
        match self {
            LoadError::MountNotFound { source_path, .. } => source_path,
            LoadError::Transport { source_path, .. } => source_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_reports_attempts_and_cause() {
        let error = LoadError::Transport {
            mount: "left-page".into(),
            source_path: "components/left.html".to_string(),
            attempts: 4,
            cause: Arc::new(FetchError::Status {
                source_path: "components/left.html".to_string(),
                status: 503,
            }),
        };

        let message = error.to_string();
        assert!(message.contains("after 4 attempt(s)"));
        assert!(message.contains("HTTP 503"));
        assert!(error.is_retryable());
    }

    #[test]
    fn mount_not_found_is_not_retryable() {
        let error = LoadError::MountNotFound {
            mount: "missing".into(),
            source_path: "components/missing.html".to_string(),
        };
        assert!(!error.is_retryable());
        assert_eq!(error.mount().as_str(), "missing");
    }
}
