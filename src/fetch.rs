//! Fragment sources.
//!
//! The loader talks to a [`FragmentFetcher`] so the transport can be swapped:
//! HTTP for a deployed book, a local directory for the bundled demo and for
//! tests.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::loader::FetchError;

/// Source of fragment bodies, addressed by relative path.
#[async_trait]
pub trait FragmentFetcher: Send + Sync {
    async fn fetch(&self, source_path: &str) -> Result<String, FetchError>;
}

/// Fetches fragments over HTTP GET relative to a base URL.
pub struct HttpFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("pagebook/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url_for(&self, source_path: &str) -> String {
        format!("{}/{}", self.base_url, source_path.trim_start_matches('/'))
    }
}

#[async_trait]
impl FragmentFetcher for HttpFetcher {
    async fn fetch(&self, source_path: &str) -> Result<String, FetchError> {
        let url = self.url_for(source_path);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/html")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|error| FetchError::Network {
                source_path: source_path.to_string(),
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                source_path: source_path.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|error| FetchError::Network {
            source_path: source_path.to_string(),
            message: error.to_string(),
        })
    }
}

/// Fetches fragments from files under a base directory.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, source_path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(source_path.trim_start_matches('/'));
        // Relative paths only; the base directory is the root of the book.
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return Err(FetchError::Network {
                source_path: source_path.to_string(),
                message: "path escapes the base directory".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FragmentFetcher for DirFetcher {
    async fn fetch(&self, source_path: &str) -> Result<String, FetchError> {
        let path = self.path_for(source_path)?;
        debug!("reading {}", path.display());

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|error| FetchError::Network {
                source_path: source_path.to_string(),
                message: error.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_urls_join_cleanly() {
        let fetcher = HttpFetcher::new("http://localhost:8000/");
        assert_eq!(
            fetcher.url_for("/components/profile.html"),
            "http://localhost:8000/components/profile.html"
        );
        assert_eq!(
            fetcher.url_for("components/profile.html"),
            "http://localhost:8000/components/profile.html"
        );
    }

    #[test]
    fn dir_fetcher_rejects_escaping_paths() {
        let fetcher = DirFetcher::new("demos");
        assert!(fetcher.path_for("../secrets.html").is_err());
        assert!(fetcher.path_for("components/profile.html").is_ok());
    }

    #[tokio::test]
    async fn dir_fetcher_reports_missing_files_as_network_errors() {
        let fetcher = DirFetcher::new("demos");
        let error = fetcher.fetch("components/no-such-file.html").await.unwrap_err();
        assert!(matches!(error, FetchError::Network { .. }));
    }
}
