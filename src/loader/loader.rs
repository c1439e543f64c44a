//! Fragment loader: fetch, sanitize and insert HTML fragments into mounts.
//!
//! Guarantees, per `(mount, source path)` key:
//! - at most one fetch in flight; concurrent callers share its outcome
//! - a successful load is cached until `clear_cache` or a forced reload
//! - transport failures are retried on the configured schedule, a missing
//!   mount fails immediately without touching the network
//!
//! Batches load in ascending priority tiers; a tier settles completely
//! before the next one starts.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared, join_all};
use log::{debug, info, warn};
use serde_json::json;
use uuid::Uuid;

use super::component::{ComponentKey, FragmentRequest, LoadOptions, LoadState, MountId};
use super::error::LoadError;
use super::retry::{RetryConfig, RetryPolicy};
use crate::events::{EventBus, topics};
use crate::fetch::FragmentFetcher;
use crate::page::MountHost;
use crate::page::sanitize;

type SharedLoad = Shared<BoxFuture<'static, Result<(), LoadError>>>;

/// Loader-wide settings; per-call overrides live in [`LoadOptions`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub retry: RetryConfig,
    /// Pause between priority tiers in [`ComponentLoader::load_all`].
    pub tier_delay: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            tier_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Clone)]
pub struct ComponentLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    fetcher: Arc<dyn FragmentFetcher>,
    host: Arc<dyn MountHost>,
    events: Arc<EventBus>,
    config: LoaderConfig,
    states: Mutex<HashMap<ComponentKey, LoadState>>,
    in_flight: Mutex<HashMap<ComponentKey, SharedLoad>>,
    /// Bodies fetched ahead of time by `preload`, keyed by source path.
    warm: Mutex<HashMap<String, String>>,
}

impl ComponentLoader {
    pub fn new(
        fetcher: Arc<dyn FragmentFetcher>,
        host: Arc<dyn MountHost>,
        events: Arc<EventBus>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                fetcher,
                host,
                events,
                config,
                states: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                warm: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Load one fragment into its mount.
    ///
    /// Joins an in-flight load for the same key instead of fetching twice;
    /// resolves immediately when already loaded and not forced.
    pub async fn load(
        &self,
        mount: &MountId,
        source_path: &str,
        options: LoadOptions,
    ) -> Result<(), LoadError> {
        let key = ComponentKey::new(mount.clone(), source_path);

        let load = {
            let mut in_flight = self.inner.in_flight.lock().unwrap();
            if let Some(existing) = in_flight.get(&key) {
                debug!("joining in-flight load for {key}");
                existing.clone()
            } else {
                if !options.force_reload && self.inner.state_of(&key) == LoadState::Loaded {
                    debug!("cache hit for {key}");
                    return Ok(());
                }

                let inner = Arc::clone(&self.inner);
                let task_key = key.clone();
                let load: SharedLoad = async move {
                    let result = inner.load_fresh(&task_key, &options).await;
                    inner.in_flight.lock().unwrap().remove(&task_key);
                    result
                }
                .boxed()
                .shared();

                in_flight.insert(key.clone(), load.clone());
                load
            }
        };

        load.await
    }

    /// Load a batch grouped into ascending priority tiers.
    ///
    /// Each tier loads concurrently and settles fully before the next tier
    /// starts. Failures are collected rather than aborting the batch; the
    /// return value is `true` iff every fragment loaded.
    pub async fn load_all(&self, requests: &[FragmentRequest]) -> bool {
        let mut tiers: BTreeMap<u32, Vec<&FragmentRequest>> = BTreeMap::new();
        for request in requests {
            tiers.entry(request.priority).or_default().push(request);
        }

        info!(
            "loading {} fragment(s) across {} priority tier(s)",
            requests.len(),
            tiers.len()
        );

        let mut all_ok = true;
        let tier_count = tiers.len();
        for (position, (priority, tier)) in tiers.iter().enumerate() {
            debug!("loading priority {priority} tier ({} fragment(s))", tier.len());

            let results = join_all(tier.iter().map(|request| {
                self.load(&request.mount, &request.source_path, LoadOptions::default())
            }))
            .await;

            for (request, result) in tier.iter().zip(results) {
                if let Err(error) = result {
                    warn!("fragment {} failed terminally: {error}", request.key());
                    all_ok = false;
                }
            }

            // Let consumers settle before the next tier lands.
            if position + 1 < tier_count {
                tokio::time::sleep(self.inner.config.tier_delay).await;
            }
        }

        if all_ok {
            info!("all components loaded");
            self.inner.events.emit(
                topics::ALL_COMPONENTS_LOADED,
                json!({ "timestamp": Utc::now().to_rfc3339() }),
            );
        } else {
            warn!("one or more components failed to load");
        }
        all_ok
    }

    /// Fetch bodies into the warm cache without touching any mount.
    /// Best-effort: failures are logged and skipped.
    pub async fn preload(&self, requests: &[FragmentRequest]) {
        let results = join_all(requests.iter().map(|request| {
            let fetcher = Arc::clone(&self.inner.fetcher);
            async move { (request, fetcher.fetch(&request.source_path).await) }
        }))
        .await;

        for (request, result) in results {
            match result {
                Ok(body) => {
                    debug!("preloaded {}", request.source_path);
                    self.inner
                        .warm
                        .lock()
                        .unwrap()
                        .insert(request.source_path.clone(), body);
                }
                Err(error) => warn!("preload of {} failed: {error}", request.source_path),
            }
        }
        info!("component preloading completed");
    }

    /// Force a refetch of an already loaded fragment.
    pub async fn reload(&self, mount: &MountId, source_path: &str) -> Result<(), LoadError> {
        self.load(mount, source_path, LoadOptions::force()).await
    }

    pub fn is_loaded(&self, mount: &MountId, source_path: &str) -> bool {
        let key = ComponentKey::new(mount.clone(), source_path);
        self.inner.state_of(&key) == LoadState::Loaded
    }

    pub fn state(&self, mount: &MountId, source_path: &str) -> LoadState {
        let key = ComponentKey::new(mount.clone(), source_path);
        self.inner.state_of(&key)
    }

    /// Keys that have loaded successfully, in no particular order.
    pub fn loaded_components(&self) -> Vec<ComponentKey> {
        self.inner
            .states
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, state)| **state == LoadState::Loaded)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Forget every load state and warm body. Mounted content stays in place.
    pub fn clear_cache(&self) {
        self.inner.states.lock().unwrap().clear();
        self.inner.warm.lock().unwrap().clear();
        info!("component cache cleared");
    }
}

impl LoaderInner {
    fn state_of(&self, key: &ComponentKey) -> LoadState {
        self.states
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    fn set_state(&self, key: &ComponentKey, state: LoadState) {
        self.states.lock().unwrap().insert(key.clone(), state);
    }

    async fn load_fresh(&self, key: &ComponentKey, options: &LoadOptions) -> Result<(), LoadError> {
        let correlation = Uuid::new_v4();
        info!("[{correlation}] loading {} into '{}'", key.source_path, key.mount);
        self.set_state(key, LoadState::Loading);

        // A fragment with nowhere to go fails without spending any attempt.
        if !self.host.has_mount(&key.mount) {
            let error = LoadError::MountNotFound {
                mount: key.mount.clone(),
                source_path: key.source_path.clone(),
            };
            warn!("[{correlation}] {error}");
            self.set_state(key, LoadState::Failed);
            self.emit_failed(key, &error);
            return Err(error);
        }

        self.events.emit(
            topics::COMPONENT_LOADING,
            json!({ "mount": key.mount.as_str(), "source": key.source_path }),
        );

        let warm_body = self.warm.lock().unwrap().remove(&key.source_path);
        let retry = options.retry_config(&self.config.retry);
        let fetched = match warm_body {
            Some(body) => {
                debug!("[{correlation}] using preloaded body for {}", key.source_path);
                Ok(body)
            }
            None => {
                let policy = RetryPolicy::new(retry.clone());
                policy
                    .execute(|| {
                        let fetcher = Arc::clone(&self.fetcher);
                        let source_path = key.source_path.clone();
                        async move { fetcher.fetch(&source_path).await }
                    })
                    .await
            }
        };

        match fetched {
            Ok(html) => {
                let clean = sanitize::strip_scripts(&html);
                self.host.set_content(&key.mount, &clean);
                self.set_state(key, LoadState::Loaded);
                info!("[{correlation}] loaded {} into '{}'", key.source_path, key.mount);
                self.events.emit(
                    topics::COMPONENT_LOADED,
                    json!({ "mount": key.mount.as_str(), "source": key.source_path }),
                );
                Ok(())
            }
            Err(cause) => {
                let error = LoadError::Transport {
                    mount: key.mount.clone(),
                    source_path: key.source_path.clone(),
                    attempts: retry.max_attempts(),
                    cause: Arc::new(cause),
                };
                warn!("[{correlation}] {error}");
                self.set_state(key, LoadState::Failed);
                self.host
                    .render_mount_error(&key.mount, &key.source_path, &error);
                self.emit_failed(key, &error);
                Err(error)
            }
        }
    }

    fn emit_failed(&self, key: &ComponentKey, error: &LoadError) {
        self.events.emit(
            topics::COMPONENT_FAILED,
            json!({
                "mount": key.mount.as_str(),
                "source": key.source_path,
                "error": error.to_string(),
            }),
        );
    }
}
