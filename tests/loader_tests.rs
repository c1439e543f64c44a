//! End-to-end behavior of the fragment loader against a scripted fetcher.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pagebook::{
    ComponentLoader, Document, EventBus, FetchError, FragmentFetcher, FragmentRequest, LoadError,
    LoadOptions, LoadState, LoaderConfig, MountContent, MountId, RetryConfig, topics,
};

#[derive(Clone, Debug)]
struct Call {
    path: String,
    started: Instant,
    finished: Instant,
}

/// Scripted fragment source: fixed bodies, optional permanent failures and
/// an artificial per-request delay.
#[derive(Default)]
struct MockFetcher {
    bodies: HashMap<String, String>,
    failing: Vec<String>,
    delay: Duration,
    calls: Mutex<Vec<Call>>,
}

impl MockFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn with_body(mut self, path: &str, body: &str) -> Self {
        self.bodies.insert(path.to_string(), body.to_string());
        self
    }

    fn with_failing(mut self, path: &str) -> Self {
        self.failing.push(path.to_string());
        self
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn calls_for(&self, path: &str) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl FragmentFetcher for MockFetcher {
    async fn fetch(&self, source_path: &str) -> Result<String, FetchError> {
        let started = Instant::now();
        tokio::time::sleep(self.delay).await;
        self.calls.lock().unwrap().push(Call {
            path: source_path.to_string(),
            started,
            finished: Instant::now(),
        });

        if self.failing.iter().any(|path| path == source_path) {
            return Err(FetchError::Status {
                source_path: source_path.to_string(),
                status: 500,
            });
        }
        Ok(self
            .bodies
            .get(source_path)
            .cloned()
            .unwrap_or_else(|| format!("<div id=\"frag-{source_path}\">fragment</div>")))
    }
}

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        backoff: Duration::from_millis(1),
        jitter: false,
    }
}

struct Harness {
    loader: ComponentLoader,
    document: Arc<Document>,
    events: Arc<EventBus>,
    fetcher: Arc<MockFetcher>,
}

fn harness(fetcher: MockFetcher, mounts: &[&str], retry: RetryConfig) -> Harness {
    let fetcher = Arc::new(fetcher);
    let document = Arc::new(Document::with_mounts(
        mounts.iter().map(|mount| MountId::from(*mount)),
    ));
    let events = Arc::new(EventBus::new());
    let loader = ComponentLoader::new(
        fetcher.clone(),
        document.clone(),
        events.clone(),
        LoaderConfig {
            retry,
            tier_delay: Duration::from_millis(10),
        },
    );
    Harness {
        loader,
        document,
        events,
        fetcher,
    }
}

fn record_topic(events: &EventBus, topic: &str) -> Arc<Mutex<Vec<serde_json::Value>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    events.on(topic, move |value| {
        sink.lock().unwrap().push(value.clone());
    });
    seen
}

#[tokio::test]
async fn concurrent_loads_share_one_fetch() {
    let h = harness(
        MockFetcher::new().with_delay(Duration::from_millis(30)),
        &["m"],
        fast_retry(0),
    );
    let loaded = record_topic(&h.events, topics::COMPONENT_LOADED);

    let mount = MountId::from("m");
    let (first, second) = tokio::join!(
        h.loader.load(&mount, "a.html", LoadOptions::default()),
        h.loader.load(&mount, "a.html", LoadOptions::default()),
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(h.fetcher.call_count(), 1);
    assert_eq!(loaded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn successful_load_is_cached() {
    let h = harness(MockFetcher::new(), &["m"], fast_retry(0));
    let mount = MountId::from("m");

    h.loader.load(&mount, "a.html", LoadOptions::default()).await.unwrap();
    h.loader.load(&mount, "a.html", LoadOptions::default()).await.unwrap();

    assert_eq!(h.fetcher.call_count(), 1);
    assert!(h.loader.is_loaded(&mount, "a.html"));
}

#[tokio::test]
async fn force_reload_fetches_again() {
    let h = harness(MockFetcher::new(), &["m"], fast_retry(0));
    let mount = MountId::from("m");

    h.loader.load(&mount, "a.html", LoadOptions::default()).await.unwrap();
    h.loader.reload(&mount, "a.html").await.unwrap();

    assert_eq!(h.fetcher.call_count(), 2);
}

#[tokio::test]
async fn retries_are_bounded_by_the_attempt_budget() {
    let h = harness(
        MockFetcher::new().with_failing("a.html"),
        &["m"],
        fast_retry(2),
    );
    let mount = MountId::from("m");

    let error = h
        .loader
        .load(&mount, "a.html", LoadOptions::default())
        .await
        .unwrap_err();

    match error {
        LoadError::Transport { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.fetcher.call_count(), 3);
    assert_eq!(h.loader.state(&mount, "a.html"), LoadState::Failed);
}

#[tokio::test]
async fn attempt_count_is_independent_of_backoff() {
    let slow_backoff = RetryConfig {
        max_retries: 2,
        backoff: Duration::from_millis(5),
        jitter: false,
    };
    let h = harness(MockFetcher::new().with_failing("a.html"), &["m"], slow_backoff);
    let mount = MountId::from("m");

    let result = h.loader.load(&mount, "a.html", LoadOptions::default()).await;

    assert!(result.is_err());
    assert_eq!(h.fetcher.call_count(), 3);
}

#[tokio::test]
async fn per_call_options_override_loader_retry_defaults() {
    let h = harness(
        MockFetcher::new().with_failing("a.html"),
        &["m"],
        fast_retry(5),
    );
    let mount = MountId::from("m");

    let options = LoadOptions {
        max_retries: Some(0),
        retry_backoff: Some(Duration::from_millis(1)),
        ..LoadOptions::default()
    };
    let result = h.loader.load(&mount, "a.html", options).await;

    assert!(result.is_err());
    assert_eq!(h.fetcher.call_count(), 1);
}

#[tokio::test]
async fn missing_mount_fails_without_touching_the_network() {
    let h = harness(MockFetcher::new(), &[], fast_retry(3));
    let mount = MountId::from("nowhere");
    let failed = record_topic(&h.events, topics::COMPONENT_FAILED);

    let error = h
        .loader
        .load(&mount, "a.html", LoadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(error, LoadError::MountNotFound { .. }));
    assert_eq!(h.fetcher.call_count(), 0);
    assert_eq!(failed.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn batches_load_tier_by_tier_without_overlap() {
    let h = harness(
        MockFetcher::new().with_delay(Duration::from_millis(20)),
        &["m-a1", "m-a2", "m-b", "m-c"],
        fast_retry(0),
    );

    let requests = vec![
        FragmentRequest::new("m-b", "b.html", 2),
        FragmentRequest::new("m-a1", "a1.html", 1),
        FragmentRequest::new("m-a2", "a2.html", 1),
        FragmentRequest::new("m-c", "c.html", 3),
    ];
    assert!(h.loader.load_all(&requests).await);

    let a1 = &h.fetcher.calls_for("a1.html")[0];
    let a2 = &h.fetcher.calls_for("a2.html")[0];
    let b = &h.fetcher.calls_for("b.html")[0];
    let c = &h.fetcher.calls_for("c.html")[0];

    // Priority 1 fetches settle before priority 2 starts, and so on.
    assert!(b.started >= a1.finished);
    assert!(b.started >= a2.finished);
    assert!(c.started >= b.finished);
}

#[tokio::test]
async fn failed_batch_still_attempts_remaining_tiers() {
    let h = harness(
        MockFetcher::new().with_failing("a.html"),
        &["m-a", "m-b"],
        fast_retry(1),
    );
    let all_loaded = record_topic(&h.events, topics::ALL_COMPONENTS_LOADED);

    let requests = vec![
        FragmentRequest::new("m-a", "a.html", 1),
        FragmentRequest::new("m-b", "b.html", 2),
    ];
    assert!(!h.loader.load_all(&requests).await);

    // The later tier loaded despite the earlier failure.
    assert!(h.loader.is_loaded(&MountId::from("m-b"), "b.html"));
    assert!(all_loaded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn partial_failure_marks_mounts_accordingly() {
    let h = harness(
        MockFetcher::new()
            .with_failing("broken.html")
            .with_body("ok.html", "<div id=\"ok\">hello</div>"),
        &["m1", "m2"],
        fast_retry(1),
    );

    let requests = vec![
        FragmentRequest::new("m1", "broken.html", 1),
        FragmentRequest::new("m2", "ok.html", 1),
    ];
    assert!(!h.loader.load_all(&requests).await);

    match h.document.content(&MountId::from("m2")) {
        Some(MountContent::Html(html)) => assert!(html.contains("hello")),
        other => panic!("unexpected content: {other:?}"),
    }
    match h.document.content(&MountId::from("m1")) {
        Some(MountContent::Error { source_path, message }) => {
            assert_eq!(source_path, "broken.html");
            assert!(message.contains("HTTP 500"));
        }
        other => panic!("unexpected content: {other:?}"),
    }
}

#[tokio::test]
async fn successful_batch_emits_all_components_loaded_once() {
    let h = harness(MockFetcher::new(), &["m1", "m2"], fast_retry(0));
    let all_loaded = record_topic(&h.events, topics::ALL_COMPONENTS_LOADED);

    let requests = vec![
        FragmentRequest::new("m1", "a.html", 1),
        FragmentRequest::new("m2", "b.html", 2),
    ];
    assert!(h.loader.load_all(&requests).await);

    let seen = all_loaded.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].get("timestamp").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn clear_cache_resets_load_states() {
    let h = harness(MockFetcher::new(), &["m"], fast_retry(0));
    let mount = MountId::from("m");

    h.loader.load(&mount, "a.html", LoadOptions::default()).await.unwrap();
    assert_eq!(h.loader.loaded_components().len(), 1);

    h.loader.clear_cache();
    assert!(!h.loader.is_loaded(&mount, "a.html"));
    assert_eq!(h.loader.state(&mount, "a.html"), LoadState::NotLoaded);
    assert!(h.loader.loaded_components().is_empty());

    // Mounted content survives a cache reset.
    assert!(matches!(
        h.document.content(&mount),
        Some(MountContent::Html(_))
    ));

    h.loader.load(&mount, "a.html", LoadOptions::default()).await.unwrap();
    assert_eq!(h.fetcher.call_count(), 2);
}

#[tokio::test]
async fn preloaded_bodies_skip_the_second_fetch() {
    let h = harness(
        MockFetcher::new().with_body("a.html", "<div id=\"warm\">warm body</div>"),
        &["m"],
        fast_retry(0),
    );
    let mount = MountId::from("m");
    let requests = vec![FragmentRequest::new("m", "a.html", 1)];

    h.loader.preload(&requests).await;
    assert_eq!(h.fetcher.call_count(), 1);

    h.loader.load(&mount, "a.html", LoadOptions::default()).await.unwrap();
    assert_eq!(h.fetcher.call_count(), 1);
    match h.document.content(&mount) {
        Some(MountContent::Html(html)) => assert!(html.contains("warm body")),
        other => panic!("unexpected content: {other:?}"),
    }
}

#[tokio::test]
async fn script_tags_never_reach_the_mount() {
    let h = harness(
        MockFetcher::new().with_body(
            "a.html",
            "<div id=\"safe\">ok</div><script>window.alert('no')</script>",
        ),
        &["m"],
        fast_retry(0),
    );
    let mount = MountId::from("m");

    h.loader.load(&mount, "a.html", LoadOptions::default()).await.unwrap();

    match h.document.content(&mount) {
        Some(MountContent::Html(html)) => {
            assert!(html.contains("ok"));
            assert!(!html.to_lowercase().contains("<script"));
        }
        other => panic!("unexpected content: {other:?}"),
    }
}
