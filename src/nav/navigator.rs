//! Page navigation state machine.
//!
//! The navigator owns the shared page index across all tracks and serializes
//! transitions behind a single busy flag: while a transition pipeline runs,
//! every further navigation call is dropped. Dropped calls are not queued;
//! a held-down key must not replay a burst of stale page turns afterwards.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use log::{debug, info};
use serde_json::json;

use super::sections::{SectionId, SectionTable};
use crate::events::{EventBus, topics};
use crate::page::SectionProbe;

/// Animation seams invoked around a page turn. Implementations may take
/// their time; the pipeline awaits them.
#[async_trait]
pub trait TransitionHooks: Send + Sync {
    async fn on_section_exit(&self, section: &SectionId);
    async fn on_section_enter(&self, section: &SectionId);
}

/// Hooks that do nothing; the pipeline still pauses for its configured
/// durations.
pub struct NoopHooks;

#[async_trait]
impl TransitionHooks for NoopHooks {
    async fn on_section_exit(&self, _section: &SectionId) {}
    async fn on_section_enter(&self, _section: &SectionId) {}
}

/// Hooks that publish `section:exit` / `section:enter` on the event bus so
/// UI code can animate without being wired into the navigator.
pub struct EventHooks {
    events: Arc<EventBus>,
}

impl EventHooks {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl TransitionHooks for EventHooks {
    async fn on_section_exit(&self, section: &SectionId) {
        self.events
            .emit(topics::SECTION_EXIT, json!({ "section": section.as_str() }));
    }

    async fn on_section_enter(&self, section: &SectionId) {
        self.events
            .emit(topics::SECTION_ENTER, json!({ "section": section.as_str() }));
    }
}

/// Fixed step durations of the transition pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTiming {
    /// Wait after the exit hooks, before active markers clear.
    pub exit: Duration,
    /// Wait after the enter hooks, before the index commits and unlocks.
    pub settle: Duration,
}

impl Default for TransitionTiming {
    fn default() -> Self {
        Self {
            exit: Duration::from_millis(300),
            settle: Duration::from_millis(600),
        }
    }
}

/// Snapshot of the visible page.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPage {
    pub index: usize,
    /// `(track name, section id)` per track, in track order.
    pub sections: Vec<(String, SectionId)>,
}

#[derive(Default)]
struct NavState {
    current: usize,
    transitioning: bool,
    started: bool,
    active: Vec<SectionId>,
}

pub struct PageNavigator {
    table: SectionTable,
    hooks: Arc<dyn TransitionHooks>,
    probe: Arc<dyn SectionProbe>,
    events: Arc<EventBus>,
    timing: TransitionTiming,
    state: Mutex<NavState>,
}

impl PageNavigator {
    pub fn new(
        table: SectionTable,
        hooks: Arc<dyn TransitionHooks>,
        probe: Arc<dyn SectionProbe>,
        events: Arc<EventBus>,
        timing: TransitionTiming,
    ) -> Self {
        Self {
            table,
            hooks,
            probe,
            events,
            timing,
            state: Mutex::new(NavState::default()),
        }
    }

    /// Readiness gate and initial display.
    ///
    /// Fails if any configured section is missing from the document, which
    /// means the fragment batch has not (fully) landed yet. On success the
    /// first page enters and `page:changed { index: 0 }` fires. Navigation
    /// calls before `start` are dropped.
    pub async fn start(&self) -> Result<()> {
        let missing: Vec<String> = self
            .table
            .all_sections()
            .filter(|section| !self.probe.is_section_ready(section))
            .map(|section| section.to_string())
            .collect();
        if !missing.is_empty() {
            bail!("sections not present in the document: {}", missing.join(", "));
        }

        {
            let mut state = self.state.lock().unwrap();
            if state.started {
                bail!("navigator already started");
            }
            state.started = true;
            state.transitioning = true;
        }

        if self.table.is_empty() {
            // An empty book is a permitted state; there is nothing to show.
            self.state.lock().unwrap().transitioning = false;
            info!("navigator started with no pages");
            return Ok(());
        }

        self.enter_sections(0).await;
        {
            let mut state = self.state.lock().unwrap();
            state.current = 0;
            state.transitioning = false;
        }
        info!("navigator started at page 0");
        self.emit_page_changed(0);
        Ok(())
    }

    /// Run the transition pipeline towards `target`.
    ///
    /// Returns `false` without side effects when the call is dropped:
    /// not started yet, already transitioning, out of range, or the page
    /// that is already visible.
    pub async fn show(&self, target: usize) -> bool {
        {
            let mut state = self.state.lock().unwrap();
            if !state.started
                || state.transitioning
                || target >= self.table.len()
                || target == state.current
            {
                debug!(
                    "dropping navigation to {target} (started: {}, busy: {}, current: {})",
                    state.started, state.transitioning, state.current
                );
                return false;
            }
            state.transitioning = true;
        }

        let outgoing = {
            let state = self.state.lock().unwrap();
            state.active.clone()
        };
        for section in &outgoing {
            self.hooks.on_section_exit(section).await;
        }
        tokio::time::sleep(self.timing.exit).await;
        self.state.lock().unwrap().active.clear();

        self.enter_sections(target).await;
        tokio::time::sleep(self.timing.settle).await;

        {
            let mut state = self.state.lock().unwrap();
            state.current = target;
            state.transitioning = false;
        }
        debug!("page changed to {target}");
        self.emit_page_changed(target);
        true
    }

    pub async fn next(&self) -> bool {
        let target = {
            let state = self.state.lock().unwrap();
            state.current + 1
        };
        self.show(target).await
    }

    pub async fn previous(&self) -> bool {
        let current = {
            let state = self.state.lock().unwrap();
            state.current
        };
        if current == 0 {
            return false;
        }
        self.show(current - 1).await
    }

    pub async fn first(&self) -> bool {
        self.show(0).await
    }

    pub async fn last(&self) -> bool {
        match self.table.len() {
            0 => false,
            len => self.show(len - 1).await,
        }
    }

    /// Navigate to the page containing `section`. Returns `false` when the
    /// id is unknown or the transition was dropped.
    pub async fn go_to_section(&self, section: &SectionId) -> bool {
        match self.table.index_of(section) {
            Some(index) => self.show(index).await,
            None => {
                debug!("unknown section '{section}'");
                false
            }
        }
    }

    pub fn current(&self) -> CurrentPage {
        let index = self.state.lock().unwrap().current;
        CurrentPage {
            index,
            sections: self
                .table
                .sections_at(index)
                .into_iter()
                .map(|(track, section)| (track.to_string(), section.clone()))
                .collect(),
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.lock().unwrap().transitioning
    }

    pub fn is_first_page(&self) -> bool {
        self.state.lock().unwrap().current == 0
    }

    pub fn is_last_page(&self) -> bool {
        !self.table.is_empty() && self.state.lock().unwrap().current == self.table.len() - 1
    }

    /// Reading progress in percent.
    pub fn progress(&self) -> f64 {
        match self.table.len() {
            0 => 0.0,
            len => {
                let current = self.state.lock().unwrap().current;
                (current + 1) as f64 / len as f64 * 100.0
            }
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn tracks(&self) -> &SectionTable {
        &self.table
    }

    async fn enter_sections(&self, index: usize) {
        let entering: Vec<SectionId> = self
            .table
            .sections_at(index)
            .into_iter()
            .map(|(_, section)| section.clone())
            .collect();
        for section in &entering {
            self.hooks.on_section_enter(section).await;
        }
        self.state.lock().unwrap().active = entering;
    }

    fn emit_page_changed(&self, index: usize) {
        let sections: serde_json::Map<String, serde_json::Value> = self
            .table
            .sections_at(index)
            .into_iter()
            .map(|(track, section)| (track.to_string(), json!(section.as_str())))
            .collect();
        self.events.emit(
            topics::PAGE_CHANGED,
            json!({ "index": index, "sections": sections }),
        );
    }
}
