//! Per-screen runtime: routes input, polls timers and async commands, and
//! bridges bus events into messages.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::events::{EventBus, ListenerId};
use crate::tui::{App, AppContext, AppId, Command, Subscription, Theme};

type TopicHandler<Msg> = Box<dyn Fn(&Value) -> Option<Msg> + Send>;

pub struct Runtime<A: App> {
    state: A::State,
    events: Arc<EventBus>,

    /// Key → message map from the app's subscriptions
    key_subscriptions: HashMap<KeyCode, A::Msg>,

    /// Timer subscriptions: (interval, last tick, msg)
    timers: Vec<(Duration, Instant, A::Msg)>,

    /// Bus topic handlers, fed by forwarders registered on the shared bus
    topic_handlers: HashMap<String, Vec<TopicHandler<A::Msg>>>,
    bus_rx: mpsc::UnboundedReceiver<(String, Value)>,
    forwarders: Vec<(String, ListenerId)>,

    /// Async commands in flight
    pending_async: Vec<Pin<Box<dyn Future<Output = A::Msg> + Send>>>,

    navigation_target: Option<AppId>,
    quit_requested: bool,
}

impl<A: App> Runtime<A> {
    pub fn new(ctx: &AppContext) -> Self {
        let (state, init_command) = A::init(ctx);
        let (bus_tx, bus_rx) = mpsc::unbounded_channel();

        let mut runtime = Self {
            state,
            events: ctx.events.clone(),
            key_subscriptions: HashMap::new(),
            timers: Vec::new(),
            topic_handlers: HashMap::new(),
            bus_rx,
            forwarders: Vec::new(),
            pending_async: Vec::new(),
            navigation_target: None,
            quit_requested: false,
        };

        for subscription in A::subscriptions(&runtime.state) {
            match subscription {
                Subscription::Keyboard { key, msg, .. } => {
                    runtime.key_subscriptions.insert(key, msg);
                }
                Subscription::Timer { interval, msg } => {
                    runtime.timers.push((interval, Instant::now(), msg));
                }
                Subscription::Topic { topic, handler } => {
                    let handlers = runtime.topic_handlers.entry(topic.clone()).or_default();
                    if handlers.is_empty() {
                        // First handler for this topic: forward bus events
                        // into our queue to be drained on the UI task.
                        let tx = bus_tx.clone();
                        let forwarded = topic.clone();
                        let id = ctx.events.on(topic.clone(), move |value| {
                            let _ = tx.send((forwarded.clone(), value.clone()));
                        });
                        runtime.forwarders.push((topic, id));
                    }
                    handlers.push(handler);
                }
            }
        }

        runtime.execute_command(init_command);
        runtime
    }

    /// Key bindings for help output, from the app's subscriptions.
    pub fn key_bindings(&self) -> Vec<(KeyCode, String)> {
        A::subscriptions(&self.state)
            .into_iter()
            .filter_map(|subscription| match subscription {
                Subscription::Keyboard { key, description, .. } => Some((key, description)),
                _ => None,
            })
            .collect()
    }

    pub fn title(&self) -> &'static str {
        A::title()
    }

    pub fn status(&self, theme: &Theme) -> Option<Line<'static>> {
        A::status(&self.state, theme)
    }

    pub fn state(&self) -> &A::State {
        &self.state
    }

    pub fn take_navigation(&mut self) -> Option<AppId> {
        self.navigation_target.take()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.kind != KeyEventKind::Press {
            return;
        }
        if let Some(msg) = self.key_subscriptions.get(&key_event.code).cloned() {
            self.dispatch(msg);
        }
    }

    /// Fire timers whose interval has elapsed.
    pub fn poll_timers(&mut self) {
        let now = Instant::now();
        let mut due = Vec::new();
        for (interval, last_tick, msg) in &mut self.timers {
            if now.duration_since(*last_tick) >= *interval {
                due.push(msg.clone());
                *last_tick = now;
            }
        }
        for msg in due {
            self.dispatch(msg);
        }
    }

    /// Poll pending async commands and dispatch completed ones.
    pub fn poll_async(&mut self) {
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut completed = Vec::new();
        for (position, future) in self.pending_async.iter_mut().enumerate() {
            if let Poll::Ready(msg) = future.as_mut().poll(&mut cx) {
                completed.push((position, msg));
            }
        }

        // Remove in reverse so the indices stay valid.
        completed.sort_by(|a, b| b.0.cmp(&a.0));
        for (position, msg) in completed {
            self.pending_async.remove(position);
            self.dispatch(msg);
        }
    }

    /// Turn queued bus events into messages.
    pub fn drain_bus(&mut self) {
        while let Ok((topic, value)) = self.bus_rx.try_recv() {
            let messages: Vec<A::Msg> = self
                .topic_handlers
                .get(&topic)
                .map(|handlers| handlers.iter().filter_map(|h| h(&value)).collect())
                .unwrap_or_default();
            for msg in messages {
                self.dispatch(msg);
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        A::view(&self.state, frame, area, theme);
    }

    fn dispatch(&mut self, msg: A::Msg) {
        let command = A::update(&mut self.state, msg);
        self.execute_command(command);
    }

    fn execute_command(&mut self, command: Command<A::Msg>) {
        match command {
            Command::None => {}
            Command::Batch(commands) => {
                for command in commands {
                    self.execute_command(command);
                }
            }
            Command::Perform(future) => {
                self.pending_async.push(future);
            }
            Command::Publish { topic, data } => {
                self.events.emit(&topic, data);
            }
            Command::Navigate(app_id) => {
                self.navigation_target = Some(app_id);
            }
            Command::Quit => {
                self.quit_requested = true;
            }
        }
    }
}

impl<A: App> Drop for Runtime<A> {
    fn drop(&mut self) {
        for (topic, id) in self.forwarders.drain(..) {
            self.events.off(&topic, id);
        }
    }
}
