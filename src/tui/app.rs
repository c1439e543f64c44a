use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;

use crate::config::Manifest;
use crate::events::EventBus;
use crate::loader::ComponentLoader;
use crate::nav::{EventHooks, PageNavigator, TransitionHooks};
use crate::page::{Document, SectionProbe};
use crate::tui::{Command, Subscription, Theme};

/// Shared handles the screens work with, wired up once at startup instead of
/// being discovered through globals.
#[derive(Clone)]
pub struct AppContext {
    pub manifest: Arc<Manifest>,
    pub loader: ComponentLoader,
    pub navigator: Arc<PageNavigator>,
    pub document: Arc<Document>,
    pub events: Arc<EventBus>,
}

impl AppContext {
    /// Build the full component stack from a manifest.
    pub fn from_manifest(manifest: Manifest) -> anyhow::Result<Self> {
        let manifest = Arc::new(manifest);
        let events = Arc::new(EventBus::new());
        let document = Arc::new(Document::with_mounts(
            manifest.components.iter().map(|c| c.mount.clone()),
        ));

        let loader = ComponentLoader::new(
            manifest.fetcher(),
            document.clone(),
            events.clone(),
            manifest.loader_config(),
        );

        let hooks: Arc<dyn TransitionHooks> = Arc::new(EventHooks::new(events.clone()));
        let probe: Arc<dyn SectionProbe> = document.clone();
        let navigator = Arc::new(PageNavigator::new(
            manifest.section_table()?,
            hooks,
            probe,
            events.clone(),
            manifest.timing.transition(),
        ));

        Ok(Self {
            manifest,
            loader,
            navigator,
            document,
            events,
        })
    }
}

/// The trait every screen implements, Elm style:
/// - State: the screen's data
/// - Msg: events that can happen
/// - update: handles messages and returns side effects as commands
/// - view: renders the current state into a frame area
/// - subscriptions: declares keys, timers and bus topics the screen wants
pub trait App: Sized + Send + 'static {
    type State: Send + 'static;
    type Msg: Clone + Send + 'static;

    fn init(ctx: &AppContext) -> (Self::State, Command<Self::Msg>);

    fn update(state: &mut Self::State, msg: Self::Msg) -> Command<Self::Msg>;

    fn view(state: &Self::State, frame: &mut Frame, area: Rect, theme: &Theme);

    fn subscriptions(state: &Self::State) -> Vec<Subscription<Self::Msg>>;

    fn title() -> &'static str;

    /// Optional dynamic status line for the header.
    fn status(state: &Self::State, theme: &Theme) -> Option<Line<'static>> {
        let _ = (state, theme);
        None
    }
}
