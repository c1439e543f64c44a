//! Loading screen: drives the fragment batch and shows per-component
//! progress fed by the loader's bus events.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph};
use serde_json::Value;

use crate::events::topics;
use crate::loader::{ComponentLoader, FragmentRequest};
use crate::tui::{App, AppContext, AppId, Command, Subscription, Theme};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// 80 ms per tick, so roughly one second of "all done" before the hand-off.
const COUNTDOWN_TICKS: usize = 12;

pub struct LoadingApp;

#[derive(Clone)]
pub enum Msg {
    TaskLoading(String),
    TaskLoaded(String),
    TaskFailed(String, String),
    BatchDone(bool),
    Tick,
    Retry,
    Quit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TaskStatus {
    Pending,
    Loading,
    Done,
    Failed(String),
}

pub struct Task {
    pub mount: String,
    pub source: String,
    pub status: TaskStatus,
}

pub struct State {
    loader: ComponentLoader,
    requests: Vec<FragmentRequest>,
    title: String,
    tasks: Vec<Task>,
    spinner: usize,
    outcome: Option<bool>,
    countdown: Option<usize>,
}

impl State {
    fn task_mut(&mut self, mount: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.mount == mount)
    }

    fn all_settled(&self) -> bool {
        self.tasks
            .iter()
            .all(|task| matches!(task.status, TaskStatus::Done | TaskStatus::Failed(_)))
    }
}

fn start_batch(state: &State) -> Command<Msg> {
    let loader = state.loader.clone();
    let requests = state.requests.clone();
    Command::perform(
        async move { loader.load_all(&requests).await },
        Msg::BatchDone,
    )
}

fn payload_mount(value: &Value) -> Option<String> {
    value.get("mount").and_then(Value::as_str).map(str::to_string)
}

impl App for LoadingApp {
    type State = State;
    type Msg = Msg;

    fn init(ctx: &AppContext) -> (State, Command<Msg>) {
        let state = State {
            loader: ctx.loader.clone(),
            requests: ctx.manifest.components.clone(),
            title: ctx.manifest.title.clone(),
            tasks: ctx
                .manifest
                .components
                .iter()
                .map(|component| Task {
                    mount: component.mount.to_string(),
                    source: component.source_path.clone(),
                    status: TaskStatus::Pending,
                })
                .collect(),
            spinner: 0,
            outcome: None,
            countdown: None,
        };
        let command = start_batch(&state);
        (state, command)
    }

    fn update(state: &mut State, msg: Msg) -> Command<Msg> {
        match msg {
            Msg::TaskLoading(mount) => {
                if let Some(task) = state.task_mut(&mount) {
                    task.status = TaskStatus::Loading;
                }
                Command::None
            }

            Msg::TaskLoaded(mount) => {
                if let Some(task) = state.task_mut(&mount) {
                    task.status = TaskStatus::Done;
                }
                Command::None
            }

            Msg::TaskFailed(mount, error) => {
                if let Some(task) = state.task_mut(&mount) {
                    task.status = TaskStatus::Failed(error);
                }
                Command::None
            }

            Msg::BatchDone(ok) => {
                state.outcome = Some(ok);
                if ok && state.countdown.is_none() {
                    state.countdown = Some(COUNTDOWN_TICKS);
                }
                Command::None
            }

            Msg::Tick => {
                state.spinner = (state.spinner + 1) % SPINNER_FRAMES.len();
                if let Some(remaining) = state.countdown {
                    if remaining <= 1 {
                        return Command::navigate(AppId::Reader);
                    }
                    state.countdown = Some(remaining - 1);
                }
                Command::None
            }

            Msg::Retry => {
                // Only after a failed batch; loaded fragments are cached, so
                // re-running the batch refetches just the failed ones.
                if state.outcome == Some(false) {
                    state.outcome = None;
                    for task in &mut state.tasks {
                        if matches!(task.status, TaskStatus::Failed(_)) {
                            task.status = TaskStatus::Pending;
                        }
                    }
                    start_batch(state)
                } else {
                    Command::None
                }
            }

            Msg::Quit => Command::Quit,
        }
    }

    fn view(state: &State, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut lines = Vec::new();

        let header = if state.countdown.is_some() {
            "All components loaded, opening the book...".to_string()
        } else if state.outcome == Some(false) {
            "Some components failed to load".to_string()
        } else if state.all_settled() {
            "All components loaded".to_string()
        } else {
            format!("Loading {}...", state.title)
        };
        lines.push(Line::from(vec![
            Span::styled(
                SPINNER_FRAMES[state.spinner],
                Style::default().fg(theme.sky).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(header, Style::default().fg(theme.sky)),
        ]));
        lines.push(Line::raw(""));

        for task in &state.tasks {
            let (symbol, color) = match &task.status {
                TaskStatus::Pending => ("◯".to_string(), theme.overlay),
                TaskStatus::Loading => (SPINNER_FRAMES[state.spinner].to_string(), theme.sky),
                TaskStatus::Done => ("✓".to_string(), theme.green),
                TaskStatus::Failed(_) => ("✗".to_string(), theme.red),
            };
            let mut spans = vec![
                Span::styled(format!(" {symbol} "), Style::default().fg(color)),
                Span::styled(task.source.clone(), Style::default().fg(color)),
            ];
            if let TaskStatus::Failed(error) = &task.status {
                spans.push(Span::styled(
                    format!("  {error}"),
                    Style::default().fg(theme.overlay),
                ));
            }
            lines.push(Line::from(spans));
        }

        lines.push(Line::raw(""));
        let footer = if state.outcome == Some(false) {
            "Press r to retry the failed components, q to quit"
        } else if state.countdown.is_some() {
            "Ready..."
        } else {
            "Please wait..."
        };
        lines.push(Line::styled(footer, Style::default().fg(theme.overlay)));

        let panel = Paragraph::new(lines).block(
            Block::bordered()
                .title("Loading Components")
                .border_style(Style::default().fg(theme.surface))
                .padding(Padding::uniform(1)),
        );
        frame.render_widget(panel, area);
    }

    fn subscriptions(_state: &State) -> Vec<Subscription<Msg>> {
        vec![
            Subscription::topic(topics::COMPONENT_LOADING, |value| {
                payload_mount(value).map(Msg::TaskLoading)
            }),
            Subscription::topic(topics::COMPONENT_LOADED, |value| {
                payload_mount(value).map(Msg::TaskLoaded)
            }),
            Subscription::topic(topics::COMPONENT_FAILED, |value| {
                let mount = payload_mount(value)?;
                let error = value
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string();
                Some(Msg::TaskFailed(mount, error))
            }),
            Subscription::timer(std::time::Duration::from_millis(80), Msg::Tick),
            Subscription::keyboard(
                crossterm::event::KeyCode::Char('r'),
                "Retry failed components",
                Msg::Retry,
            ),
            Subscription::keyboard(crossterm::event::KeyCode::Char('q'), "Quit", Msg::Quit),
            Subscription::keyboard(crossterm::event::KeyCode::Esc, "Quit", Msg::Quit),
        ]
    }

    fn title() -> &'static str {
        "Loading"
    }
}
