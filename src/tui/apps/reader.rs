//! The book reader: renders the current spread and turns pages.
//!
//! All page turns go through the shared navigator, which drops calls while
//! a transition is running; holding an arrow key down advances one page at a
//! time, not one per repeat.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Gauge, Padding, Paragraph, Wrap};

use crate::events::topics;
use crate::nav::PageNavigator;
use crate::page::Document;
use crate::tui::{App, AppContext, Command, Subscription, Theme};

pub struct ReaderApp;

#[derive(Clone)]
pub enum Msg {
    Started(Result<(), String>),
    PageChanged,
    FlipStarted,
    NavFinished(bool),
    Navigate(NavAction),
    ToggleAuto,
    AutoTick,
    Quit,
}

#[derive(Clone, Copy, Debug)]
pub enum NavAction {
    Next,
    Previous,
    First,
    Last,
    Show(usize),
    /// Auto-advance wraps back to the first page at the end.
    Auto,
}

struct Panel {
    track: String,
    section: String,
    text: String,
}

pub struct State {
    navigator: Arc<PageNavigator>,
    document: Arc<Document>,
    title: String,
    auto_interval: Duration,
    index: usize,
    total: usize,
    panels: Vec<Panel>,
    transitioning: bool,
    started: bool,
    auto: bool,
    error: Option<String>,
}

impl State {
    /// Pull the visible spread from the navigator and document.
    fn refresh(&mut self) {
        let current = self.navigator.current();
        self.index = current.index;
        self.panels = current
            .sections
            .iter()
            .map(|(track, section)| Panel {
                track: track.clone(),
                section: section.to_string(),
                text: self.document.section_text(section).unwrap_or_default(),
            })
            .collect();
    }
}

fn nav_command(state: &State, action: NavAction) -> Command<Msg> {
    if !state.started || state.error.is_some() {
        return Command::None;
    }
    let navigator = state.navigator.clone();
    Command::perform(
        async move {
            match action {
                NavAction::Next => navigator.next().await,
                NavAction::Previous => navigator.previous().await,
                NavAction::First => navigator.first().await,
                NavAction::Last => navigator.last().await,
                NavAction::Show(index) => navigator.show(index).await,
                NavAction::Auto => {
                    if navigator.is_last_page() {
                        navigator.first().await
                    } else {
                        navigator.next().await
                    }
                }
            }
        },
        Msg::NavFinished,
    )
}

impl App for ReaderApp {
    type State = State;
    type Msg = Msg;

    fn init(ctx: &AppContext) -> (State, Command<Msg>) {
        let state = State {
            navigator: ctx.navigator.clone(),
            document: ctx.document.clone(),
            title: ctx.manifest.title.clone(),
            auto_interval: ctx.manifest.timing.auto_advance(),
            index: 0,
            total: ctx.navigator.len(),
            panels: Vec::new(),
            transitioning: false,
            started: false,
            auto: false,
            error: None,
        };

        let navigator = ctx.navigator.clone();
        let command = Command::perform(
            async move { navigator.start().await.map_err(|error| error.to_string()) },
            Msg::Started,
        );
        (state, command)
    }

    fn update(state: &mut State, msg: Msg) -> Command<Msg> {
        match msg {
            Msg::Started(Ok(())) => {
                state.started = true;
                state.refresh();
                Command::None
            }

            Msg::Started(Err(error)) => {
                state.error = Some(error);
                Command::None
            }

            Msg::PageChanged => {
                state.transitioning = false;
                state.refresh();
                Command::None
            }

            Msg::FlipStarted => {
                state.transitioning = true;
                Command::None
            }

            Msg::NavFinished(_) => Command::None,

            Msg::Navigate(action) => nav_command(state, action),

            Msg::ToggleAuto => {
                state.auto = !state.auto;
                Command::None
            }

            Msg::AutoTick => {
                if state.auto && !state.transitioning {
                    nav_command(state, NavAction::Auto)
                } else {
                    Command::None
                }
            }

            Msg::Quit => Command::Quit,
        }
    }

    fn view(state: &State, frame: &mut Frame, area: Rect, theme: &Theme) {
        if let Some(error) = &state.error {
            let panel = Paragraph::new(vec![
                Line::styled("The book is not ready", Style::default().fg(theme.red)),
                Line::raw(""),
                Line::styled(error.clone(), Style::default().fg(theme.text)),
                Line::raw(""),
                Line::styled("Press q to quit", Style::default().fg(theme.overlay)),
            ])
            .wrap(Wrap { trim: false })
            .block(
                Block::bordered()
                    .title("Error")
                    .border_style(Style::default().fg(theme.red)),
            );
            frame.render_widget(panel, area);
            return;
        }

        let [header_area, body_area, gauge_area, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let mut header_spans = vec![
            Span::styled(
                state.title.clone(),
                Style::default()
                    .fg(theme.lavender)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  page {} / {}", state.index + 1, state.total.max(1)),
                Style::default().fg(theme.subtext),
            ),
        ];
        if state.transitioning {
            header_spans.push(Span::styled(
                "  turning...",
                Style::default().fg(theme.peach),
            ));
        }
        if state.auto {
            header_spans.push(Span::styled("  auto", Style::default().fg(theme.yellow)));
        }
        frame.render_widget(Paragraph::new(Line::from(header_spans)), header_area);

        if !state.panels.is_empty() {
            let constraints =
                vec![Constraint::Ratio(1, state.panels.len() as u32); state.panels.len()];
            let columns = Layout::horizontal(constraints).split(body_area);

            for (panel, column) in state.panels.iter().zip(columns.iter()) {
                let text_style = if state.transitioning {
                    Style::default().fg(theme.overlay)
                } else {
                    Style::default().fg(theme.text)
                };
                let widget = Paragraph::new(panel.text.clone())
                    .style(text_style)
                    .wrap(Wrap { trim: false })
                    .block(
                        Block::bordered()
                            .title(format!(" {} · {} ", panel.track, panel.section))
                            .border_style(Style::default().fg(theme.surface))
                            .padding(Padding::horizontal(1)),
                    );
                frame.render_widget(widget, *column);
            }
        }

        let gauge = Gauge::default()
            .ratio((state.navigator.progress() / 100.0).clamp(0.0, 1.0))
            .gauge_style(Style::default().fg(theme.blue).bg(theme.surface))
            .label(format!("{:.0}%", state.navigator.progress()));
        frame.render_widget(gauge, gauge_area);

        frame.render_widget(
            Paragraph::new(Line::styled(
                "←/→ turn  Home/End jump  1-9 go to page  a auto  q quit",
                Style::default().fg(theme.overlay),
            )),
            hint_area,
        );
    }

    fn subscriptions(state: &State) -> Vec<Subscription<Msg>> {
        let mut subscriptions = vec![
            Subscription::topic(topics::PAGE_CHANGED, |_| Some(Msg::PageChanged)),
            Subscription::topic(topics::SECTION_EXIT, |_| Some(Msg::FlipStarted)),
            Subscription::keyboard(KeyCode::Left, "Previous page", Msg::Navigate(NavAction::Previous)),
            Subscription::keyboard(KeyCode::Up, "Previous page", Msg::Navigate(NavAction::Previous)),
            Subscription::keyboard(KeyCode::Right, "Next page", Msg::Navigate(NavAction::Next)),
            Subscription::keyboard(KeyCode::Down, "Next page", Msg::Navigate(NavAction::Next)),
            Subscription::keyboard(KeyCode::Char(' '), "Next page", Msg::Navigate(NavAction::Next)),
            Subscription::keyboard(KeyCode::Home, "First page", Msg::Navigate(NavAction::First)),
            Subscription::keyboard(KeyCode::End, "Last page", Msg::Navigate(NavAction::Last)),
            Subscription::keyboard(KeyCode::Char('a'), "Toggle auto-advance", Msg::ToggleAuto),
            Subscription::keyboard(KeyCode::Char('q'), "Quit", Msg::Quit),
            Subscription::timer(state.auto_interval, Msg::AutoTick),
        ];

        for digit in 1..=9u32 {
            let key = KeyCode::Char(char::from_digit(digit, 10).unwrap_or('1'));
            subscriptions.push(Subscription::keyboard(
                key,
                format!("Go to page {digit}"),
                Msg::Navigate(NavAction::Show((digit - 1) as usize)),
            ));
        }
        subscriptions
    }

    fn title() -> &'static str {
        "Reader"
    }

    fn status(state: &State, theme: &Theme) -> Option<Line<'static>> {
        if state.started {
            Some(Line::styled(
                format!("page {} / {}", state.index + 1, state.total.max(1)),
                Style::default().fg(theme.subtext),
            ))
        } else {
            None
        }
    }
}
