//! Host that owns the per-screen runtimes and switches between them.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::apps::{LoadingApp, ReaderApp};
use crate::tui::{AppContext, AppId, Runtime, Theme};

pub struct AppHost {
    ctx: AppContext,
    theme: Theme,
    loading: Runtime<LoadingApp>,
    /// Created on first navigation, after the fragment batch has settled;
    /// the reader's init runs the navigator's readiness gate.
    reader: Option<Runtime<ReaderApp>>,
    active: AppId,
}

impl AppHost {
    pub fn new(ctx: AppContext) -> Self {
        let loading = Runtime::new(&ctx);
        Self {
            ctx,
            theme: Theme::default(),
            loading,
            reader: None,
            active: AppId::Loading,
        }
    }

    pub fn handle_key(&mut self, key_event: crossterm::event::KeyEvent) {
        match self.active {
            AppId::Loading => self.loading.handle_key(key_event),
            AppId::Reader => {
                if let Some(reader) = self.reader.as_mut() {
                    reader.handle_key(key_event);
                }
            }
        }
        self.check_navigation();
    }

    /// Advance timers, async commands and queued bus events of the active
    /// screen. Called once per frame.
    pub fn tick(&mut self) {
        match self.active {
            AppId::Loading => {
                self.loading.drain_bus();
                self.loading.poll_timers();
                self.loading.poll_async();
            }
            AppId::Reader => {
                if let Some(reader) = self.reader.as_mut() {
                    reader.drain_bus();
                    reader.poll_timers();
                    reader.poll_async();
                }
            }
        }
        self.check_navigation();
    }

    pub fn render(&self, frame: &mut Frame) {
        let [header_area, body_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(frame.area());

        let (title, status) = match self.active {
            AppId::Loading => (self.loading.title(), self.loading.status(&self.theme)),
            AppId::Reader => match self.reader.as_ref() {
                Some(reader) => (reader.title(), reader.status(&self.theme)),
                None => ("Reader", None),
            },
        };
        let mut spans = vec![
            Span::styled(
                " pagebook ",
                Style::default()
                    .fg(self.theme.base)
                    .bg(self.theme.lavender)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {title}"), Style::default().fg(self.theme.subtext)),
        ];
        if let Some(status) = status {
            spans.push(Span::raw("  "));
            spans.extend(status.spans);
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), header_area);

        match self.active {
            AppId::Loading => self.loading.render(frame, body_area, &self.theme),
            AppId::Reader => {
                if let Some(reader) = self.reader.as_ref() {
                    reader.render(frame, body_area, &self.theme);
                }
            }
        }
    }

    pub fn should_quit(&self) -> bool {
        self.loading.quit_requested()
            || self
                .reader
                .as_ref()
                .is_some_and(Runtime::quit_requested)
    }

    fn check_navigation(&mut self) {
        let target = match self.active {
            AppId::Loading => self.loading.take_navigation(),
            AppId::Reader => self.reader.as_mut().and_then(Runtime::take_navigation),
        };
        if let Some(target) = target {
            if target == AppId::Reader && self.reader.is_none() {
                self.reader = Some(Runtime::new(&self.ctx));
            }
            self.active = target;
        }
    }
}
