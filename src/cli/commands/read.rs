//! Interactive reader: terminal setup and the frame loop.

use std::io;

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};

use crate::config::Manifest;
use crate::tui::{AppContext, AppHost};

pub async fn read_command(manifest: Manifest) -> Result<()> {
    let ctx = AppContext::from_manifest(manifest)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut host = AppHost::new(ctx);
    let result = run_loop(&mut terminal, &mut host).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop<B: Backend>(terminal: &mut Terminal<B>, host: &mut AppHost) -> Result<()> {
    loop {
        let frame_start = std::time::Instant::now();

        // Drain all pending input first for minimal latency.
        while event::poll(std::time::Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.code == crossterm::event::KeyCode::Char('c')
                        && key
                            .modifiers
                            .contains(crossterm::event::KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }
                    host.handle_key(key);
                }
                _ => {}
            }
        }

        host.tick();

        if host.should_quit() {
            return Ok(());
        }

        terminal.draw(|frame| host.render(frame))?;

        // Sleep out the remainder of a ~60 fps frame.
        let elapsed = frame_start.elapsed();
        if let Some(remaining) = std::time::Duration::from_millis(16).checked_sub(elapsed) {
            tokio::time::sleep(remaining).await;
        }
    }
}
