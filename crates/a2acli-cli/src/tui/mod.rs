//! Interactive terminal view for streaming sessions.

pub mod app;
mod ui;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::debug;

use a2acli_core::projection::{Projector, TaskProjection};
use a2acli_core::stream::EventPump;
use a2acli_core::{Renderer, SessionOutcome, SessionReport};

use app::App;

/// Renders a session in the alternate screen and prints a short transcript
/// once the terminal is restored.
#[derive(Debug, Default)]
pub struct TuiRenderer;

#[async_trait]
impl Renderer for TuiRenderer {
    async fn render(&mut self, mut pump: EventPump, mut projector: Projector) -> SessionReport {
        let mut app = App::new();

        let result = match TerminalGuard::enter() {
            Ok(mut guard) => run_event_loop(&mut guard.terminal, &mut app, &mut pump, &mut projector).await,
            Err(e) => Err(e),
        };
        // The guard has restored the terminal by now.

        let outcome = match result {
            Err(e) => {
                pump.cancel();
                SessionOutcome::Failed(format!("terminal error: {e}"))
            }
            Ok(()) => app::outcome(&app, projector.state()),
        };
        if outcome == SessionOutcome::Cancelled {
            pump.cancel();
        }

        let projection = projector.into_state();
        print_transcript(&projection);

        SessionReport {
            outcome,
            projection,
        }
    }
}

/// Raw mode plus alternate screen, undone on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                Err(e.into())
            }
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    pump: &mut EventPump,
    projector: &mut Projector,
) -> Result<()> {
    let mut stream_open = true;

    loop {
        terminal.draw(|f| ui::render(f, app, projector.state()))?;

        if app.exit().is_some() {
            return Ok(());
        }

        tokio::select! {
            item = pump.recv(), if stream_open => match item {
                None => {
                    debug!("event stream ended");
                    stream_open = false;
                    app.finish();
                }
                Some(Ok(event)) => {
                    projector.apply(&event);
                }
                Some(Err(e)) => {
                    stream_open = false;
                    projector.fail(e.to_string());
                    app.frozen = true;
                }
            },
            _ = tokio::time::sleep(app.tick_rate) => app.tick(),
        }

        // Drain pending key presses without blocking the runtime.
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                app.on_key(key);
            }
        }
    }
}

fn print_transcript(projection: &TaskProjection) {
    for line in projection.lines() {
        println!("{line}");
    }
    if let Some(id) = projection.task_id() {
        println!("\nTask ID: {id} (use --task {id} to continue, or --ref {id} to reference)");
    }
}
