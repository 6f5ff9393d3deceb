//! TUI view state for a streaming session.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use a2acli_core::SessionOutcome;
use a2acli_core::projection::TaskProjection;

/// Braille spinner shown next to the current activity.
pub const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// How the session view ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The event stream ended.
    Finished,
    /// The user pressed `q` or ctrl+c.
    Quit,
}

/// Presentation-only state; task data lives in the projector.
#[derive(Debug)]
pub struct App {
    pub tick_rate: Duration,
    frame: usize,
    exit: Option<Exit>,
    /// Set when the stream failed; the view is held until a key is pressed.
    pub frozen: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(100),
            frame: 0,
            exit: None,
            frozen: false,
        }
    }

    /// Advance the spinner by one frame.
    pub fn tick(&mut self) {
        if self.exit.is_none() && !self.frozen {
            self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    /// Current spinner frame, or `None` once the view stopped animating.
    pub fn spinner(&self) -> Option<&'static str> {
        if self.exit.is_some() || self.frozen {
            None
        } else {
            Some(SPINNER_FRAMES[self.frame])
        }
    }

    /// Handle one key press.
    ///
    /// A frozen view closes on any key. Otherwise `q` and ctrl+c quit.
    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.frozen {
            self.finish();
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit(),
            _ => {}
        }
    }

    pub fn quit(&mut self) {
        self.exit.get_or_insert(Exit::Quit);
    }

    pub fn finish(&mut self) {
        self.exit.get_or_insert(Exit::Finished);
    }

    pub fn exit(&self) -> Option<Exit> {
        self.exit
    }
}

/// How a view that left its event loop normally ended the session.
///
/// A stream error wins over how the view was closed.
pub fn outcome(app: &App, state: &TaskProjection) -> SessionOutcome {
    match (state.error(), app.exit()) {
        (Some(message), _) => SessionOutcome::Failed(message.to_string()),
        (None, Some(Exit::Quit)) => SessionOutcome::Cancelled,
        (None, _) => SessionOutcome::Completed,
    }
}
