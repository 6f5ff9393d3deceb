//! Presentation back-ends.
//!
//! A [`Renderer`] drains an [`EventPump`] through a [`Projector`] and
//! decides how the result is shown. The raw NDJSON back-end lives here; the
//! interactive terminal view is provided by the binary.

pub mod raw;
pub mod summary;

use async_trait::async_trait;

use crate::projection::{Projector, TaskProjection};
use crate::stream::EventPump;

pub use raw::RawRenderer;
pub use summary::{write_summary, write_task_json};

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The event stream ended without error.
    Completed,
    /// The user quit the interactive view.
    Cancelled,
    /// The process was interrupted while streaming non-interactively.
    Interrupted,
    /// The stream failed.
    Failed(String),
}

impl SessionOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed | Self::Cancelled => 0,
            Self::Interrupted => 130,
            Self::Failed(_) => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }
}

/// Final state of a rendered session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub projection: TaskProjection,
}

impl SessionReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

/// Drains a session's events and presents them.
#[async_trait]
pub trait Renderer: Send {
    async fn render(&mut self, pump: EventPump, projector: Projector) -> SessionReport;
}
