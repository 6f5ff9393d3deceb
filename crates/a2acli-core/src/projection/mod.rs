//! Task lifecycle projection.
//!
//! [`Projector::apply`] folds one [`Event`] into the [`TaskProjection`] and
//! returns the [`Update`]s it caused. Both renderers drive the same
//! projector; the interactive view repaints from the projection, raw mode
//! only needs the artifact side effects.
//!
//! Once a terminal phase has been recorded, later status updates are
//! ignored entirely. Artifacts are always processed.

pub mod preview;

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::artifact::{ArtifactDestination, ArtifactSink, ArtifactWriteRecord};
use crate::protocol::{Artifact, Event, Message, Phase, TaskId, TaskStatus};

pub use preview::{Preview, PreviewPolicy};

/// Number of log lines retained by default.
pub const DEFAULT_LOG_CAPACITY: usize = 15;

/// What a log line reports, so renderers can style it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Agent,
    Status(Phase),
    Artifact,
    Preview,
    Saved,
    SaveFailed,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub kind: LineKind,
    pub text: String,
}

impl LogLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// A single change produced by applying an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    TaskId(TaskId),
    Phase(Phase),
    Line(LogLine),
    ArtifactSaved(ArtifactWriteRecord),
    ArtifactFailed { name: String, error: String },
    Failed(String),
}

/// The locally maintained view of one task session.
#[derive(Debug, Clone)]
pub struct TaskProjection {
    phase: Option<Phase>,
    task_id: Option<TaskId>,
    activity: String,
    log: VecDeque<LogLine>,
    capacity: usize,
    error: Option<String>,
}

impl TaskProjection {
    pub fn new(capacity: usize) -> Self {
        Self {
            phase: None,
            task_id: None,
            activity: "Initializing...".to_string(),
            log: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            error: None,
        }
    }

    pub fn phase(&self) -> Option<&Phase> {
        self.phase.as_ref()
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    /// Short description of the most recent activity, for status bars.
    pub fn activity(&self) -> &str {
        &self.activity
    }

    /// The retained log lines, oldest first.
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &LogLine> {
        self.log.iter()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// A terminal phase was recorded.
    pub fn is_terminal(&self) -> bool {
        self.phase.as_ref().is_some_and(Phase::is_terminal)
    }

    fn push(&mut self, line: LogLine) {
        if self.log.len() == self.capacity {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }
}

impl Default for TaskProjection {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

/// Folds events into a [`TaskProjection`], saving artifacts on the way.
#[derive(Debug)]
pub struct Projector {
    state: TaskProjection,
    sink: ArtifactSink,
    preview: PreviewPolicy,
}

impl Projector {
    pub fn new(destination: ArtifactDestination) -> Self {
        Self {
            state: TaskProjection::default(),
            sink: ArtifactSink::new(destination),
            preview: PreviewPolicy::INTERACTIVE,
        }
    }

    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.state = TaskProjection::new(capacity);
        self
    }

    pub fn state(&self) -> &TaskProjection {
        &self.state
    }

    pub fn into_state(self) -> TaskProjection {
        self.state
    }

    /// Apply one event.
    pub fn apply(&mut self, event: &Event) -> Vec<Update> {
        let mut updates = Vec::new();

        if self.state.task_id.is_none() {
            if let Some(id) = event.task_id() {
                debug!(task_id = %id, "task id discovered");
                self.state.task_id = Some(id.clone());
                updates.push(Update::TaskId(id.clone()));
            }
        }

        match event {
            Event::Task(task) => self.apply_status(&task.status, &mut updates),
            Event::StatusUpdate(update) => self.apply_status(&update.status, &mut updates),
            Event::Message(message) => self.apply_message(message, &mut updates),
            Event::ArtifactUpdate(update) => self.apply_artifact(&update.artifact, &mut updates),
        }

        updates
    }

    /// Record a stream error. The projection is finished afterwards.
    pub fn fail(&mut self, message: impl Into<String>) -> Vec<Update> {
        let message = message.into();
        self.state.error = Some(message.clone());
        self.state.activity = "Error".to_string();
        let line = LogLine::new(LineKind::Error, format!("Error: {message}"));
        self.state.push(line.clone());
        vec![Update::Line(line), Update::Failed(message)]
    }

    /// Add an informational line that is not derived from an event.
    pub fn note(&mut self, text: impl Into<String>) -> Update {
        let line = LogLine::new(LineKind::Info, text);
        self.state.push(line.clone());
        Update::Line(line)
    }

    fn line(&mut self, kind: LineKind, text: String, updates: &mut Vec<Update>) {
        let line = LogLine::new(kind, text);
        self.state.push(line.clone());
        updates.push(Update::Line(line));
    }

    fn apply_message(&mut self, message: &Message, updates: &mut Vec<Update>) {
        self.state.activity = "Received Message".to_string();
        if let Some(text) = message.joined_text() {
            self.line(LineKind::Agent, format!("Agent: {text}"), updates);
        }
    }

    fn apply_status(&mut self, status: &TaskStatus, updates: &mut Vec<Update>) {
        if self.state.is_terminal() {
            debug!(phase = %status.state, "ignoring status after terminal phase");
            return;
        }

        let phase = status.state.clone();
        self.state.activity = phase.to_string();
        self.state.phase = Some(phase.clone());
        updates.push(Update::Phase(phase.clone()));

        if let Some(text) = status.message.as_ref().and_then(Message::joined_text) {
            self.line(LineKind::Status(phase.clone()), format!("[{phase}] {text}"), updates);
        }
    }

    fn apply_artifact(&mut self, artifact: &Artifact, updates: &mut Vec<Update>) {
        self.state.activity = "Artifact Received".to_string();
        self.line(
            LineKind::Artifact,
            format!("ARTIFACT: {}", artifact.name),
            updates,
        );

        for part in &artifact.parts {
            let preview = self.preview.render(part);
            self.line(LineKind::Preview, preview.to_string(), updates);
        }

        if !self.sink.is_configured() {
            return;
        }
        match self.sink.write(artifact) {
            Ok(record) => {
                self.line(
                    LineKind::Saved,
                    format!("Saved to: {}", record.path.display()),
                    updates,
                );
                updates.push(Update::ArtifactSaved(record));
            }
            Err(e) => {
                warn!(artifact = %artifact.name, error = %e, "failed to save artifact");
                self.line(LineKind::SaveFailed, format!("Error saving: {e}"), updates);
                updates.push(Update::ArtifactFailed {
                    name: artifact.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
}
