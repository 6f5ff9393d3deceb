//! Replay transport reading newline-delimited events.
//!
//! The input is exactly what raw mode prints: one JSON [`Event`] per line.
//! Replaying a capture reproduces the session offline, which is also how
//! the pipeline is exercised without a live agent.

use std::path::PathBuf;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

use crate::protocol::{Event, SendMessageRequest, Task, TaskId};

use super::TransportError;
use super::trait_def::{EventStream, Transport};

/// Where recorded events are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonlSource {
    Stdin,
    File(PathBuf),
}

impl JsonlSource {
    /// `-` means standard input, anything else is a file path.
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }
}

impl std::fmt::Display for JsonlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parse events line by line from any async reader.
///
/// Blank lines are skipped. A line that is not a valid event ends the
/// stream with a [`TransportError::Decode`].
pub fn read_events<R>(reader: R) -> EventStream
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let stream = async_stream::stream! {
        let mut lines = BufReader::new(reader).lines();
        let mut line_no = 0usize;

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    line_no += 1;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Event>(trimmed) {
                        Ok(event) => yield Ok(event),
                        Err(e) => {
                            debug!(line = line_no, error = %e, "malformed event line");
                            yield Err(TransportError::Decode {
                                line: line_no,
                                message: e.to_string(),
                            });
                            break;
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    yield Err(TransportError::Io(e));
                    break;
                }
            }
        }
    };

    Box::pin(stream)
}

/// Fold a recorded event sequence into the latest snapshot of one task.
pub fn fold_task(task: &mut Option<Task>, task_id: &TaskId, event: Event) {
    if event.task_id() != Some(task_id) {
        return;
    }
    match event {
        Event::Task(snapshot) => *task = Some(snapshot),
        Event::Message(msg) => {
            if let Some(task) = task.as_mut() {
                task.history.push(msg);
            }
        }
        Event::StatusUpdate(update) => match task.as_mut() {
            Some(task) => task.status = update.status,
            None => {
                let mut fresh = Task::new(task_id.clone(), update.status.state.clone());
                fresh.status = update.status;
                *task = Some(fresh);
            }
        },
        Event::ArtifactUpdate(update) => {
            let Some(task) = task.as_mut() else {
                return;
            };
            let existing = task
                .artifacts
                .iter_mut()
                .find(|a| !a.artifact_id.is_empty() && a.artifact_id == update.artifact.artifact_id);
            match existing {
                Some(artifact) if update.append => artifact.parts.extend(update.artifact.parts),
                Some(artifact) => *artifact = update.artifact,
                None => task.artifacts.push(update.artifact),
            }
        }
    }
}

/// A [`Transport`] that replays a recorded event capture.
///
/// Standard input can only be consumed once per process.
#[derive(Debug, Clone)]
pub struct JsonlTransport {
    source: JsonlSource,
}

impl JsonlTransport {
    pub fn new(source: JsonlSource) -> Self {
        Self { source }
    }

    fn open(&self) -> EventStream {
        match &self.source {
            JsonlSource::Stdin => read_events(tokio::io::stdin()),
            JsonlSource::File(path) => {
                let path = path.clone();
                Box::pin(async_stream::stream! {
                    match tokio::fs::File::open(&path).await {
                        Ok(file) => {
                            let mut inner = read_events(file);
                            while let Some(item) = inner.next().await {
                                yield item;
                            }
                        }
                        Err(e) => yield Err(TransportError::Io(e)),
                    }
                })
            }
        }
    }
}

#[async_trait]
impl Transport for JsonlTransport {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn send_message(&self, _request: &SendMessageRequest) -> Result<Task, TransportError> {
        Err(TransportError::Unsupported {
            operation: "send_message",
        })
    }

    fn send_streaming_message(&self, _request: &SendMessageRequest) -> EventStream {
        self.open()
    }

    async fn get_task(&self, task_id: &TaskId) -> Result<Task, TransportError> {
        let mut events = self.open();
        let mut task = None;
        while let Some(item) = events.next().await {
            fold_task(&mut task, task_id, item?);
        }
        task.ok_or_else(|| TransportError::TaskNotFound(task_id.clone()))
    }

    fn subscribe_to_task(&self, _task_id: &TaskId) -> EventStream {
        self.open()
    }
}
