use serde::{Deserialize, Serialize};

use super::task::{Artifact, Message, Task, TaskId, TaskStatus};

/// A lifecycle change reported for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    #[serde(default)]
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

/// A new or extended artifact reported for a task.
///
/// `append` and `last_chunk` are the sequencing hints the agent attaches
/// when an artifact is delivered in pieces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    #[serde(default)]
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    pub artifact: Artifact,
    #[serde(default)]
    pub append: bool,
    #[serde(default)]
    pub last_chunk: bool,
}

/// One item of a task event stream.
///
/// The wire form is tagged by `kind`, which is also what raw mode emits
/// line by line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Event {
    Task(Task),
    Message(Message),
    StatusUpdate(TaskStatusUpdateEvent),
    ArtifactUpdate(TaskArtifactUpdateEvent),
}

impl Event {
    /// The task this event belongs to, if it names a non-empty one.
    pub fn task_id(&self) -> Option<&TaskId> {
        let id = match self {
            Self::Task(task) => Some(&task.id),
            Self::Message(msg) => msg.task_id.as_ref(),
            Self::StatusUpdate(ev) => Some(&ev.task_id),
            Self::ArtifactUpdate(ev) => Some(&ev.task_id),
        };
        id.filter(|id| !id.is_empty())
    }
}
