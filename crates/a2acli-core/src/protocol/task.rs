use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Server-assigned identifier of a remote task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle stage of a remote task.
///
/// Serialized as the upper-case protocol name (`"WORKING"`). Unknown
/// agent-defined states survive a round trip through [`Phase::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Phase {
    Submitted,
    Working,
    InputRequired,
    AuthRequired,
    Completed,
    Canceled,
    Failed,
    Rejected,
    Other(String),
}

impl Phase {
    /// Whether no further state changes are expected after this phase.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Canceled | Self::Failed | Self::Rejected
        )
    }

    /// Parse a protocol state name.
    ///
    /// Accepts the canonical upper-case names as well as the kebab-case and
    /// `TASK_STATE_`-prefixed spellings used by other protocol revisions.
    pub fn parse(s: &str) -> Self {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        let name = normalized
            .strip_prefix("TASK_STATE_")
            .unwrap_or(&normalized);
        match name {
            "SUBMITTED" => Self::Submitted,
            "WORKING" => Self::Working,
            "INPUT_REQUIRED" => Self::InputRequired,
            "AUTH_REQUIRED" => Self::AuthRequired,
            "COMPLETED" => Self::Completed,
            "CANCELED" | "CANCELLED" => Self::Canceled,
            "FAILED" => Self::Failed,
            "REJECTED" => Self::Rejected,
            _ => Self::Other(s.trim().to_owned()),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "SUBMITTED",
            Self::Working => "WORKING",
            Self::InputRequired => "INPUT_REQUIRED",
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::Completed => "COMPLETED",
            Self::Canceled => "CANCELED",
            Self::Failed => "FAILED",
            Self::Rejected => "REJECTED",
            Self::Other(s) => s,
        };
        f.write_str(s)
    }
}

impl From<String> for Phase {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Phase> for String {
    fn from(p: Phase) -> Self {
        p.to_string()
    }
}

// ---------------------------------------------------------------------------
// Messages and parts
// ---------------------------------------------------------------------------

/// Sender of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Agent,
}

/// One piece of message or artifact content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: Value },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn data(data: Value) -> Self {
        Self::Data { data }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Data { .. } => None,
        }
    }
}

/// A conversational message exchanged with the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_task_ids: Vec<TaskId>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Message {
    /// Build a message from `role` with the given parts and a fresh id.
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            role,
            parts,
            ..Self::default()
        }
    }

    /// Text parts in order, skipping structured data.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(Part::as_text)
    }

    /// All text parts joined by a single space, or `None` if there are none.
    pub fn joined_text(&self) -> Option<String> {
        let texts: Vec<&str> = self.texts().filter(|t| !t.is_empty()).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join(" "))
        }
    }
}

/// A named output produced by the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default)]
    pub artifact_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            artifact_id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            parts,
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Status of a task at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TaskStatus {
    pub fn new(state: Phase) -> Self {
        Self {
            state,
            message: None,
            timestamp: None,
        }
    }
}

/// Full snapshot of a remote task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, state: Phase) -> Self {
        Self {
            id: id.into(),
            context_id: None,
            status: TaskStatus::new(state),
            artifacts: Vec::new(),
            history: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Phase of the latest known status.
    pub fn phase(&self) -> &Phase {
        &self.status.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_parses_all_spellings() {
        assert_eq!(Phase::parse("COMPLETED"), Phase::Completed);
        assert_eq!(Phase::parse("completed"), Phase::Completed);
        assert_eq!(Phase::parse("TASK_STATE_WORKING"), Phase::Working);
        assert_eq!(Phase::parse("input-required"), Phase::InputRequired);
        assert_eq!(Phase::parse("cancelled"), Phase::Canceled);
        assert_eq!(
            Phase::parse("thinking-hard"),
            Phase::Other("thinking-hard".to_string())
        );
    }

    #[test]
    fn terminal_phases() {
        assert!(Phase::Completed.is_terminal());
        assert!(Phase::Failed.is_terminal());
        assert!(Phase::Rejected.is_terminal());
        assert!(Phase::Canceled.is_terminal());
        assert!(!Phase::Working.is_terminal());
        assert!(!Phase::InputRequired.is_terminal());
        assert!(!Phase::Other("custom".to_string()).is_terminal());
    }

    #[test]
    fn phase_serializes_upper_case() {
        let json = serde_json::to_string(&TaskStatus::new(Phase::InputRequired)).unwrap();
        assert_eq!(json, r#"{"state":"INPUT_REQUIRED"}"#);

        let status: TaskStatus = serde_json::from_str(r#"{"state":"working"}"#).unwrap();
        assert_eq!(status.state, Phase::Working);
    }

    #[test]
    fn joined_text_skips_data_parts() {
        let msg = Message::new(
            Role::Agent,
            vec![
                Part::text("hello"),
                Part::data(serde_json::json!({"k": 1})),
                Part::text("world"),
            ],
        );
        assert_eq!(msg.joined_text().as_deref(), Some("hello world"));

        let data_only = Message::new(Role::Agent, vec![Part::data(serde_json::json!(1))]);
        assert_eq!(data_only.joined_text(), None);
    }

    #[test]
    fn part_uses_kind_tag() {
        let json = serde_json::to_value(Part::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "text", "text": "hi"}));
    }
}
