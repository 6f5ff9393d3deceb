//! Data model of the agent-to-agent task protocol, as far as this client
//! consumes it.
//!
//! These types mirror the protocol's JSON shapes so the same values can be
//! received from a transport, emitted verbatim in raw mode, and read back
//! from a recorded event log.

pub mod card;
pub mod event;
pub mod task;

pub use card::{AgentCapabilities, AgentCard, AgentInterface, AgentSkill, SendMessageRequest};
pub use event::{Event, TaskArtifactUpdateEvent, TaskStatusUpdateEvent};
pub use task::{Artifact, Message, Part, Phase, Role, Task, TaskId, TaskStatus};
