//! Shared test utilities for a2acli integration tests.
//!
//! Provides a scripted in-memory agent: a [`ScriptedTransport`] that replays
//! a fixed list of events, a [`ScriptedConnector`] handing it out, and a
//! [`StaticResolver`] that counts how often the agent card was fetched.
//! The `*_event` builders keep test scripts short.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use a2acli_core::negotiate::Binding;
use a2acli_core::protocol::{
    AgentCapabilities, AgentCard, AgentInterface, Artifact, Event, Message, Part, Phase, Role,
    SendMessageRequest, Task, TaskArtifactUpdateEvent, TaskId, TaskStatus, TaskStatusUpdateEvent,
};
use a2acli_core::transport::{
    CardResolver, Connector, Endpoint, EventStream, Transport, TransportError,
};

// ===========================================================================
// Event builders
// ===========================================================================

pub fn status_event(task_id: &str, phase: Phase) -> Event {
    Event::StatusUpdate(TaskStatusUpdateEvent {
        task_id: task_id.into(),
        context_id: None,
        is_final: phase.is_terminal(),
        status: TaskStatus::new(phase),
    })
}

pub fn status_text_event(task_id: &str, phase: Phase, text: &str) -> Event {
    let mut status = TaskStatus::new(phase);
    status.message = Some(Message::new(Role::Agent, vec![Part::text(text)]));
    Event::StatusUpdate(TaskStatusUpdateEvent {
        task_id: task_id.into(),
        context_id: None,
        is_final: false,
        status,
    })
}

pub fn artifact_text_event(task_id: &str, name: &str, text: &str) -> Event {
    artifact_event(task_id, Artifact::new(name, vec![Part::text(text)]))
}

pub fn artifact_data_event(task_id: &str, name: &str, data: Value) -> Event {
    artifact_event(task_id, Artifact::new(name, vec![Part::data(data)]))
}

pub fn artifact_event(task_id: &str, artifact: Artifact) -> Event {
    Event::ArtifactUpdate(TaskArtifactUpdateEvent {
        task_id: task_id.into(),
        context_id: None,
        artifact,
        append: false,
        last_chunk: true,
    })
}

pub fn message_event(task_id: &str, text: &str) -> Event {
    let mut message = Message::new(Role::Agent, vec![Part::text(text)]);
    message.task_id = Some(task_id.into());
    Event::Message(message)
}

/// An agent card advertising `bindings`, in order.
pub fn card(name: &str, bindings: &[&str], streaming: bool) -> AgentCard {
    AgentCard {
        name: name.to_string(),
        description: format!("{name} test agent"),
        supported_interfaces: bindings
            .iter()
            .map(|b| AgentInterface {
                url: format!("http://127.0.0.1:9001/{b}"),
                protocol_binding: (*b).to_string(),
            })
            .collect(),
        capabilities: AgentCapabilities {
            streaming,
            push_notifications: false,
        },
        ..AgentCard::default()
    }
}

// ===========================================================================
// Scripted transport
// ===========================================================================

/// One step of a scripted event stream.
#[derive(Debug, Clone)]
pub enum Step {
    Event(Event),
    /// Ends the stream with a connection error carrying this message.
    Error(String),
}

impl From<Event> for Step {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

/// Replays a fixed script for every streaming call.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Vec<Step>,
    tasks: HashMap<TaskId, Task>,
    sent: Arc<std::sync::Mutex<Vec<SendMessageRequest>>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Make `task` available to `get_task` and as the `send_message` result.
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.insert(task.id.clone(), task);
        self
    }

    /// Requests received so far, across clones.
    pub fn sent(&self) -> Vec<SendMessageRequest> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self, request: &SendMessageRequest) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request.clone());
        }
    }

    fn replay(&self) -> EventStream {
        let items: Vec<_> = self
            .script
            .iter()
            .cloned()
            .map(|step| match step {
                Step::Event(event) => Ok(event),
                Step::Error(message) => Err(TransportError::Connection(message)),
            })
            .collect();
        Box::pin(futures::stream::iter(items))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<Task, TransportError> {
        self.record(request);
        self.tasks
            .values()
            .next()
            .cloned()
            .ok_or_else(|| TransportError::Remote("no task scripted".to_string()))
    }

    fn send_streaming_message(&self, request: &SendMessageRequest) -> EventStream {
        self.record(request);
        self.replay()
    }

    async fn get_task(&self, task_id: &TaskId) -> Result<Task, TransportError> {
        self.tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| TransportError::TaskNotFound(task_id.clone()))
    }

    fn subscribe_to_task(&self, _task_id: &TaskId) -> EventStream {
        self.replay()
    }
}

/// Hands out clones of one [`ScriptedTransport`] for a fixed binding.
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    binding: Binding,
    transport: ScriptedTransport,
    connects: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new(binding: Binding, transport: ScriptedTransport) -> Self {
        Self {
            binding,
            transport,
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of successful `connect` calls.
    pub fn connects(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connects)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    fn binding(&self) -> Binding {
        self.binding
    }

    async fn connect(
        &self,
        _card: &AgentCard,
        _endpoint: &Endpoint,
    ) -> Result<Box<dyn Transport>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.transport.clone()))
    }
}

/// Returns the same card every time and counts the calls.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    card: AgentCard,
    calls: Arc<AtomicUsize>,
}

impl StaticResolver {
    pub fn new(card: AgentCard) -> Self {
        Self {
            card,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `resolve` calls.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl CardResolver for StaticResolver {
    async fn resolve(&self, _endpoint: &Endpoint) -> Result<AgentCard, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.card.clone())
    }
}
