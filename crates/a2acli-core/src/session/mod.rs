//! Session entry points.
//!
//! A [`Session`] owns one connected transport and the options it was opened
//! with. Streaming calls run the full pipeline:
//!
//! ```text
//! Transport --EventStream--> EventPump --mpsc(1)--> Renderer
//!                                                     |
//!                                                  Projector --> ArtifactSink
//! ```

use tracing::info;

use crate::artifact::{ArtifactDestination, ArtifactSink};
use crate::negotiate::{Binding, NegotiationError};
use crate::projection::Projector;
use crate::protocol::{AgentCard, SendMessageRequest, Task, TaskId};
use crate::render::{Renderer, SessionReport};
use crate::stream::EventPump;
use crate::transport::{ClientFactory, Endpoint, EventStream, Transport, TransportError};

/// Errors that prevent a session from producing a stream at all.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Everything a command needs to open and run a session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub endpoint: Endpoint,
    /// Binding forced by the user, validated before anything is fetched.
    pub transport: Option<String>,
    pub destination: ArtifactDestination,
    /// Existing non-terminal task to continue.
    pub continue_task: Option<TaskId>,
    /// Task to reference as context.
    pub reference_task: Option<TaskId>,
    pub interactive: bool,
}

/// Which event sequence to open.
#[derive(Debug, Clone)]
pub enum StreamRequest {
    Send(SendMessageRequest),
    Subscribe(TaskId),
}

/// A connected transport plus the options it was opened with.
pub struct Session {
    options: SessionOptions,
    card: Option<AgentCard>,
    binding: Option<Binding>,
    transport: Box<dyn Transport>,
}

impl Session {
    /// Resolve the agent card, negotiate a binding and connect.
    pub async fn connect(factory: &ClientFactory, options: SessionOptions) -> Result<Self, SessionError> {
        let conn = factory
            .connect(&options.endpoint, options.transport.as_deref())
            .await?;
        Ok(Self {
            options,
            card: Some(conn.card),
            binding: Some(conn.binding),
            transport: conn.transport,
        })
    }

    /// Wrap a transport that needs no negotiation, such as a replay.
    pub fn with_transport(transport: Box<dyn Transport>, options: SessionOptions) -> Self {
        Self {
            options,
            card: None,
            binding: None,
            transport,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn card(&self) -> Option<&AgentCard> {
        self.card.as_ref()
    }

    pub fn binding(&self) -> Option<Binding> {
        self.binding
    }

    /// Whether the agent accepts streaming requests. Unknown agents are
    /// assumed to.
    pub fn supports_streaming(&self) -> bool {
        self.card
            .as_ref()
            .is_none_or(|card| card.capabilities.streaming)
    }

    /// A user message with this session's continuation and reference ids.
    pub fn request(&self, text: impl Into<String>) -> SendMessageRequest {
        let mut request = SendMessageRequest::text(text);
        if let Some(id) = &self.options.continue_task {
            request = request.continue_task(id.clone());
        }
        if let Some(id) = &self.options.reference_task {
            request = request.reference(id.clone());
        }
        request
    }

    /// A fresh artifact sink for this session's destination.
    pub fn sink(&self) -> ArtifactSink {
        ArtifactSink::new(self.options.destination.clone())
    }

    /// Open the event sequence for `request`.
    pub fn open(&self, request: &StreamRequest) -> EventStream {
        match request {
            StreamRequest::Send(req) => self.transport.send_streaming_message(req),
            StreamRequest::Subscribe(id) => self.transport.subscribe_to_task(id),
        }
    }

    /// Stream `request` through the projector into `renderer`.
    pub async fn stream<R>(&self, request: StreamRequest, renderer: &mut R) -> SessionReport
    where
        R: Renderer + ?Sized,
    {
        let mut projector = Projector::new(self.options.destination.clone());
        if let (Some(card), Some(binding)) = (&self.card, self.binding) {
            projector.note(format!("Connected to {} via {binding}", card.name));
        }

        info!(
            transport = self.transport.name(),
            interactive = self.options.interactive,
            "opening event stream"
        );
        let pump = EventPump::spawn(self.open(&request));
        renderer.render(pump, projector).await
    }

    /// Send and wait for the final task.
    pub async fn send_blocking(&self, request: &SendMessageRequest) -> Result<Task, TransportError> {
        self.transport.send_message(request).await
    }

    pub async fn fetch(&self, task_id: &TaskId) -> Result<Task, TransportError> {
        self.transport.get_task(task_id).await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("binding", &self.binding)
            .field("transport", &self.transport.name())
            .finish()
    }
}
