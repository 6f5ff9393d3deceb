//! The transport traits -- the seam to whatever speaks the wire protocol.
//!
//! This crate never frames or authenticates requests itself. A concrete
//! binding (gRPC, JSON-RPC, HTTP+JSON) implements [`Connector`] and hands
//! back a [`Transport`], which exposes the task operations as plain async
//! calls and lazy event streams.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::negotiate::Binding;
use crate::protocol::{AgentCard, Event, SendMessageRequest, Task, TaskId};

use super::TransportError;

/// One item of a live event sequence.
pub type StreamItem = Result<Event, TransportError>;

/// A lazy, possibly infinite sequence of task events.
///
/// The sequence ends either naturally (`None`) or with an `Err` item.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamItem> + Send>>;

/// Where and as whom to connect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub service_url: String,
    /// Bearer token the connector should attach to every call.
    pub token: Option<String>,
}

impl Endpoint {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }
}

/// Task operations offered by a connected agent.
///
/// This trait is object-safe so connectors can return `Box<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable name for this transport (e.g. "json-rpc").
    fn name(&self) -> &str;

    /// Send a message and block until the task reaches its final result.
    async fn send_message(&self, request: &SendMessageRequest) -> Result<Task, TransportError>;

    /// Send a message and return the live event sequence it starts.
    fn send_streaming_message(&self, request: &SendMessageRequest) -> EventStream;

    /// Fetch the current state of a known task.
    async fn get_task(&self, task_id: &TaskId) -> Result<Task, TransportError>;

    /// Re-attach to the event sequence of an in-progress task.
    fn subscribe_to_task(&self, task_id: &TaskId) -> EventStream;
}

/// Opens a [`Transport`] for one protocol binding.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The binding this connector speaks.
    fn binding(&self) -> Binding;

    /// Open a transport to the agent described by `card`.
    async fn connect(
        &self,
        card: &AgentCard,
        endpoint: &Endpoint,
    ) -> Result<Box<dyn Transport>, TransportError>;
}

/// Fetches an agent's self-description before any binding is chosen.
#[async_trait]
pub trait CardResolver: Send + Sync {
    async fn resolve(&self, endpoint: &Endpoint) -> Result<AgentCard, TransportError>;
}

// Compile-time assertion: the traits must be usable as trait objects.
const _: () = {
    fn _assert_object_safe(_: &dyn Transport, _: &dyn Connector, _: &dyn CardResolver) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    /// A transport that has nothing to say, used only to prove the trait
    /// can be implemented and boxed.
    struct SilentTransport;

    #[async_trait]
    impl Transport for SilentTransport {
        fn name(&self) -> &str {
            "silent"
        }

        async fn send_message(&self, _request: &SendMessageRequest) -> Result<Task, TransportError> {
            Err(TransportError::Unsupported {
                operation: "send_message",
            })
        }

        fn send_streaming_message(&self, _request: &SendMessageRequest) -> EventStream {
            Box::pin(futures::stream::empty())
        }

        async fn get_task(&self, task_id: &TaskId) -> Result<Task, TransportError> {
            Err(TransportError::TaskNotFound(task_id.clone()))
        }

        fn subscribe_to_task(&self, _task_id: &TaskId) -> EventStream {
            Box::pin(futures::stream::empty())
        }
    }

    #[tokio::test]
    async fn transport_is_object_safe() {
        use futures::StreamExt;

        let transport: Box<dyn Transport> = Box::new(SilentTransport);
        assert_eq!(transport.name(), "silent");

        let req = SendMessageRequest::text("hi");
        assert!(transport.send_message(&req).await.is_err());

        let events: Vec<StreamItem> = transport.send_streaming_message(&req).collect().await;
        assert!(events.is_empty());

        let err = transport.get_task(&TaskId::from("t-1")).await.unwrap_err();
        assert_eq!(err.to_string(), "task t-1 not found");
    }

    #[test]
    fn endpoint_drops_empty_token() {
        let ep = Endpoint::new("http://x").with_token(Some(String::new()));
        assert_eq!(ep.token, None);
        let ep = Endpoint::new("http://x").with_token(Some("abc".into()));
        assert_eq!(ep.token.as_deref(), Some("abc"));
    }
}
