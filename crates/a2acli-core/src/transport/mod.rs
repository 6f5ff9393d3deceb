//! Transport interface and client factory.
//!
//! ```text
//! ClientFactory
//!     |  connect(endpoint, forced)
//!     |     1. validate forced binding      (no network)
//!     |     2. CardResolver::resolve         -> AgentCard
//!     |     3. negotiate(card bindings)      -> Binding
//!     |     4. Connector::connect            -> Box<dyn Transport>
//!     v
//! Connection { card, binding, transport }
//!     |
//!     |   send_streaming_message / subscribe_to_task --> EventStream
//!     |   send_message / get_task
//! ```

pub mod jsonl;
pub mod registry;
pub mod trait_def;

pub use jsonl::{JsonlSource, JsonlTransport};
pub use registry::{ClientFactory, Connection};
pub use trait_def::{CardResolver, Connector, Endpoint, EventStream, StreamItem, Transport};

use crate::negotiate::Binding;
use crate::protocol::TaskId;

/// Failures surfaced by a transport or by the factory wiring one up.
///
/// The session treats every variant the same way: a stream/terminal error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no agent card resolver is configured")]
    NoResolver,

    #[error("no connector linked for binding {0}")]
    NoConnector(Binding),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("{operation} is not supported by this transport")]
    Unsupported { operation: &'static str },

    #[error("malformed event on line {line}: {message}")]
    Decode { line: usize, message: String },

    #[error("remote error: {0}")]
    Remote(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
