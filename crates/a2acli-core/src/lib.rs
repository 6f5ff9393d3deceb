//! Streaming event projection and task lifecycle engine for the `a2acli`
//! command-line client.
//!
//! ```text
//! negotiate ──► transport ──► stream ──► projection ──► render
//!                                           │
//!                                           └──► artifact
//! ```

pub mod artifact;
pub mod negotiate;
pub mod projection;
pub mod protocol;
pub mod render;
pub mod session;
pub mod stream;
pub mod transport;

pub use render::{Renderer, SessionOutcome, SessionReport};
pub use session::{Session, SessionError, SessionOptions, StreamRequest};
