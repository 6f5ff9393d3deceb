//! Wiring shared by the commands: resolved settings, the client factory and
//! renderer selection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use a2acli_core::artifact::ArtifactDestination;
use a2acli_core::negotiate;
use a2acli_core::protocol::{AgentCard, TaskId};
use a2acli_core::render::RawRenderer;
use a2acli_core::transport::{ClientFactory, Endpoint};
use a2acli_core::{Session, SessionOptions, SessionReport, StreamRequest};

use crate::config::ResolvedConfig;
use crate::tui::TuiRenderer;

/// Settings every command works from.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub config: ResolvedConfig,
    pub interactive: bool,
    pub continue_task: Option<TaskId>,
    pub reference_task: Option<TaskId>,
}

impl Invocation {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.config.service_url.clone()).with_token(self.config.token.clone())
    }

    pub fn options(&self, destination: ArtifactDestination) -> SessionOptions {
        SessionOptions {
            endpoint: self.endpoint(),
            transport: self.config.transport.clone(),
            destination,
            continue_task: self.continue_task.clone(),
            reference_task: self.reference_task.clone(),
            interactive: self.interactive,
        }
    }

    /// Resolve, negotiate and connect.
    pub async fn connect(&self, destination: ArtifactDestination) -> Result<Session> {
        let factory = client_factory();
        let session = Session::connect(&factory, self.options(destination)).await?;
        Ok(session)
    }

    /// Fetch the agent card without connecting. A bad transport override
    /// is still rejected before anything is fetched.
    pub async fn card(&self) -> Result<AgentCard> {
        negotiate::parse_override(self.config.transport.as_deref())?;
        let card = client_factory().resolve_card(&self.endpoint()).await?;
        Ok(card)
    }

    /// Stream `request` with the renderer matching the output mode.
    pub async fn stream(&self, session: &Session, request: StreamRequest) -> SessionReport {
        if self.interactive {
            session.stream(request, &mut TuiRenderer).await
        } else {
            let mut renderer = RawRenderer::stdio(interrupt_on_ctrl_c());
            session.stream(request, &mut renderer).await
        }
    }
}

/// The connectors linked into this binary.
///
/// Wire protocol bindings are provided by separate crates that register a
/// [`Connector`](a2acli_core::transport::Connector) and a
/// [`CardResolver`](a2acli_core::transport::CardResolver) here. None are
/// linked by default, so remote commands fail with a transport error; the
/// `replay` command works without them.
pub fn client_factory() -> ClientFactory {
    let factory = ClientFactory::new();
    debug!(connectors = ?factory.bindings(), "client factory ready");
    factory
}

/// Cancel the returned token on the first ctrl-c; exit with 130 on the
/// second.
pub fn interrupt_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let got_first_signal = Arc::new(AtomicBool::new(false));

    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            if got_first_signal.swap(true, Ordering::SeqCst) {
                std::process::exit(130);
            }
            debug!("interrupt received");
            cancel_clone.cancel();
        }
    });

    cancel
}
