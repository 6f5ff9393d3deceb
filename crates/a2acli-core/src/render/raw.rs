//! Line-oriented machine output.
//!
//! Every event becomes one JSON line on the output writer. A stream error
//! becomes a single `{"error": "..."}` line on the error writer and ends the
//! session. Artifacts are still saved, but saves are not echoed.

use std::io::{self, Write};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::projection::Projector;
use crate::stream::EventPump;

use super::{Renderer, SessionOutcome, SessionReport};

/// NDJSON renderer over arbitrary writers.
#[derive(Debug)]
pub struct RawRenderer<O, E> {
    out: O,
    err: E,
    interrupt: CancellationToken,
}

impl RawRenderer<io::Stdout, io::Stderr> {
    /// Render to the process's standard streams.
    pub fn stdio(interrupt: CancellationToken) -> Self {
        Self::new(io::stdout(), io::stderr(), interrupt)
    }
}

impl<O, E> RawRenderer<O, E>
where
    O: Write + Send,
    E: Write + Send,
{
    /// `interrupt` stops the session early with [`SessionOutcome::Interrupted`].
    pub fn new(out: O, err: E, interrupt: CancellationToken) -> Self {
        Self {
            out,
            err,
            interrupt,
        }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn emit(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }

    fn report(&mut self, message: &str) {
        if let Err(e) = write_error(&mut self.err, message) {
            warn!(error = %e, "failed to write error line");
        }
    }
}

/// Write one structured error object.
pub fn write_error<W: Write>(err: &mut W, message: &str) -> io::Result<()> {
    writeln!(err, "{}", serde_json::json!({ "error": message }))?;
    err.flush()
}

#[async_trait]
impl<O, E> Renderer for RawRenderer<O, E>
where
    O: Write + Send,
    E: Write + Send,
{
    async fn render(&mut self, mut pump: EventPump, mut projector: Projector) -> SessionReport {
        let outcome = loop {
            let item = tokio::select! {
                biased;
                _ = self.interrupt.cancelled() => {
                    debug!("raw session interrupted");
                    pump.cancel();
                    break SessionOutcome::Interrupted;
                }
                item = pump.recv() => item,
            };

            match item {
                None => break SessionOutcome::Completed,
                Some(Ok(event)) => {
                    match serde_json::to_string(&event) {
                        Ok(line) => {
                            if let Err(e) = self.emit(&line) {
                                warn!(error = %e, "output closed, stopping");
                                pump.cancel();
                                let message = format!("failed to write output: {e}");
                                self.report(&message);
                                break SessionOutcome::Failed(message);
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to encode event");
                            self.report("failed to encode event to json");
                        }
                    }
                    projector.apply(&event);
                }
                Some(Err(e)) => {
                    let message = e.to_string();
                    projector.fail(message.clone());
                    self.report(&message);
                    break SessionOutcome::Failed(message);
                }
            }
        };

        SessionReport {
            outcome,
            projection: projector.into_state(),
        }
    }
}
