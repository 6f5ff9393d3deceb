//! `a2acli replay` command: render a recorded event capture.
//!
//! The input is the NDJSON that `--no-tui` writes to stdout, so
//! `a2acli --no-tui send ... > run.jsonl` can later be replayed with
//! `a2acli replay run.jsonl` (or piped in with `-`).

use std::path::PathBuf;

use anyhow::Result;

use a2acli_core::artifact::ArtifactDestination;
use a2acli_core::transport::{JsonlSource, JsonlTransport};
use a2acli_core::{Session, StreamRequest};

use crate::client::Invocation;

/// Run the replay command and return the process exit code.
pub async fn run_replay(
    inv: &Invocation,
    source: &str,
    out_dir: Option<PathBuf>,
    file: Option<String>,
) -> Result<i32> {
    let source = JsonlSource::parse(source);
    tracing::info!(%source, "replaying event capture");

    let session = Session::with_transport(
        Box::new(JsonlTransport::new(source)),
        inv.options(ArtifactDestination::new(out_dir, file)),
    );
    let request = StreamRequest::Send(session.request(String::new()));
    let report = inv.stream(&session, request).await;
    Ok(report.exit_code())
}
