//! `a2acli resume` command: show a finished task or re-attach to a running one.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use a2acli_core::StreamRequest;
use a2acli_core::artifact::ArtifactDestination;
use a2acli_core::protocol::TaskId;
use a2acli_core::render::{write_summary, write_task_json};

use crate::client::Invocation;

const STORE_HINT: &str =
    "If you are using the default in-memory store, restarting the server wipes all tasks.";

/// Run the resume command and return the process exit code.
pub async fn run_resume(
    inv: &Invocation,
    task_id: TaskId,
    out_dir: Option<PathBuf>,
    file: Option<String>,
) -> Result<i32> {
    let session = inv.connect(ArtifactDestination::new(out_dir, file)).await?;

    if inv.interactive {
        println!("Resuming Task {task_id} ...\n");
    }

    let task = match session.fetch(&task_id).await {
        Ok(task) => task,
        Err(e) => {
            tracing::debug!(%task_id, error = %e, "failed to fetch task");
            if inv.interactive {
                println!("Error: {e}");
                println!("Hint: {STORE_HINT}");
            } else {
                let mut err = std::io::stderr().lock();
                writeln!(
                    err,
                    "{}",
                    serde_json::json!({ "error": e.to_string(), "hint": STORE_HINT })
                )?;
            }
            return Ok(1);
        }
    };

    if task.phase().is_terminal() {
        let mut sink = session.sink();
        let mut out = std::io::stdout().lock();
        if inv.interactive {
            write_summary(&mut out, &task, &mut sink)?;
        } else {
            write_task_json(&mut out, &task, &mut sink)?;
        }
        return Ok(0);
    }

    if inv.interactive {
        println!("Task is active. Connecting to stream...");
    }
    let report = inv.stream(&session, StreamRequest::Subscribe(task_id)).await;
    Ok(report.exit_code())
}
