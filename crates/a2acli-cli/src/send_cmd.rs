//! `a2acli send` command: send a message and follow the task it starts.

use std::path::PathBuf;

use anyhow::{Context, Result};

use a2acli_core::StreamRequest;
use a2acli_core::artifact::ArtifactDestination;
use a2acli_core::render::{write_summary, write_task_json};

use crate::client::Invocation;

/// Arguments of the send command.
#[derive(Debug, Clone, Default)]
pub struct SendArgs {
    pub message: Vec<String>,
    pub skill: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub file: Option<String>,
    pub instruction_file: Option<PathBuf>,
    pub wait: bool,
}

/// Run the send command and return the process exit code.
pub async fn run_send(inv: &Invocation, args: SendArgs) -> Result<i32> {
    let mut text = args.message.join(" ");
    if let Some(path) = &args.instruction_file {
        let instructions = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read instruction file {}", path.display()))?;
        text = with_instructions(&text, &instructions);
    }

    let session = inv
        .connect(ArtifactDestination::new(args.out_dir, args.file))
        .await?;

    let mut request = session.request(text);
    if let Some(skill) = args.skill {
        request = request.skill(skill);
    }

    if inv.interactive {
        if let Some(id) = &inv.continue_task {
            println!("Continuing Task: {id}");
        }
        if let Some(id) = &inv.reference_task {
            println!("Referencing Task: {id}");
        }
    }

    if args.wait || !session.supports_streaming() {
        tracing::info!(wait = args.wait, "sending without streaming");
        let task = session.send_blocking(&request).await?;
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
        println!("Invoking A2A Service (Streaming)...\n");
    }
    let report = inv.stream(&session, StreamRequest::Send(request)).await;
    Ok(report.exit_code())
}

/// Append the contents of an instruction file to the message text.
pub fn with_instructions(message: &str, instructions: &str) -> String {
    format!("{message}\n\nSupplemental Instructions:\n{instructions}")
}
