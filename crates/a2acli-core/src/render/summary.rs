//! One-shot rendering of a fetched task.

use std::io::{self, Write};

use crate::artifact::ArtifactSink;
use crate::projection::PreviewPolicy;
use crate::protocol::Task;

const RULE: &str = "------------------------------";

/// Human-readable summary of a task with artifact previews.
///
/// Artifacts are saved through `sink` when it has a destination; a save
/// failure is reported inline and does not abort the summary.
pub fn write_summary<W: Write>(out: &mut W, task: &Task, sink: &mut ArtifactSink) -> io::Result<()> {
    writeln!(out, "Task Status: [{}]", task.status.state)?;

    if task.artifacts.is_empty() {
        writeln!(out, "No artifacts produced.")?;
        return Ok(());
    }

    writeln!(out, "\n--- {} ARTIFACT(S) AVAILABLE ---", task.artifacts.len())?;

    let policy = PreviewPolicy::SUMMARY;
    for artifact in &task.artifacts {
        writeln!(out, "\nName: {}", artifact.name)?;
        writeln!(
            out,
            "Description: {}",
            artifact.description.as_deref().unwrap_or_default()
        )?;

        let mut truncated = false;
        for part in &artifact.parts {
            let preview = policy.render(part);
            truncated |= preview.truncated;
            writeln!(out, "{preview}")?;
        }

        if sink.is_configured() {
            match sink.write(artifact) {
                Ok(record) => writeln!(out, ">> Saved to: {}", record.path.display())?,
                Err(e) => writeln!(out, "Error saving artifact: {e}")?,
            }
        } else if truncated {
            writeln!(out, "(Hint: Use --out-dir <path> to save the full artifact content)")?;
        }
    }

    writeln!(out, "\n{RULE}")
}

/// Machine-readable form: the task as indented JSON. Artifacts are saved
/// silently when `sink` has a destination.
pub fn write_task_json<W: Write>(out: &mut W, task: &Task, sink: &mut ArtifactSink) -> io::Result<()> {
    let json = serde_json::to_string_pretty(task).map_err(io::Error::other)?;
    writeln!(out, "{json}")?;

    if sink.is_configured() {
        for artifact in &task.artifacts {
            if let Err(e) = sink.write(artifact) {
                tracing::warn!(artifact = %artifact.name, error = %e, "failed to save artifact");
            }
        }
    }
    Ok(())
}
