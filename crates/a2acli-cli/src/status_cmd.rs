//! `a2acli status` command: print a task snapshot.

use std::io::Write;

use anyhow::{Context, Result};

use a2acli_core::artifact::ArtifactDestination;
use a2acli_core::protocol::{Task, TaskId};

use crate::client::Invocation;

/// Run the status command.
pub async fn run_status(inv: &Invocation, task_id: TaskId) -> Result<()> {
    let session = inv.connect(ArtifactDestination::default()).await?;
    let task = session
        .fetch(&task_id)
        .await
        .with_context(|| format!("failed to retrieve task {task_id}"))?;

    let mut out = std::io::stdout().lock();
    if inv.interactive {
        write_status(&mut out, &task)?;
    } else {
        writeln!(out, "{}", serde_json::to_string_pretty(&task)?)?;
    }
    Ok(())
}

/// Human-readable task status.
pub fn write_status<W: Write>(out: &mut W, task: &Task) -> std::io::Result<()> {
    writeln!(out, "Task ID: {}", task.id)?;
    writeln!(out, "Status:  {}", task.phase())?;
    if let Some(message) = &task.status.message {
        for text in message.texts() {
            writeln!(out, "Message: {text}")?;
        }
    }
    writeln!(out, "Artifacts: {}", task.artifacts.len())?;

    if !task.metadata.is_empty() {
        writeln!(out, "\nMetadata:")?;
        for (key, value) in &task.metadata {
            writeln!(out, "  {key}: {value}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2acli_core::protocol::{Artifact, Message, Part, Phase, Role};

    #[test]
    fn status_lists_message_and_counts() {
        let mut task = Task::new("t-42", Phase::InputRequired);
        task.status.message = Some(Message::new(
            Role::Agent,
            vec![Part::text("which date?"), Part::text("reply with --task")],
        ));
        task.artifacts.push(Artifact::new("draft.txt", vec![Part::text("x")]));
        task.metadata
            .insert("owner".to_string(), serde_json::Value::String("ops".into()));

        let mut out = Vec::new();
        write_status(&mut out, &task).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "Task ID: t-42\n\
             Status:  INPUT_REQUIRED\n\
             Message: which date?\n\
             Message: reply with --task\n\
             Artifacts: 1\n\
             \n\
             Metadata:\n  owner: \"ops\"\n"
        );
    }
}
