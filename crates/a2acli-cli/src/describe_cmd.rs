//! `a2acli describe` command: show the agent card.

use std::io::Write;

use anyhow::Result;

use a2acli_core::protocol::AgentCard;

use crate::client::Invocation;

/// Run the describe command.
pub async fn run_describe(inv: &Invocation) -> Result<()> {
    let card = inv.card().await?;
    let mut out = std::io::stdout().lock();
    if inv.interactive {
        write_card(&mut out, &card)?;
    } else {
        writeln!(out, "{}", serde_json::to_string_pretty(&card)?)?;
    }
    Ok(())
}

/// Human-readable card summary.
pub fn write_card<W: Write>(out: &mut W, card: &AgentCard) -> std::io::Result<()> {
    writeln!(out, "Agent: {}", card.name)?;
    if !card.description.is_empty() {
        writeln!(out, "Description: {}", card.description)?;
    }

    let bindings = card.advertised_bindings();
    if !bindings.is_empty() {
        writeln!(out, "Supported Bindings: {}", bindings.join(", "))?;
    }
    writeln!(out, "Capabilities: [Streaming: {}]", card.capabilities.streaming)?;

    writeln!(out, "\nSkills:")?;
    for skill in &card.skills {
        writeln!(out, "  - [{}] {}", skill.id, skill.name)?;
        if !skill.description.is_empty() {
            writeln!(out, "    Description: {}", skill.description)?;
        }
        let schemes = skill.security_schemes();
        if !schemes.is_empty() {
            writeln!(out, "    Security: {}", schemes.join(", "))?;
        }
    }
    Ok(())
}
