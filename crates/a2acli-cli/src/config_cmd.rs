//! `a2acli config` command: show the effective configuration.

use std::io::Write;

use crate::config::ResolvedConfig;

/// Print where settings came from and what they resolved to.
pub fn write_config<W: Write>(out: &mut W, cfg: &ResolvedConfig) -> std::io::Result<()> {
    let file = if cfg.config_found {
        cfg.config_path.display().to_string()
    } else {
        format!("{} (not found)", cfg.config_path.display())
    };
    writeln!(out, "Config File Used:   {file}")?;
    writeln!(out, "Active Environment: {}", cfg.env_name)?;
    writeln!(out, "Service URL:        {}", cfg.service_url)?;
    writeln!(
        out,
        "Auth Token:         {}",
        if cfg.token.is_some() { "<set>" } else { "<none>" }
    )?;
    if let Some(transport) = &cfg.transport {
        writeln!(out, "Transport:          {transport}")?;
    }
    Ok(())
}
