//! Configuration file management for a2acli.
//!
//! Provides a TOML-based config file at `~/.config/a2acli/config.toml` with
//! named environments, and a resolution chain: CLI flag > env var > config
//! file > default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Used when no flag, variable or config entry names a service.
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:9001";

/// Environment selected when nothing else names one.
pub const DEFAULT_ENV: &str = "default";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_env: Option<String>,
    #[serde(default)]
    pub envs: BTreeMap<String, EnvSection>,
}

/// Settings for one named target environment.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Forced protocol binding for this environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the a2acli config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/a2acli` or `~/.config/a2acli`,
/// also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg).join("a2acli");
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("a2acli")
}

/// Return the default path to the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read
// -----------------------------------------------------------------------

/// Load and parse the config file. A missing file is `Ok(None)`; an
/// unreadable or malformed one is an error.
pub fn load_config(path: &Path) -> Result<Option<ConfigFile>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Flags {
    pub service_url: Option<String>,
    pub token: Option<String>,
    pub transport: Option<String>,
    pub env: Option<String>,
    pub config: Option<PathBuf>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub config_path: PathBuf,
    /// Whether a config file was actually read.
    pub config_found: bool,
    pub env_name: String,
    pub service_url: String,
    pub token: Option<String>,
    pub transport: Option<String>,
}

impl ResolvedConfig {
    /// Resolve configuration from flags, process environment and the config
    /// file.
    pub fn resolve(flags: &Flags) -> Result<Self> {
        let path = flags.config.clone().unwrap_or_else(config_path);
        let file = load_config(&path)?;
        Self::resolve_with(flags, path, file, |key| std::env::var(key).ok())
    }

    /// Resolution with the environment lookup injected.
    ///
    /// - Env name: `--env` > `A2ACLI_ENV` > `default_env` > `default`
    /// - Service URL: `--service-url` > `A2ACLI_SERVICE_URL` > env section > default
    /// - Token: `--token` > `A2ACLI_TOKEN` > env section > none
    /// - Transport: `--transport` > `A2ACLI_TRANSPORT` > env section > negotiated
    pub fn resolve_with(
        flags: &Flags,
        config_path: PathBuf,
        file: Option<ConfigFile>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let var = |key: &str| var(key).filter(|v| !v.is_empty());
        let flag = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        let config_found = file.is_some();
        let file = file.unwrap_or_default();

        let explicit_env = flag(&flags.env).or_else(|| var("A2ACLI_ENV"));
        let env_name = explicit_env
            .clone()
            .or_else(|| file.default_env.clone().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| DEFAULT_ENV.to_string());

        let section = match file.envs.get(&env_name) {
            Some(section) => section.clone(),
            None if explicit_env.is_some() && config_found => {
                bail!(
                    "environment {env_name:?} not found in {}",
                    config_path.display()
                );
            }
            None => EnvSection::default(),
        };

        let service_url = flag(&flags.service_url)
            .or_else(|| var("A2ACLI_SERVICE_URL"))
            .or(section.service_url)
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());
        let token = flag(&flags.token)
            .or_else(|| var("A2ACLI_TOKEN"))
            .or(section.token)
            .filter(|t| !t.is_empty());
        let transport = flag(&flags.transport)
            .or_else(|| var("A2ACLI_TRANSPORT"))
            .or(section.transport)
            .filter(|t| !t.is_empty());

        Ok(Self {
            config_path,
            config_found,
            env_name,
            service_url,
            token,
            transport,
        })
    }
}

/// Whether the interactive view must be skipped.
///
/// Disabled by `--no-tui`, `A2ACLI_NO_TUI=true` or any non-empty `NO_COLOR`.
pub fn tui_disabled(flag: bool) -> bool {
    tui_disabled_with(flag, |key| std::env::var(key).ok())
}

fn tui_disabled_with(flag: bool, var: impl Fn(&str) -> Option<String>) -> bool {
    flag
        || var("A2ACLI_NO_TUI").is_some_and(|v| v.eq_ignore_ascii_case("true"))
        || var("NO_COLOR").is_some_and(|v| !v.is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
