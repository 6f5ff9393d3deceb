mod client;
mod config;
mod config_cmd;
mod describe_cmd;
mod replay_cmd;
mod resume_cmd;
mod send_cmd;
mod status_cmd;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::builder::styling::{AnsiColor, Styles};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use a2acli_core::protocol::TaskId;
use a2acli_core::render::raw::write_error;

use client::Invocation;
use config::{Flags, ResolvedConfig};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Blue.on_default().bold())
        .usage(AnsiColor::Blue.on_default().bold())
        .literal(AnsiColor::White.on_default().bold())
        .placeholder(AnsiColor::BrightBlack.on_default())
        .error(AnsiColor::Red.on_default().bold())
        .valid(AnsiColor::Green.on_default().bold())
        .invalid(AnsiColor::Yellow.on_default().bold())
}

#[derive(Parser)]
#[command(name = "a2acli", about = "A2A CLI Client", version, styles = styles())]
struct Cli {
    /// Base URL of the A2A service
    #[arg(short = 'u', long, global = true)]
    service_url: Option<String>,

    /// Auth token
    #[arg(short = 't', long, global = true)]
    token: Option<String>,

    /// Existing Task ID to continue (must be non-terminal)
    #[arg(short = 'k', long, global = true)]
    task: Option<String>,

    /// Task ID to reference as context (works for completed tasks)
    #[arg(short = 'r', long = "ref", global = true)]
    reference: Option<String>,

    /// Force a protocol binding: grpc, json-rpc or http+json
    #[arg(long, global = true)]
    transport: Option<String>,

    /// Named environment from the config file
    #[arg(short = 'e', long, global = true)]
    env: Option<String>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable the Terminal UI (useful for scripting and CI)
    #[arg(long, global = true)]
    no_tui: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe the agent card
    Describe,
    /// Send a message and stream the task it starts
    #[command(visible_alias = "invoke")]
    Send {
        /// Message text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
        /// Skill ID
        #[arg(short = 's', long)]
        skill: Option<String>,
        /// Directory to save artifacts to
        #[arg(short = 'o', long)]
        out_dir: Option<PathBuf>,
        /// File name to save artifacts as
        #[arg(long)]
        file: Option<String>,
        /// Path to a file with supplemental instructions
        #[arg(short = 'f', long)]
        instruction_file: Option<PathBuf>,
        /// Wait for the final task instead of streaming
        #[arg(long)]
        wait: bool,
    },
    /// Resume listening to an existing task
    Resume {
        task_id: String,
        /// Directory to save artifacts to
        #[arg(short = 'o', long)]
        out_dir: Option<PathBuf>,
        /// File name to save artifacts as
        #[arg(long)]
        file: Option<String>,
    },
    /// Get the status of a task
    Status { task_id: String },
    /// Render a recorded event capture (path or `-` for stdin)
    Replay {
        source: String,
        /// Directory to save artifacts to
        #[arg(short = 'o', long)]
        out_dir: Option<PathBuf>,
        /// File name to save artifacts as
        #[arg(long)]
        file: Option<String>,
    },
    /// Show the effective configuration
    Config,
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

/// Log to stderr. The filter comes from `A2ACLI_LOG`, then `RUST_LOG`;
/// without either, interactive sessions log nothing so the view stays intact.
fn init_tracing(interactive: bool) {
    let default = if interactive { "off" } else { "warn" };
    let filter = EnvFilter::try_from_env("A2ACLI_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, interactive: bool) -> Result<i32> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "a2acli", &mut std::io::stdout());
        return Ok(0);
    }

    let config = ResolvedConfig::resolve(&Flags {
        service_url: cli.service_url,
        token: cli.token,
        transport: cli.transport,
        env: cli.env,
        config: cli.config,
    })?;
    tracing::debug!(env = %config.env_name, url = %config.service_url, "configuration resolved");

    let inv = Invocation {
        config,
        interactive,
        continue_task: cli.task.filter(|t| !t.is_empty()).map(TaskId::from),
        reference_task: cli.reference.filter(|t| !t.is_empty()).map(TaskId::from),
    };

    match cli.command {
        Commands::Describe => {
            describe_cmd::run_describe(&inv).await?;
            Ok(0)
        }
        Commands::Send {
            message,
            skill,
            out_dir,
            file,
            instruction_file,
            wait,
        } => {
            let args = send_cmd::SendArgs {
                message,
                skill,
                out_dir,
                file,
                instruction_file,
                wait,
            };
            send_cmd::run_send(&inv, args).await
        }
        Commands::Resume {
            task_id,
            out_dir,
            file,
        } => resume_cmd::run_resume(&inv, TaskId::from(task_id), out_dir, file).await,
        Commands::Status { task_id } => {
            status_cmd::run_status(&inv, TaskId::from(task_id)).await?;
            Ok(0)
        }
        Commands::Replay {
            source,
            out_dir,
            file,
        } => replay_cmd::run_replay(&inv, &source, out_dir, file).await,
        Commands::Config => {
            config_cmd::write_config(&mut std::io::stdout().lock(), &inv.config)?;
            Ok(0)
        }
        Commands::Completions { .. } => Ok(0),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let interactive = !config::tui_disabled(cli.no_tui);
    init_tracing(interactive);

    let code = match run(cli, interactive).await {
        Ok(code) => code,
        Err(e) => {
            if interactive {
                eprintln!("Error: {e:#}");
            } else {
                if let Err(io_err) = write_error(&mut std::io::stderr(), &format!("{e:#}")) {
                    tracing::warn!(error = %io_err, "failed to write error line");
                }
            }
            1
        }
    };
    if code != 0 {
        std::process::exit(code);
    }
}
