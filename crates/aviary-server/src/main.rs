use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

/// Aviary daemon: watches agent hook events and team directories, pushes
/// live state to subscribers over a Unix socket.
#[derive(Debug, Parser)]
#[command(name = "aviary-server", version, about)]
struct Cli {
    /// Unix socket path (overrides config).
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Hook-event log file to tail (overrides config).
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Teams directory root (overrides config).
    #[arg(long)]
    teams_dir: Option<PathBuf>,

    /// Replay the whole event log at startup instead of skipping to the end.
    #[arg(long)]
    replay_log: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    info!(event = "server.main.start_started");

    let exit_code = match run() {
        Ok(()) => {
            info!(event = "server.main.start_completed");
            0
        }
        Err(e) => {
            error!(event = "server.main.start_failed", error = %e);
            eprintln!("aviary-server: {}", e);
            1
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = aviary_server::load_server_config()?;
    if let Some(socket) = cli.socket {
        config.socket_path = socket;
    }
    if let Some(log_file) = cli.log_file {
        config.event_log = log_file;
    }
    if let Some(teams_dir) = cli.teams_dir {
        config.teams_dir = teams_dir;
    }
    if cli.replay_log {
        config.replay_log = true;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async { aviary_server::run_server(config).await })?;
    Ok(())
}
