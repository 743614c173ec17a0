pub mod connection;
pub mod shutdown;

use std::sync::Arc;
use std::time::{Duration, Instant};

use aviary_core::{Engine, EngineConfig, LogTailer, SystemClock, UuidIds};
use aviary_paths::TeamsDir;
use aviary_teams::{Debouncer, TeamStore, TeamWatcher};
use tokio::net::UnixListener;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::errors::ServerError;
use crate::pid;
use crate::state::AppState;

/// Run the daemon.
///
/// This is the main entrypoint. It:
/// 1. Checks for an existing instance (PID file)
/// 2. Writes a PID file
/// 3. Binds the Unix socket
/// 4. Spawns the watch loop (event log tail + team directory reconciliation)
/// 5. Accepts subscriber connections in a loop
/// 6. Handles graceful shutdown on SIGTERM/SIGINT
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let socket_path = config.socket_path.clone();
    let pid_path = config.pid_path.clone();

    // Check if another instance is already running
    if let Some(existing_pid) = pid::check_running(&pid_path) {
        return Err(ServerError::AlreadyRunning(existing_pid));
    }

    pid::write_pid_file(&pid_path)?;

    // Clean up stale socket file
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }

    // Ensure socket directory exists
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let listener = UnixListener::bind(&socket_path)?;

    info!(
        event = "server.started",
        pid = std::process::id(),
        socket = %socket_path.display(),
        log = %config.event_log.display(),
        teams = %config.teams_dir.display(),
    );

    let engine = Engine::new(
        EngineConfig {
            hold_ms: config.status_hold_ms,
            events_capacity: config.events_capacity,
            messages_capacity: config.messages_capacity,
        },
        Arc::new(SystemClock),
        Box::new(UuidIds),
    );
    let teams = TeamStore::new(TeamsDir::new(config.teams_dir.clone()));
    let state = Arc::new(RwLock::new(AppState::new(
        engine,
        teams,
        config.snapshot_events,
    )));

    let shutdown = CancellationToken::new();

    // Spawn signal handler
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown::wait_for_shutdown_signal(signal_shutdown).await;
    });

    // Spawn the watch loop
    tokio::spawn(watch_loop(state.clone(), config.clone(), shutdown.clone()));

    // Accept loop
    loop {
        tokio::select! {
            accept = listener.accept() => {
                match accept {
                    Ok((stream, _addr)) => {
                        tokio::spawn(connection::handle_connection(
                            stream,
                            state.clone(),
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        warn!(event = "server.accept_failed", error = %e);
                    }
                }
            }
            _ = shutdown.cancelled() => {
                break;
            }
        }
    }

    info!(event = "server.stopping");
    if let Err(e) = std::fs::remove_file(&socket_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(event = "server.socket_cleanup_failed", error = %e);
        }
    }
    pid::remove_pid_file(&pid_path);
    info!(event = "server.stopped");
    Ok(())
}

/// The directory-triggered reconciliation loop.
///
/// One tick drains pending work, takes the state lock once per batch, and
/// applies results atomically. The log tailer's offset guard makes no-op
/// ticks a single stat call.
async fn watch_loop(
    state: Arc<RwLock<AppState>>,
    config: ServerConfig,
    shutdown: CancellationToken,
) {
    let mut tailer = LogTailer::new(&config.event_log);
    if !config.replay_log {
        let offset = tailer.skip_to_end();
        info!(event = "server.watch.log_skipped_to_end", offset = offset);
    }

    let mut watcher = TeamWatcher::new(&config.teams_dir);
    let mut debouncer = Debouncer::new(Duration::from_millis(config.debounce_ms));

    // Initial team scan so the first snapshot carries existing teams.
    {
        let mut state = state.write().await;
        let deltas = state.teams.scan();
        state.apply_team_deltas(deltas);
    }

    let mut interval = tokio::time::interval(Duration::from_millis(config.poll_interval_ms));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        // Event log growth
        let events = tailer.poll();
        if !events.is_empty() {
            let mut state = state.write().await;
            for event in &events {
                state.apply_raw_event(event);
            }
        }

        // The teams dir may appear after startup; re-check opportunistically.
        if watcher.is_none() {
            watcher = TeamWatcher::new(&config.teams_dir);
            if watcher.is_some() {
                let mut state = state.write().await;
                let deltas = state.teams.scan();
                state.apply_team_deltas(deltas);
            }
        }

        if let Some(watcher) = &watcher {
            let now = Instant::now();
            for path in watcher.drain_changed_paths() {
                debouncer.notify(path, now);
            }
        }

        let due = debouncer.drain_due(Instant::now());
        if !due.is_empty() {
            let mut state = state.write().await;
            for path in due {
                let Some(team) = state.teams.team_name_for_path(&path) else {
                    continue;
                };
                let deltas = state.teams.reconcile_team(&team);
                state.apply_team_deltas(deltas);
            }
        }
    }

    info!(event = "server.watch.stopped");
}
