//! PID file handling for single-instance enforcement.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::ServerError;

/// Write the current process PID to the PID file.
pub fn write_pid_file(path: &Path) -> Result<(), ServerError> {
    let pid = std::process::id();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{}\n", pid))?;
    debug!(event = "server.pid.write_completed", pid = pid, path = %path.display());
    Ok(())
}

/// Read the PID from the PID file. Returns `None` if the file doesn't
/// exist or contains invalid content.
pub fn read_pid_file(path: &Path) -> Option<u32> {
    let content = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(
                event = "server.pid.read_failed",
                path = %path.display(),
                error = %e,
            );
            return None;
        }
    };
    match content.trim().parse::<u32>() {
        Ok(pid) => Some(pid),
        Err(_) => {
            warn!(
                event = "server.pid.parse_failed",
                path = %path.display(),
                content = %content.trim(),
            );
            None
        }
    }
}

/// Check whether a process with the given PID is alive.
///
/// Uses `kill(pid, 0)` which checks existence without sending a signal.
pub fn is_process_alive(pid: u32) -> bool {
    use nix::sys::signal;
    use nix::unistd::Pid;

    match signal::kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        // EPERM means process exists but we lack permission — still alive
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Check whether another server instance is alive per the PID file.
///
/// If the PID file exists but the process is dead, the stale file is
/// removed and `None` is returned.
pub fn check_running(path: &Path) -> Option<u32> {
    let pid = read_pid_file(path)?;
    if is_process_alive(pid) {
        Some(pid)
    } else {
        debug!(event = "server.pid.stale_file", pid = pid);
        remove_pid_file(path);
        None
    }
}

/// Remove the PID file. Best-effort.
pub fn remove_pid_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(event = "server.pid.remove_completed", path = %path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            event = "server.pid.remove_failed",
            path = %path.display(),
            error = %e,
        ),
    }
}
