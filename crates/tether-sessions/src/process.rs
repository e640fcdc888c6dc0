//! Best-effort termination of session-bound OS processes.

use tether_core::session::TrackedProcess;

/// Outcome of a single termination attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Signalled,
    AlreadyGone,
    Failed,
}

#[cfg(unix)]
pub fn terminate(pid: u32) -> Termination {
    // 0 and negative pids address process groups.
    let Ok(raw) = i32::try_from(pid) else {
        return Termination::Failed;
    };
    if raw <= 0 {
        return Termination::Failed;
    }

    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(raw, libc::SIGTERM) };
    if rc == 0 {
        return Termination::Signalled;
    }
    match std::io::Error::last_os_error().raw_os_error() {
        Some(libc::ESRCH) => Termination::AlreadyGone,
        _ => Termination::Failed,
    }
}

#[cfg(not(unix))]
pub fn terminate(pid: u32) -> Termination {
    tracing::debug!(pid, "Process termination unsupported on this platform");
    Termination::Failed
}

/// Terminate every tracked process, logging failures. Never errors.
pub fn terminate_all(session_id: &str, processes: &[TrackedProcess]) {
    for process in processes {
        match terminate(process.pid) {
            Termination::Signalled => {
                tracing::debug!(session_id, pid = process.pid, label = %process.label, "Sent SIGTERM");
            }
            Termination::AlreadyGone => {
                tracing::debug!(session_id, pid = process.pid, "Process already exited");
            }
            Termination::Failed => {
                tracing::warn!(session_id, pid = process.pid, label = %process.label, "Failed to terminate process");
            }
        }
    }
}
