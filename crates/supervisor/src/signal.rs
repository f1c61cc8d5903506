//! Process liveness checks and termination signals.

use std::io;

/// Whether a process with `pid` exists and has not exited.
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: signal 0 performs only the existence and permission check.
    let rc = unsafe { libc::kill(pid, 0) };
    let exists = rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM);
    exists && !is_zombie(pid)
}

#[cfg(not(unix))]
pub fn is_alive(_pid: u32) -> bool {
    false
}

/// Send SIGTERM to `pid`.
#[cfg(unix)]
pub fn terminate(pid: u32) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: plain syscall with a validated pid.
    if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub fn terminate(_pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "signals are not supported on this platform",
    ))
}

/// Fields of `/proc/<pid>/stat` after the parenthesised command name,
/// starting with the state (field 3).
#[cfg(target_os = "linux")]
fn stat_fields(pid: u32) -> Option<Vec<String>> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    let rest = &stat[stat.rfind(')')? + 1..];
    Some(rest.split_whitespace().map(str::to_owned).collect())
}

/// Exited children that nobody reaped yet still answer `kill(pid, 0)`.
#[cfg(target_os = "linux")]
fn is_zombie(pid: libc::pid_t) -> bool {
    u32::try_from(pid)
        .ok()
        .and_then(stat_fields)
        .and_then(|fields| fields.first().map(|state| state == "Z"))
        .unwrap_or(false)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: libc::pid_t) -> bool {
    false
}

/// Kernel start time of `pid` in clock ticks since boot (stat field 22).
///
/// Together with the pid it identifies one process across pid reuse.
#[cfg(target_os = "linux")]
pub fn start_time(pid: u32) -> Option<u64> {
    stat_fields(pid)?.get(19)?.parse().ok()
}

#[cfg(not(target_os = "linux"))]
pub fn start_time(_pid: u32) -> Option<u64> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_is_alive() {
        assert!(is_alive(std::process::id()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_start_time_is_stable() {
        let pid = std::process::id();
        let first = start_time(pid).unwrap();
        assert_eq!(start_time(pid), Some(first));
        assert_eq!(start_time(u32::MAX), None);
    }

    #[test]
    fn test_out_of_range_pid() {
        assert!(!is_alive(u32::MAX));
        assert!(terminate(u32::MAX).is_err());
    }
}
