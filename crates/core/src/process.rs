//! Outcomes of process supervision.

use simctl_types::ServiceName;

/// A service launched (or found running) by a supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    pub service: ServiceName,
    /// OS process id, when the supervisor tracks one.
    pub pid: Option<u32>,
}

/// Result of asking a service to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    /// The service was running and has exited.
    Stopped,
    /// Nothing was running under that name.
    NotRunning,
}
