//! Error types at the external boundaries.

use simctl_types::ServiceName;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from an RPC call.
///
/// Transport problems (nothing listening, timeouts) are kept apart from
/// rejections by the node so callers can report them differently.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The request never got a response.
    #[error("cannot reach {url}: {message}")]
    Transport { url: String, message: String },

    /// The request timed out.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The node answered and refused the operation.
    #[error("{endpoint} failed: {message}")]
    Rejected { endpoint: String, message: String },

    /// The node answered with something we could not decode.
    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Client-side TLS material could not be loaded.
    #[error("invalid TLS material: {0}")]
    Tls(String),

    /// The session was already released.
    #[error("RPC session is closed")]
    Closed,
}

impl RpcError {
    /// Whether the service could not be reached or did not answer in time.
    ///
    /// Local client setup failures such as [`RpcError::Tls`] are not
    /// transport failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport { .. } | RpcError::Timeout { .. })
    }
}

/// Errors from process supervision.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to launch {service} ({program}): {source}")]
    Spawn {
        service: ServiceName,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{service} exited right after launch: {status}")]
    ExitedEarly { service: ServiceName, status: String },

    #[error("{service} (pid {pid}) did not exit in time")]
    StopTimeout { service: ServiceName, pid: u32 },

    #[error("failed to signal {service} (pid {pid}): {message}")]
    Signal {
        service: ServiceName,
        pid: u32,
        message: String,
    },
}
