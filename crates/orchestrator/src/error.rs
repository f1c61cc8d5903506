//! Errors surfaced by the orchestrator.

use simctl_config::ConfigError;
use simctl_core::RpcError;
use simctl_types::{AddressError, InputError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a control action run through the harness.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Rejected locally before any external call.
    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Nothing answered at the node's RPC endpoint.
    #[error("simulator is not running at {host}:{port}, start it with `simctl start`")]
    NodeNotRunning {
        host: String,
        port: u16,
        #[source]
        source: RpcError,
    },

    /// Client TLS material for the endpoint could not be loaded.
    #[error(transparent)]
    Tls(RpcError),

    /// The session broke down while the action was running.
    #[error(transparent)]
    Transport(RpcError),

    /// The node answered and refused the request.
    #[error(transparent)]
    Action(RpcError),

    /// An address returned by the node could not be encoded.
    #[error(transparent)]
    Address(#[from] AddressError),
}

impl From<RpcError> for SessionError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Tls(_) => SessionError::Tls(err),
            err if err.is_transport() => SessionError::Transport(err),
            err => SessionError::Action(err),
        }
    }
}

impl SessionError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SessionError::NodeNotRunning { .. } | SessionError::Transport(_)
        )
    }
}

/// Failure of the provisioning wizard.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("invalid reward address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("invalid fingerprint {0:?}")]
    InvalidFingerprint(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Importing the mnemonic through the wallet service failed.
    #[error("failed to import mnemonic: {0}")]
    KeyImport(RpcError),
}
