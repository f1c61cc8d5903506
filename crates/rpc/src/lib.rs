//! HTTP JSON RPC client for the simulator node and wallet.
//!
//! Every endpoint is a POST of a JSON object to `/{endpoint}`. Responses
//! carry a `success` flag and, on failure, an `error` message which is
//! surfaced verbatim as [`simctl_core::RpcError::Rejected`].

pub mod client;
mod connector;
mod node;
pub mod types;
mod wallet;

pub use client::{HttpTransport, DEFAULT_REQUEST_TIMEOUT};
pub use connector::HttpRpcConnector;
pub use node::SimulatorRpcClient;
pub use wallet::WalletRpcClient;
