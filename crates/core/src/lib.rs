//! Capability traits and error taxonomy for the simulator control surface.
//!
//! The orchestrator depends only on this crate's traits, never on concrete
//! RPC or process implementations.

mod endpoint;
mod error;
mod process;
mod traits;

pub use endpoint::{ClientIdentity, RpcEndpoint};
pub use error::{RpcError, SupervisorError};
pub use process::{ServiceHandle, StopStatus};
pub use traits::{
    Confirm, Prompt, RpcConnector, ServiceSupervisor, SimulatorRpc, WalletRpc,
};
