//! Control actions run against an open node session.
//!
//! Each action is a value carrying its parameters. The harness hands it a
//! live [`SimulatorRpc`] session exactly once and forwards its output.

mod autofarm;
mod farm;
mod revert;
mod status;

pub use autofarm::{AutoFarmAction, AutoFarmReport};
pub use farm::{FarmAction, FarmReport};
pub use revert::{RevertAction, RevertOutcome, RevertReport};
pub use status::{
    AddressBalance, CoinDetail, KeyDetail, StatusAction, StatusReport, WalletKeys,
};

use crate::SessionError;
use async_trait::async_trait;
use simctl_core::SimulatorRpc;

/// One unit of work against the simulator node.
#[async_trait]
pub trait ControlAction: Send {
    /// Value reported back to the caller.
    type Output: Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run the action. The session stays owned by the harness.
    async fn execute(self, rpc: &dyn SimulatorRpc) -> Result<Self::Output, SessionError>;
}
