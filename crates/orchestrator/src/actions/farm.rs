//! Block production.

use super::ControlAction;
use crate::SessionError;
use async_trait::async_trait;
use simctl_core::SimulatorRpc;
use simctl_types::{encode_address, BlockHeight, FarmParameters};
use std::fmt;
use tracing::{debug, info};

/// Farm one or more blocks.
#[derive(Debug, Clone)]
pub struct FarmAction {
    params: FarmParameters,
}

impl FarmAction {
    pub fn new(params: FarmParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FarmParameters {
        &self.params
    }
}

/// Result of a farm action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmReport {
    pub blocks: u32,
    pub as_transaction_block: bool,
    /// Address that received the rewards.
    pub address: String,
    pub new_height: BlockHeight,
}

impl fmt::Display for FarmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.as_transaction_block {
            "transaction"
        } else {
            "reward-only"
        };
        writeln!(f, "Farmed {} {kind} block(s)", self.blocks)?;
        writeln!(f, "Rewards sent to: {}", self.address)?;
        write!(f, "New chain height: {}", self.new_height)
    }
}

#[async_trait]
impl ControlAction for FarmAction {
    type Output = FarmReport;

    fn name(&self) -> &'static str {
        "farm"
    }

    async fn execute(self, rpc: &dyn SimulatorRpc) -> Result<FarmReport, SessionError> {
        self.params.validate()?;

        let address = match self.params.target_address() {
            Some(address) => address.to_string(),
            None => {
                let puzzle_hash = rpc.get_farming_ph().await?;
                let network = rpc.get_network_info().await?;
                let address = encode_address(&puzzle_hash, &network.network_prefix)?;
                debug!(%address, "Using node farming address");
                address
            }
        };

        let new_height = rpc
            .farm_blocks(
                self.params.block_count,
                self.params.as_transaction_block,
                &address,
            )
            .await?;

        info!(
            blocks = self.params.block_count,
            tx_block = self.params.as_transaction_block,
            height = new_height.0,
            "Farmed blocks"
        );

        Ok(FarmReport {
            blocks: self.params.block_count,
            as_transaction_block: self.params.as_transaction_block,
            address,
            new_height,
        })
    }
}
