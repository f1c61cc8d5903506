//! Client for the simulated full node.

use crate::client::HttpTransport;
use crate::types::{
    AutoFarmingResponse, BlockchainStateResponse, CoinRecordsResponse, Empty,
    FarmBlockRequest, FarmingPuzzleHashResponse, GetAllCoinsRequest, NewPeakResponse,
    PuzzleHashesResponse, RevertBlocksRequest, SetAutoFarmingRequest,
};
use async_trait::async_trait;
use simctl_core::{RpcError, SimulatorRpc};
use simctl_types::{
    BlockHeight, BlockchainState, Bytes32, CoinRecord, NetworkInfo, PuzzleHashBalance,
};
use tracing::info;

/// RPC session with a simulator full node.
pub struct SimulatorRpcClient {
    transport: HttpTransport,
}

impl SimulatorRpcClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Check that the node answers at all.
    pub async fn healthz(&self) -> Result<(), RpcError> {
        let _: serde_json::Value = self.transport.call("healthz", &Empty {}).await?;
        Ok(())
    }
}

#[async_trait]
impl SimulatorRpc for SimulatorRpcClient {
    async fn farm_blocks(
        &self,
        blocks: u32,
        guarantee_tx_block: bool,
        address: &str,
    ) -> Result<BlockHeight, RpcError> {
        let request = FarmBlockRequest {
            address,
            guarantee_tx_block,
            blocks,
        };
        let response: NewPeakResponse = self.transport.call("farm_block", &request).await?;
        info!(blocks, height = response.new_peak_height.0, "Farmed blocks");
        Ok(response.new_peak_height)
    }

    async fn revert_blocks(
        &self,
        blocks: u32,
        new_blocks: u32,
        reset_to_genesis: bool,
        delete_all_blocks: bool,
    ) -> Result<BlockHeight, RpcError> {
        let request = RevertBlocksRequest {
            num_of_blocks: blocks,
            num_new_blocks: new_blocks,
            reset_to_genesis,
            delete_all_blocks,
        };
        let response: NewPeakResponse = self.transport.call("revert_blocks", &request).await?;
        info!(
            blocks,
            new_blocks,
            reset_to_genesis,
            delete_all_blocks,
            height = response.new_peak_height.0,
            "Reverted blocks"
        );
        Ok(response.new_peak_height)
    }

    async fn set_auto_farming(&self, enabled: bool) -> Result<bool, RpcError> {
        let request = SetAutoFarmingRequest { auto_farm: enabled };
        let response: AutoFarmingResponse =
            self.transport.call("set_auto_farming", &request).await?;
        Ok(response.auto_farm_enabled)
    }

    async fn get_auto_farming(&self) -> Result<bool, RpcError> {
        let response: AutoFarmingResponse =
            self.transport.call("get_auto_farming", &Empty {}).await?;
        Ok(response.auto_farm_enabled)
    }

    async fn get_blockchain_state(&self) -> Result<BlockchainState, RpcError> {
        let response: BlockchainStateResponse = self
            .transport
            .call("get_blockchain_state", &Empty {})
            .await?;
        Ok(response.blockchain_state)
    }

    async fn get_network_info(&self) -> Result<NetworkInfo, RpcError> {
        self.transport.call("get_network_info", &Empty {}).await
    }

    async fn get_all_coins(&self, include_spent: bool) -> Result<Vec<CoinRecord>, RpcError> {
        let request = GetAllCoinsRequest {
            include_spent_coins: include_spent,
        };
        let response: CoinRecordsResponse = self.transport.call("get_all_coins", &request).await?;
        Ok(response.coin_records)
    }

    async fn get_all_puzzle_hashes(&self) -> Result<Vec<PuzzleHashBalance>, RpcError> {
        let response: PuzzleHashesResponse = self
            .transport
            .call("get_all_puzzle_hashes", &Empty {})
            .await?;
        Ok(response
            .puzzle_hashes
            .into_iter()
            .map(|(puzzle_hash, (amount, num_coins))| PuzzleHashBalance {
                puzzle_hash,
                amount,
                num_coins,
            })
            .collect())
    }

    async fn get_farming_ph(&self) -> Result<Bytes32, RpcError> {
        let response: FarmingPuzzleHashResponse =
            self.transport.call("get_farming_ph", &Empty {}).await?;
        Ok(response.puzzle_hash)
    }

    async fn close(&mut self) {
        self.transport.close();
    }
}
