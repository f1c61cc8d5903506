//! Capability traits the orchestrator is written against.
//!
//! Every side effect of the control surface goes through one of these:
//! talking to the node or wallet, launching processes, or asking the user.
//! Production implementations live in `simctl-rpc` and `simctl-supervisor`;
//! tests supply in-memory doubles.

use crate::{RpcEndpoint, RpcError, ServiceHandle, StopStatus, SupervisorError};
use async_trait::async_trait;
use simctl_types::{
    BlockHeight, BlockchainState, Bytes32, CoinRecord, Fingerprint, KeyInfo, NetworkInfo,
    PuzzleHashBalance, ServiceName,
};

/// An open RPC session with the simulated full node.
///
/// A session is acquired from an [`RpcConnector`] and must be released with
/// [`SimulatorRpc::close`]. Calls after `close` fail with [`RpcError::Closed`].
#[async_trait]
pub trait SimulatorRpc: Send + Sync {
    /// Produce `blocks` new blocks and return the new peak height.
    ///
    /// # Arguments
    ///
    /// * `blocks` - Number of blocks to farm
    /// * `guarantee_tx_block` - When false, blocks carry rewards only and
    ///   pending transactions stay in the mempool
    /// * `address` - Reward address, validated by the node
    async fn farm_blocks(
        &self,
        blocks: u32,
        guarantee_tx_block: bool,
        address: &str,
    ) -> Result<BlockHeight, RpcError>;

    /// Remove recent blocks, then farm `new_blocks` on top. Returns the new
    /// peak height.
    ///
    /// `delete_all_blocks` discards blocks without a reorg and breaks wallet
    /// height tracking.
    async fn revert_blocks(
        &self,
        blocks: u32,
        new_blocks: u32,
        reset_to_genesis: bool,
        delete_all_blocks: bool,
    ) -> Result<BlockHeight, RpcError>;

    /// Enable or disable auto farming, returning the resulting state.
    async fn set_auto_farming(&self, enabled: bool) -> Result<bool, RpcError>;

    async fn get_auto_farming(&self) -> Result<bool, RpcError>;

    async fn get_blockchain_state(&self) -> Result<BlockchainState, RpcError>;

    async fn get_network_info(&self) -> Result<NetworkInfo, RpcError>;

    /// Every coin the node knows, optionally including spent ones.
    async fn get_all_coins(&self, include_spent: bool) -> Result<Vec<CoinRecord>, RpcError>;

    /// Unspent balance per puzzle hash.
    async fn get_all_puzzle_hashes(&self) -> Result<Vec<PuzzleHashBalance>, RpcError>;

    /// Puzzle hash that receives farming rewards by default.
    async fn get_farming_ph(&self) -> Result<Bytes32, RpcError>;

    /// Release the session. Idempotent.
    async fn close(&mut self);
}

/// An open RPC session with the wallet service.
#[async_trait]
pub trait WalletRpc: Send + Sync {
    /// Import a mnemonic into the wallet keychain.
    async fn add_key(&self, mnemonic: &str) -> Result<Fingerprint, RpcError>;

    /// Identities in the keychain, optionally just one, with the puzzle
    /// hashes derived for each. Public keys are filled in only when
    /// `include_public_keys` is set.
    async fn get_keys(
        &self,
        fingerprint: Option<Fingerprint>,
        include_public_keys: bool,
    ) -> Result<Vec<KeyInfo>, RpcError>;

    /// Release the session. Idempotent.
    async fn close(&mut self);
}

/// Opens RPC sessions.
#[async_trait]
pub trait RpcConnector: Send + Sync {
    /// Connect to the simulated full node.
    ///
    /// Fails with a transport error when nothing answers at `endpoint`.
    async fn connect_node(
        &self,
        endpoint: &RpcEndpoint,
    ) -> Result<Box<dyn SimulatorRpc>, RpcError>;

    /// Connect to the wallet service.
    async fn connect_wallet(
        &self,
        endpoint: &RpcEndpoint,
    ) -> Result<Box<dyn WalletRpc>, RpcError>;
}

/// Yes/no confirmation before a destructive step.
pub trait Confirm: Send + Sync {
    /// Show `prompt` and return true only for an explicit `y`.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Free-text question, used by the provisioning wizard.
pub trait Prompt: Send + Sync {
    /// Ask `question`. `None` means no answer (empty input or closed stdin).
    fn ask(&self, question: &str) -> Option<String>;
}

/// Starts and stops OS-level service processes for one simulator root.
///
/// Implementations are bound to a single root path at construction, so two
/// simulators never share process state.
#[async_trait]
pub trait ServiceSupervisor: Send + Sync {
    async fn is_running(&self, service: ServiceName) -> Result<bool, SupervisorError>;

    /// Launch `service` as a managed background process.
    async fn start(&self, service: ServiceName) -> Result<ServiceHandle, SupervisorError>;

    /// Ask `service` to terminate gracefully.
    async fn stop(&self, service: ServiceName) -> Result<StopStatus, SupervisorError>;

    /// Stop any running instance, then start a fresh one.
    async fn restart(&self, service: ServiceName) -> Result<ServiceHandle, SupervisorError> {
        self.stop(service).await?;
        self.start(service).await
    }
}
