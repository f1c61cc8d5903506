//! In-memory doubles for the node, wallet and process supervisor.
//!
//! [`MockNode`] keeps a tiny model of a simulated chain (height, mempool,
//! reward coins, keys) and counts every session it hands out and every
//! session released, so tests can check the harness never leaks one.

use async_trait::async_trait;
use simctl_core::{
    RpcConnector, RpcEndpoint, RpcError, ServiceHandle, ServiceSupervisor, SimulatorRpc,
    StopStatus, SupervisorError, WalletRpc,
};
use simctl_types::{
    decode_address_for, BlockHeight, BlockchainState, Bytes32, Coin, CoinRecord, Fingerprint,
    KeyInfo, NetworkInfo, PeakInfo, PuzzleHashBalance, ServiceName, SyncState,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Reward paid per farmed block.
pub const BLOCK_REWARD: u64 = 1_750_000_000_000;

/// Fingerprint assigned to mnemonics imported through [`MockWallet`].
pub const IMPORTED_FINGERPRINT: Fingerprint = Fingerprint(4_242_424_242);

/// How every RPC call of a [`MockNode`] fails, when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// The connection drops mid-call.
    Transport,
    /// The node answers `success: false` with this message.
    Rejected(String),
}

struct NodeState {
    height: u64,
    mempool_size: u64,
    auto_farm: bool,
    network: NetworkInfo,
    farming_ph: Bytes32,
    coins: Vec<CoinRecord>,
    keys: Vec<KeyInfo>,
    imported: Vec<String>,
    failure: Option<MockFailure>,
}

#[derive(Default)]
struct Counters {
    rpc_calls: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    connect_attempts: AtomicUsize,
}

/// A simulated node shared between a test and the sessions it opens.
#[derive(Clone)]
pub struct MockNode {
    state: Arc<Mutex<NodeState>>,
    counters: Arc<Counters>,
    reachable: Arc<AtomicBool>,
    wallet_reachable: Arc<AtomicBool>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNode {
    /// A reachable node at genesis with auto farming off.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(NodeState {
                height: 0,
                mempool_size: 0,
                auto_farm: false,
                network: NetworkInfo {
                    network_name: "simulator0".to_string(),
                    network_prefix: "txch".to_string(),
                },
                farming_ph: Bytes32::new([0xfa; 32]),
                coins: Vec::new(),
                keys: Vec::new(),
                imported: Vec::new(),
                failure: None,
            })),
            counters: Arc::new(Counters::default()),
            reachable: Arc::new(AtomicBool::new(true)),
            wallet_reachable: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_height(self, height: u64) -> Self {
        self.lock().height = height;
        self
    }

    pub fn with_mempool_size(self, size: u64) -> Self {
        self.lock().mempool_size = size;
        self
    }

    pub fn with_auto_farm(self, enabled: bool) -> Self {
        self.lock().auto_farm = enabled;
        self
    }

    /// Add an identity to the wallet keychain.
    pub fn with_key(self, key: KeyInfo) -> Self {
        self.lock().keys.push(key);
        self
    }

    /// Add an unspent coin confirmed at the current height.
    pub fn with_coin(self, puzzle_hash: Bytes32, amount: u64, coinbase: bool) -> Self {
        {
            let mut state = self.lock();
            let height = state.height;
            let parent = parent_id(height, state.coins.len());
            state.coins.push(CoinRecord {
                coin: Coin {
                    parent_coin_info: parent,
                    puzzle_hash,
                    amount,
                },
                coinbase,
                confirmed_block_index: height,
                spent_block_index: 0,
                timestamp: 0,
            });
        }
        self
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_wallet_reachable(&self, reachable: bool) {
        self.wallet_reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_failure(&self, failure: Option<MockFailure>) {
        self.lock().failure = failure;
    }

    /// Open a session directly, bypassing any connector.
    pub fn session(&self) -> MockSession {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        MockSession {
            node: self.clone(),
            closed: false,
        }
    }

    pub fn height(&self) -> BlockHeight {
        BlockHeight(self.lock().height)
    }

    pub fn mempool_size(&self) -> u64 {
        self.lock().mempool_size
    }

    pub fn auto_farm(&self) -> bool {
        self.lock().auto_farm
    }

    pub fn network_prefix(&self) -> String {
        self.lock().network.network_prefix.clone()
    }

    pub fn farming_ph(&self) -> Bytes32 {
        self.lock().farming_ph
    }

    pub fn imported_mnemonics(&self) -> Vec<String> {
        self.lock().imported.clone()
    }

    /// RPC calls made through any session.
    pub fn rpc_calls(&self) -> usize {
        self.counters.rpc_calls.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Connection attempts, successful or not.
    pub fn connect_attempts(&self) -> usize {
        self.counters.connect_attempts.load(Ordering::SeqCst)
    }

    /// Sessions handed out and not yet released.
    pub fn open_sessions(&self) -> usize {
        self.sessions_opened() - self.sessions_closed()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NodeState> {
        self.state.lock().unwrap()
    }

    /// Count a call and apply any configured failure.
    fn call(&self, endpoint: &str) -> Result<std::sync::MutexGuard<'_, NodeState>, RpcError> {
        self.counters.rpc_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        match &state.failure {
            None => Ok(state),
            Some(MockFailure::Transport) => Err(RpcError::Transport {
                url: format!("http://localhost:8555/{endpoint}"),
                message: "connection reset by peer".to_string(),
            }),
            Some(MockFailure::Rejected(message)) => Err(RpcError::Rejected {
                endpoint: endpoint.to_string(),
                message: message.clone(),
            }),
        }
    }
}

fn parent_id(height: u64, index: usize) -> Bytes32 {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&height.to_be_bytes());
    bytes[8..16].copy_from_slice(&(index as u64).to_be_bytes());
    Bytes32::new(bytes)
}

/// A session on a [`MockNode`].
pub struct MockSession {
    node: MockNode,
    closed: bool,
}

impl MockSession {
    fn call(&self, endpoint: &str) -> Result<std::sync::MutexGuard<'_, NodeState>, RpcError> {
        if self.closed {
            return Err(RpcError::Closed);
        }
        self.node.call(endpoint)
    }
}

#[async_trait]
impl SimulatorRpc for MockSession {
    async fn farm_blocks(
        &self,
        blocks: u32,
        guarantee_tx_block: bool,
        address: &str,
    ) -> Result<BlockHeight, RpcError> {
        let mut state = self.call("farm_block")?;
        let puzzle_hash = decode_address_for(address, &state.network.network_prefix).map_err(|e| {
            RpcError::Rejected {
                endpoint: "farm_block".to_string(),
                message: format!("Invalid address: {e}"),
            }
        })?;

        for _ in 0..blocks {
            state.height += 1;
            let height = state.height;
            let parent = parent_id(height, state.coins.len());
            state.coins.push(CoinRecord {
                coin: Coin {
                    parent_coin_info: parent,
                    puzzle_hash,
                    amount: BLOCK_REWARD,
                },
                coinbase: true,
                confirmed_block_index: height,
                spent_block_index: 0,
                timestamp: 0,
            });
        }
        if guarantee_tx_block {
            state.mempool_size = 0;
        }
        Ok(BlockHeight(state.height))
    }

    async fn revert_blocks(
        &self,
        blocks: u32,
        new_blocks: u32,
        reset_to_genesis: bool,
        _delete_all_blocks: bool,
    ) -> Result<BlockHeight, RpcError> {
        let mut state = self.call("revert_blocks")?;
        let target = if reset_to_genesis {
            BlockHeight::GENESIS
        } else {
            BlockHeight(state.height).rewind(u64::from(blocks))
        };
        state.coins.retain(|record| record.confirmed_block_index <= target.0);
        let height = target.advance(u64::from(new_blocks));
        state.height = height.0;
        Ok(height)
    }

    async fn set_auto_farming(&self, enabled: bool) -> Result<bool, RpcError> {
        let mut state = self.call("set_auto_farming")?;
        state.auto_farm = enabled;
        Ok(state.auto_farm)
    }

    async fn get_auto_farming(&self) -> Result<bool, RpcError> {
        Ok(self.call("get_auto_farming")?.auto_farm)
    }

    async fn get_blockchain_state(&self) -> Result<BlockchainState, RpcError> {
        let state = self.call("get_blockchain_state")?;
        Ok(BlockchainState {
            peak: Some(PeakInfo {
                height: BlockHeight(state.height),
                header_hash: None,
            }),
            sync: SyncState {
                synced: true,
                sync_mode: false,
            },
            mempool_size: state.mempool_size,
            difficulty: 128,
            space: 0,
        })
    }

    async fn get_network_info(&self) -> Result<NetworkInfo, RpcError> {
        Ok(self.call("get_network_info")?.network.clone())
    }

    async fn get_all_coins(&self, include_spent: bool) -> Result<Vec<CoinRecord>, RpcError> {
        let state = self.call("get_all_coins")?;
        Ok(state
            .coins
            .iter()
            .filter(|record| include_spent || !record.is_spent())
            .cloned()
            .collect())
    }

    async fn get_all_puzzle_hashes(&self) -> Result<Vec<PuzzleHashBalance>, RpcError> {
        let state = self.call("get_all_puzzle_hashes")?;
        let mut balances: BTreeMap<Bytes32, (u128, u64)> = BTreeMap::new();
        for record in state.coins.iter().filter(|record| !record.is_spent()) {
            let entry = balances.entry(record.coin.puzzle_hash).or_default();
            entry.0 += u128::from(record.coin.amount);
            entry.1 += 1;
        }
        Ok(balances
            .into_iter()
            .map(|(puzzle_hash, (amount, num_coins))| PuzzleHashBalance {
                puzzle_hash,
                amount,
                num_coins,
            })
            .collect())
    }

    async fn get_farming_ph(&self) -> Result<Bytes32, RpcError> {
        Ok(self.call("get_farming_ph")?.farming_ph)
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.node.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// A wallet session that records imported mnemonics on the node.
pub struct MockWallet {
    node: MockNode,
    closed: bool,
}

#[async_trait]
impl WalletRpc for MockWallet {
    async fn add_key(&self, mnemonic: &str) -> Result<Fingerprint, RpcError> {
        if self.closed {
            return Err(RpcError::Closed);
        }
        let mut state = self.node.call("add_key")?;
        if mnemonic.split_whitespace().count() != 24 {
            return Err(RpcError::Rejected {
                endpoint: "add_key".to_string(),
                message: "Invalid mnemonic length".to_string(),
            });
        }
        state.imported.push(mnemonic.to_string());
        Ok(IMPORTED_FINGERPRINT)
    }

    async fn get_keys(
        &self,
        fingerprint: Option<Fingerprint>,
        include_public_keys: bool,
    ) -> Result<Vec<KeyInfo>, RpcError> {
        if self.closed {
            return Err(RpcError::Closed);
        }
        let state = self.node.call("get_public_keys")?;
        Ok(state
            .keys
            .iter()
            .filter(|key| fingerprint.map_or(true, |fp| key.fingerprint == fp))
            .map(|key| {
                let mut key = key.clone();
                if !include_public_keys {
                    key.public_key = None;
                    key.farmer_public_key = None;
                    key.pool_public_key = None;
                }
                key
            })
            .collect())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.node.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Hands out sessions on one [`MockNode`], failing with a transport error
/// while the node or wallet is unreachable. Like the HTTP connector, it refuses TLS
/// endpoints whose certificate file is missing.
#[derive(Clone)]
pub struct MockConnector {
    node: MockNode,
}

impl MockConnector {
    pub fn new(node: MockNode) -> Self {
        Self { node }
    }

    fn check_reachable(&self, endpoint: &RpcEndpoint, up: &AtomicBool) -> Result<(), RpcError> {
        self.node
            .counters
            .connect_attempts
            .fetch_add(1, Ordering::SeqCst);
        if let Some(identity) = &endpoint.tls {
            if !identity.certificate.exists() {
                return Err(RpcError::Tls(format!(
                    "{}: No such file or directory",
                    identity.certificate.display()
                )));
            }
        }
        if up.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RpcError::Transport {
                url: endpoint.url("healthz"),
                message: "connection refused".to_string(),
            })
        }
    }
}

#[async_trait]
impl RpcConnector for MockConnector {
    async fn connect_node(
        &self,
        endpoint: &RpcEndpoint,
    ) -> Result<Box<dyn SimulatorRpc>, RpcError> {
        self.check_reachable(endpoint, &self.node.reachable)?;
        Ok(Box::new(self.node.session()))
    }

    async fn connect_wallet(
        &self,
        endpoint: &RpcEndpoint,
    ) -> Result<Box<dyn WalletRpc>, RpcError> {
        self.check_reachable(endpoint, &self.node.wallet_reachable)?;
        self.node.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockWallet {
            node: self.node.clone(),
            closed: false,
        }))
    }
}

/// One call made against a [`MemorySupervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorCall {
    Start(ServiceName),
    Stop(ServiceName),
}

/// Process supervisor that tracks services in memory.
#[derive(Default)]
pub struct MemorySupervisor {
    running: Mutex<HashMap<ServiceName, u32>>,
    failing_start: Mutex<HashSet<ServiceName>>,
    failing_stop: Mutex<HashSet<ServiceName>>,
    calls: Mutex<Vec<SupervisorCall>>,
    next_pid: AtomicU32,
}

impl MemorySupervisor {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(1000),
            ..Default::default()
        }
    }

    /// Mark `service` as already running.
    pub fn with_running(self, service: ServiceName) -> Self {
        let pid = self.allocate_pid();
        self.running.lock().unwrap().insert(service, pid);
        self
    }

    pub fn fail_start(self, service: ServiceName) -> Self {
        self.failing_start.lock().unwrap().insert(service);
        self
    }

    pub fn fail_stop(self, service: ServiceName) -> Self {
        self.failing_stop.lock().unwrap().insert(service);
        self
    }

    pub fn pid(&self, service: ServiceName) -> Option<u32> {
        self.running.lock().unwrap().get(&service).copied()
    }

    pub fn calls(&self) -> Vec<SupervisorCall> {
        self.calls.lock().unwrap().clone()
    }

    fn allocate_pid(&self) -> u32 {
        self.next_pid.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl ServiceSupervisor for MemorySupervisor {
    async fn is_running(&self, service: ServiceName) -> Result<bool, SupervisorError> {
        Ok(self.running.lock().unwrap().contains_key(&service))
    }

    async fn start(&self, service: ServiceName) -> Result<ServiceHandle, SupervisorError> {
        self.calls.lock().unwrap().push(SupervisorCall::Start(service));
        if self.failing_start.lock().unwrap().contains(&service) {
            return Err(SupervisorError::ExitedEarly {
                service,
                status: "exit status: 1".to_string(),
            });
        }
        let mut running = self.running.lock().unwrap();
        let pid = match running.get(&service) {
            Some(pid) => *pid,
            None => {
                let pid = self.allocate_pid();
                running.insert(service, pid);
                pid
            }
        };
        Ok(ServiceHandle {
            service,
            pid: Some(pid),
        })
    }

    async fn stop(&self, service: ServiceName) -> Result<StopStatus, SupervisorError> {
        self.calls.lock().unwrap().push(SupervisorCall::Stop(service));
        let mut running = self.running.lock().unwrap();
        let Some(pid) = running.get(&service).copied() else {
            return Ok(StopStatus::NotRunning);
        };
        if self.failing_stop.lock().unwrap().contains(&service) {
            return Err(SupervisorError::StopTimeout { service, pid });
        }
        running.remove(&service);
        Ok(StopStatus::Stopped)
    }
}
