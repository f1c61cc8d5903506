//! Read-only status report.

use super::ControlAction;
use crate::SessionError;
use async_trait::async_trait;
use simctl_core::{RpcConnector, RpcEndpoint, SimulatorRpc};
use simctl_types::{
    encode_address, BlockchainState, Bytes32, Fingerprint, KeyInfo, NetworkInfo, StatusQuery,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Gather chain, key, coin and address information without changing
/// anything on the node or wallet.
#[derive(Debug, Clone)]
pub struct StatusAction {
    query: StatusQuery,
    wallet: Option<WalletKeys>,
}

impl StatusAction {
    /// Status from the node alone. Without a wallet no keys are listed.
    pub fn new(query: StatusQuery) -> Self {
        Self {
            query,
            wallet: None,
        }
    }

    /// Read identities from the wallet service.
    pub fn with_wallet(mut self, wallet: WalletKeys) -> Self {
        self.wallet = Some(wallet);
        self
    }
}

/// Key lookup through the wallet service.
#[derive(Clone)]
pub struct WalletKeys {
    connector: Arc<dyn RpcConnector>,
    endpoint: RpcEndpoint,
}

impl WalletKeys {
    pub fn new(connector: Arc<dyn RpcConnector>, endpoint: RpcEndpoint) -> Self {
        Self {
            connector,
            endpoint,
        }
    }

    /// Keys held by the wallet, or `None` when the wallet is not running.
    async fn fetch(
        &self,
        fingerprint: Option<Fingerprint>,
        include_public_keys: bool,
    ) -> Result<Option<Vec<KeyInfo>>, SessionError> {
        let mut wallet = match self.connector.connect_wallet(&self.endpoint).await {
            Ok(wallet) => wallet,
            Err(e) if e.is_transport() => {
                warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Wallet not reachable, omitting keys"
                );
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let keys = wallet.get_keys(fingerprint, include_public_keys).await;
        wallet.close().await;
        Ok(Some(keys?))
    }
}

impl fmt::Debug for WalletKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKeys")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// One identity, with key material only when requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDetail {
    pub fingerprint: Fingerprint,
    pub public_key: Option<String>,
    pub farmer_public_key: Option<String>,
    pub pool_public_key: Option<String>,
}

impl KeyDetail {
    fn from_key(key: &KeyInfo, show_key: bool) -> Self {
        if show_key {
            Self {
                fingerprint: key.fingerprint,
                public_key: key.public_key.clone(),
                farmer_public_key: key.farmer_public_key.clone(),
                pool_public_key: key.pool_public_key.clone(),
            }
        } else {
            Self {
                fingerprint: key.fingerprint,
                public_key: None,
                farmer_public_key: None,
                pool_public_key: None,
            }
        }
    }
}

/// An unspent coin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinDetail {
    pub address: String,
    pub amount: u64,
    pub confirmed_height: u64,
    /// Farming reward.
    pub reward: bool,
}

/// Balance held at one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBalance {
    pub address: String,
    pub amount: u128,
    pub num_coins: u64,
}

/// Everything the status command prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub network: NetworkInfo,
    pub auto_farm: bool,
    pub farming_address: String,
    pub blockchain: BlockchainState,
    /// Identity the report was scoped to, if any.
    pub fingerprint: Option<Fingerprint>,
    /// `None` when the wallet could not be asked.
    pub keys: Option<Vec<KeyDetail>>,
    /// `None` when coins were not requested.
    pub coins: Option<Vec<CoinDetail>>,
    /// `None` when addresses were not requested.
    pub addresses: Option<Vec<AddressBalance>>,
}

#[async_trait]
impl ControlAction for StatusAction {
    type Output = StatusReport;

    fn name(&self) -> &'static str {
        "status"
    }

    async fn execute(self, rpc: &dyn SimulatorRpc) -> Result<StatusReport, SessionError> {
        let query = self.query;

        let network = rpc.get_network_info().await?;
        let prefix = network.network_prefix.as_str();
        let auto_farm = rpc.get_auto_farming().await?;
        let farming_address = encode_address(&rpc.get_farming_ph().await?, prefix)?;
        let blockchain = rpc.get_blockchain_state().await?;

        let keys = match &self.wallet {
            Some(wallet) => wallet.fetch(query.fingerprint, query.show_key).await?,
            None => None,
        };

        // Puzzle hashes owned by the selected identity. Unscoped without one.
        let scope: Option<HashSet<Bytes32>> = query.fingerprint.map(|fingerprint| {
            keys.iter()
                .flatten()
                .filter(|key| key.fingerprint == fingerprint)
                .flat_map(|key| key.puzzle_hashes.iter().copied())
                .collect()
        });
        let in_scope = |puzzle_hash: &Bytes32| {
            scope
                .as_ref()
                .map_or(true, |owned| owned.contains(puzzle_hash))
        };

        let coins = if query.show_coins {
            let mut coins = Vec::new();
            for record in rpc.get_all_coins(false).await? {
                if record.is_spent()
                    || (record.coinbase && !query.include_reward_coins)
                    || !in_scope(&record.coin.puzzle_hash)
                {
                    continue;
                }
                coins.push(CoinDetail {
                    address: encode_address(&record.coin.puzzle_hash, prefix)?,
                    amount: record.coin.amount,
                    confirmed_height: record.confirmed_block_index,
                    reward: record.coinbase,
                });
            }
            Some(coins)
        } else {
            None
        };

        let addresses = if query.show_addresses {
            let mut addresses = Vec::new();
            for balance in rpc.get_all_puzzle_hashes().await? {
                if !in_scope(&balance.puzzle_hash) {
                    continue;
                }
                addresses.push(AddressBalance {
                    address: encode_address(&balance.puzzle_hash, prefix)?,
                    amount: balance.amount,
                    num_coins: balance.num_coins,
                });
            }
            Some(addresses)
        } else {
            None
        };

        debug!(
            keys = keys.as_ref().map(Vec::len),
            coins = coins.as_ref().map(Vec::len),
            addresses = addresses.as_ref().map(Vec::len),
            "Collected status"
        );

        Ok(StatusReport {
            network,
            auto_farm,
            farming_address,
            blockchain,
            fingerprint: query.fingerprint,
            keys: keys.map(|keys| {
                keys.iter()
                    .map(|key| KeyDetail::from_key(key, query.show_key))
                    .collect()
            }),
            coins,
            addresses,
        })
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulator")?;
        writeln!(
            f,
            "  Network: {} (prefix {})",
            self.network.network_name, self.network.network_prefix
        )?;
        writeln!(f, "  Auto farming: {}", on_off(self.auto_farm))?;
        writeln!(f, "  Farming address: {}", self.farming_address)?;

        writeln!(f, "Blockchain")?;
        writeln!(f, "  Height: {}", self.blockchain.peak_height())?;
        let sync = if self.blockchain.sync.synced {
            "synced"
        } else if self.blockchain.sync.sync_mode {
            "syncing"
        } else {
            "not synced"
        };
        writeln!(f, "  Sync: {sync}")?;
        writeln!(f, "  Mempool: {} transaction(s)", self.blockchain.mempool_size)?;

        writeln!(f, "Keys")?;
        let keys = self.keys.as_deref().unwrap_or_default();
        match (&self.keys, self.fingerprint) {
            (None, _) => writeln!(f, "  Wallet not reachable")?,
            (Some(_), Some(fingerprint)) if keys.is_empty() => {
                writeln!(f, "  No key with fingerprint {fingerprint}")?
            }
            (Some(_), None) if keys.is_empty() => writeln!(f, "  No keys")?,
            _ => {}
        }
        for key in keys {
            writeln!(f, "  Fingerprint: {}", key.fingerprint)?;
            if let Some(public_key) = &key.public_key {
                writeln!(f, "    Public key: {public_key}")?;
            }
            if let Some(farmer) = &key.farmer_public_key {
                writeln!(f, "    Farmer public key: {farmer}")?;
            }
            if let Some(pool) = &key.pool_public_key {
                writeln!(f, "    Pool public key: {pool}")?;
            }
        }

        if let Some(coins) = &self.coins {
            writeln!(f, "Coins ({})", coins.len())?;
            for coin in coins {
                let reward = if coin.reward { " [reward]" } else { "" };
                writeln!(
                    f,
                    "  {} amount {} at height {}{reward}",
                    coin.address, coin.amount, coin.confirmed_height
                )?;
            }
        }

        if let Some(addresses) = &self.addresses {
            writeln!(f, "Addresses ({})", addresses.len())?;
            for balance in addresses {
                writeln!(
                    f,
                    "  {} balance {} in {} coin(s)",
                    balance.address, balance.amount, balance.num_coins
                )?;
            }
        }
        Ok(())
    }
}
