//! Chain and wallet state as reported by the simulator node.

use crate::{BlockHeight, Bytes32, Fingerprint};
use serde::{Deserialize, Serialize};

/// An unspent or spent coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub parent_coin_info: Bytes32,
    pub puzzle_hash: Bytes32,
    pub amount: u64,
}

/// A coin plus its confirmation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub coin: Coin,
    /// Farming reward coin.
    pub coinbase: bool,
    pub confirmed_block_index: u64,
    #[serde(default)]
    pub spent_block_index: u64,
    #[serde(default)]
    pub timestamp: u64,
}

impl CoinRecord {
    pub fn is_spent(&self) -> bool {
        self.spent_block_index > 0
    }
}

/// Peak block summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakInfo {
    pub height: BlockHeight,
    #[serde(default)]
    pub header_hash: Option<Bytes32>,
}

/// Sync status of the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default)]
    pub synced: bool,
    #[serde(default)]
    pub sync_mode: bool,
}

/// Response body of `get_blockchain_state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainState {
    /// `None` before the genesis block has been farmed.
    #[serde(default)]
    pub peak: Option<PeakInfo>,
    #[serde(default)]
    pub sync: SyncState,
    #[serde(default)]
    pub mempool_size: u64,
    #[serde(default)]
    pub difficulty: u64,
    #[serde(default)]
    pub space: u128,
}

impl BlockchainState {
    /// Current height, genesis when no block exists yet.
    pub fn peak_height(&self) -> BlockHeight {
        self.peak
            .as_ref()
            .map(|peak| peak.height)
            .unwrap_or(BlockHeight::GENESIS)
    }
}

/// Network identity used for address encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub network_name: String,
    pub network_prefix: String,
}

/// One identity in the wallet keychain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    pub fingerprint: Fingerprint,
    /// Public keys are only fetched on request.
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub farmer_public_key: Option<String>,
    #[serde(default)]
    pub pool_public_key: Option<String>,
    /// Puzzle hashes the wallet derived for this key.
    #[serde(default)]
    pub puzzle_hashes: Vec<Bytes32>,
}

/// Aggregate balance held by one puzzle hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleHashBalance {
    pub puzzle_hash: Bytes32,
    pub amount: u128,
    pub num_coins: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blockchain_state_without_peak() {
        let state: BlockchainState = serde_json::from_str(r#"{"peak": null}"#).unwrap();
        assert_eq!(state.peak_height(), BlockHeight::GENESIS);
        assert!(!state.sync.synced);
    }

    #[test]
    fn test_coin_record_from_rpc_json() {
        let json = format!(
            r#"{{
                "coin": {{
                    "parent_coin_info": "0x{p}",
                    "puzzle_hash": "0x{h}",
                    "amount": 1750000000000
                }},
                "coinbase": true,
                "confirmed_block_index": 3,
                "spent_block_index": 0,
                "timestamp": 1
            }}"#,
            p = "11".repeat(32),
            h = "22".repeat(32)
        );
        let record: CoinRecord = serde_json::from_str(&json).unwrap();
        assert!(record.coinbase);
        assert!(!record.is_spent());
        assert_eq!(record.coin.amount, 1_750_000_000_000);
        assert_eq!(record.coin.puzzle_hash, Bytes32::new([0x22; 32]));
    }
}
