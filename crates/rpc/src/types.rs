//! Request and response bodies of the node and wallet RPC endpoints.

use serde::{Deserialize, Serialize};
use simctl_types::{BlockHeight, BlockchainState, Bytes32, CoinRecord, Fingerprint};
use std::collections::BTreeMap;

/// Body for endpoints that take no parameters.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

/// Request to farm blocks.
#[derive(Debug, Serialize)]
pub struct FarmBlockRequest<'a> {
    pub address: &'a str,
    pub guarantee_tx_block: bool,
    pub blocks: u32,
}

/// Request to revert blocks.
#[derive(Debug, Serialize)]
pub struct RevertBlocksRequest {
    pub num_of_blocks: u32,
    pub num_new_blocks: u32,
    pub reset_to_genesis: bool,
    pub delete_all_blocks: bool,
}

/// Response carrying the peak height after a chain change.
#[derive(Debug, Deserialize)]
pub struct NewPeakResponse {
    pub new_peak_height: BlockHeight,
}

/// Request to toggle auto farming.
#[derive(Debug, Serialize)]
pub struct SetAutoFarmingRequest {
    pub auto_farm: bool,
}

/// Response from `set_auto_farming` and `get_auto_farming`.
#[derive(Debug, Deserialize)]
pub struct AutoFarmingResponse {
    pub auto_farm_enabled: bool,
}

/// Response from `get_blockchain_state`.
#[derive(Debug, Deserialize)]
pub struct BlockchainStateResponse {
    pub blockchain_state: BlockchainState,
}

/// Request for `get_all_coins`.
#[derive(Debug, Serialize)]
pub struct GetAllCoinsRequest {
    pub include_spent_coins: bool,
}

/// Response from `get_all_coins`.
#[derive(Debug, Deserialize)]
pub struct CoinRecordsResponse {
    #[serde(default)]
    pub coin_records: Vec<CoinRecord>,
}

/// Response from `get_all_puzzle_hashes`: puzzle hash to `[amount, num_coins]`.
#[derive(Debug, Deserialize)]
pub struct PuzzleHashesResponse {
    #[serde(default)]
    pub puzzle_hashes: BTreeMap<Bytes32, (u128, u64)>,
}

/// Response from `get_farming_ph`.
#[derive(Debug, Deserialize)]
pub struct FarmingPuzzleHashResponse {
    pub puzzle_hash: Bytes32,
}

/// Response from the wallet's `get_public_keys`.
#[derive(Debug, Deserialize)]
pub struct PublicKeysResponse {
    #[serde(default)]
    pub public_key_fingerprints: Vec<Fingerprint>,
}

/// Request for `get_wallet_addresses`.
#[derive(Debug, Serialize)]
pub struct WalletAddressesRequest {
    pub fingerprints: Vec<Fingerprint>,
    pub index: u32,
    pub count: u32,
}

/// One derived address.
#[derive(Debug, Deserialize)]
pub struct WalletAddress {
    pub address: String,
}

/// Response from `get_wallet_addresses`, keyed by fingerprint.
#[derive(Debug, Deserialize)]
pub struct WalletAddressesResponse {
    #[serde(default)]
    pub wallet_addresses: BTreeMap<String, Vec<WalletAddress>>,
}

/// Request naming one key.
#[derive(Debug, Serialize)]
pub struct FingerprintRequest {
    pub fingerprint: Fingerprint,
}

/// Public parts of the key returned by `get_private_key`. Secret fields are
/// never deserialized.
#[derive(Debug, Deserialize)]
pub struct PublicKeyParts {
    pub pk: String,
    #[serde(default)]
    pub farmer_pk: Option<String>,
    #[serde(default)]
    pub pool_pk: Option<String>,
}

/// Response from `get_private_key`.
#[derive(Debug, Deserialize)]
pub struct PrivateKeyResponse {
    pub private_key: PublicKeyParts,
}

/// Request to import a mnemonic into the wallet.
#[derive(Debug, Serialize)]
pub struct AddKeyRequest {
    pub mnemonic: Vec<String>,
}

/// Response from `add_key`.
#[derive(Debug, Deserialize)]
pub struct AddKeyResponse {
    pub fingerprint: Fingerprint,
}

/// Status fields present on every RPC response.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}
