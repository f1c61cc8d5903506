//! Client for the wallet service.

use crate::client::HttpTransport;
use crate::types::{
    AddKeyRequest, AddKeyResponse, Empty, FingerprintRequest, PrivateKeyResponse,
    PublicKeysResponse, WalletAddressesRequest, WalletAddressesResponse,
};
use async_trait::async_trait;
use simctl_core::{RpcError, WalletRpc};
use simctl_types::{decode_address, Bytes32, Fingerprint, KeyInfo};
use tracing::{debug, info};

/// Derivation indexes scanned per key when attributing coins to it.
pub const ADDRESS_SCAN_COUNT: u32 = 50;

/// RPC session with the wallet service.
pub struct WalletRpcClient {
    transport: HttpTransport,
}

impl WalletRpcClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub async fn healthz(&self) -> Result<(), RpcError> {
        let _: serde_json::Value = self.transport.call("healthz", &Empty {}).await?;
        Ok(())
    }

    async fn puzzle_hashes(
        &self,
        fingerprints: &[Fingerprint],
    ) -> Result<WalletAddressesResponse, RpcError> {
        let request = WalletAddressesRequest {
            fingerprints: fingerprints.to_vec(),
            index: 0,
            count: ADDRESS_SCAN_COUNT,
        };
        self.transport.call("get_wallet_addresses", &request).await
    }
}

#[async_trait]
impl WalletRpc for WalletRpcClient {
    async fn add_key(&self, mnemonic: &str) -> Result<Fingerprint, RpcError> {
        let request = AddKeyRequest {
            mnemonic: mnemonic.split_whitespace().map(str::to_string).collect(),
        };
        let response: AddKeyResponse = self.transport.call("add_key", &request).await?;
        info!(fingerprint = response.fingerprint.0, "Imported key into wallet");
        Ok(response.fingerprint)
    }

    async fn get_keys(
        &self,
        fingerprint: Option<Fingerprint>,
        include_public_keys: bool,
    ) -> Result<Vec<KeyInfo>, RpcError> {
        let response: PublicKeysResponse =
            self.transport.call("get_public_keys", &Empty {}).await?;
        let fingerprints: Vec<Fingerprint> = response
            .public_key_fingerprints
            .into_iter()
            .filter(|fp| fingerprint.map_or(true, |wanted| *fp == wanted))
            .collect();
        if fingerprints.is_empty() {
            return Ok(Vec::new());
        }

        let mut addresses = self.puzzle_hashes(&fingerprints).await?.wallet_addresses;
        let mut keys = Vec::with_capacity(fingerprints.len());
        for fingerprint in fingerprints {
            let puzzle_hashes = addresses
                .remove(&fingerprint.to_string())
                .unwrap_or_default()
                .into_iter()
                .map(|entry| {
                    decode_address(&entry.address)
                        .map(|(_, puzzle_hash)| puzzle_hash)
                        .map_err(|e| RpcError::Decode {
                            endpoint: "get_wallet_addresses".to_string(),
                            message: format!("{}: {e}", entry.address),
                        })
                })
                .collect::<Result<Vec<Bytes32>, _>>()?;

            let mut key = KeyInfo {
                fingerprint,
                public_key: None,
                farmer_public_key: None,
                pool_public_key: None,
                puzzle_hashes,
            };
            if include_public_keys {
                let response: PrivateKeyResponse = self
                    .transport
                    .call("get_private_key", &FingerprintRequest { fingerprint })
                    .await?;
                key.public_key = Some(response.private_key.pk);
                key.farmer_public_key = response.private_key.farmer_pk;
                key.pool_public_key = response.private_key.pool_pk;
            }
            keys.push(key);
        }
        debug!(keys = keys.len(), "Fetched wallet keys");
        Ok(keys)
    }

    async fn close(&mut self) {
        self.transport.close();
    }
}
