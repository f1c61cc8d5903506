//! Opens HTTP RPC sessions.

use crate::client::{HttpTransport, DEFAULT_REQUEST_TIMEOUT};
use crate::node::SimulatorRpcClient;
use crate::wallet::WalletRpcClient;
use async_trait::async_trait;
use simctl_core::{RpcConnector, RpcEndpoint, RpcError, SimulatorRpc, WalletRpc};
use std::time::Duration;
use tracing::debug;

/// Connects to services over HTTP(S), probing `healthz` before handing out
/// a session.
#[derive(Debug, Clone)]
pub struct HttpRpcConnector {
    timeout: Duration,
}

impl HttpRpcConnector {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpRpcConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcConnector for HttpRpcConnector {
    async fn connect_node(
        &self,
        endpoint: &RpcEndpoint,
    ) -> Result<Box<dyn SimulatorRpc>, RpcError> {
        let transport = HttpTransport::new(endpoint.clone(), self.timeout)?;
        let mut client = SimulatorRpcClient::new(transport);
        if let Err(e) = client.healthz().await {
            client.close().await;
            return Err(e);
        }
        debug!(%endpoint, "Connected to simulator node");
        Ok(Box::new(client))
    }

    async fn connect_wallet(
        &self,
        endpoint: &RpcEndpoint,
    ) -> Result<Box<dyn WalletRpc>, RpcError> {
        let transport = HttpTransport::new(endpoint.clone(), self.timeout)?;
        let mut client = WalletRpcClient::new(transport);
        if let Err(e) = client.healthz().await {
            client.close().await;
            return Err(e);
        }
        debug!(%endpoint, "Connected to wallet");
        Ok(Box::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simctl_types::{encode_address, Bytes32, Fingerprint};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned JSON body per accepted connection, in order.
    async fn serve(bodies: Vec<String>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            for body in bodies {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\n\
                     content-type: application/json\r\n\
                     content-length: {}\r\n\
                     connection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });
        port
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = HttpRpcConnector::new()
            .with_timeout(Duration::from_secs(5))
            .connect_node(&RpcEndpoint::new("127.0.0.1", port))
            .await
            .err()
            .unwrap();
        assert!(err.is_transport(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_missing_certificate_is_not_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = RpcEndpoint::new("127.0.0.1", 8555).with_tls(
            dir.path().join("ssl/missing.crt"),
            dir.path().join("ssl/missing.key"),
        );

        let err = HttpRpcConnector::new()
            .connect_node(&endpoint)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RpcError::Tls(_)), "unexpected error: {err:?}");
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_farm_over_http() {
        let port = serve(vec![
            r#"{"success": true}"#.to_string(),
            r#"{"success": true, "new_peak_height": 7}"#.to_string(),
            r#"{"success": false, "error": "Invalid address"}"#.to_string(),
        ])
        .await;

        let mut session = HttpRpcConnector::new()
            .connect_node(&RpcEndpoint::new("127.0.0.1", port))
            .await
            .unwrap();

        let height = session.farm_blocks(2, true, "txch1abc").await.unwrap();
        assert_eq!(height.0, 7);

        let err = session.farm_blocks(1, true, "bogus").await.unwrap_err();
        assert!(matches!(err, RpcError::Rejected { .. }));

        session.close().await;
        let err = session.get_auto_farming().await.unwrap_err();
        assert!(matches!(err, RpcError::Closed));
    }

    #[tokio::test]
    async fn test_wallet_keys_over_http() {
        let puzzle_hash = Bytes32::new([0x5a; 32]);
        let address = encode_address(&puzzle_hash, "txch").unwrap();
        let port = serve(vec![
            r#"{"success": true}"#.to_string(),
            r#"{"success": true, "public_key_fingerprints": [1111, 2222]}"#.to_string(),
            format!(
                r#"{{"success": true, "wallet_addresses": {{
                    "2222": [{{"address": "{address}", "hd_path": "m/12381/8444/2/0"}}]
                }}}}"#
            ),
            r#"{"success": true, "private_key": {
                "fingerprint": 2222, "sk": "secret", "pk": "0xpk",
                "farmer_pk": "0xfarmer", "pool_pk": "0xpool", "seed": "words"
            }}"#
                .to_string(),
        ])
        .await;

        let mut wallet = HttpRpcConnector::new()
            .connect_wallet(&RpcEndpoint::new("127.0.0.1", port))
            .await
            .unwrap();
        let keys = wallet.get_keys(Some(Fingerprint(2222)), true).await.unwrap();
        wallet.close().await;

        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].fingerprint, Fingerprint(2222));
        assert_eq!(keys[0].puzzle_hashes, vec![puzzle_hash]);
        assert_eq!(keys[0].public_key.as_deref(), Some("0xpk"));
        assert_eq!(keys[0].pool_public_key.as_deref(), Some("0xpool"));
    }

    #[tokio::test]
    async fn test_unknown_fingerprint_skips_address_lookup() {
        let port = serve(vec![
            r#"{"success": true}"#.to_string(),
            r#"{"success": true, "public_key_fingerprints": [1111]}"#.to_string(),
        ])
        .await;

        let wallet = HttpRpcConnector::new()
            .connect_wallet(&RpcEndpoint::new("127.0.0.1", port))
            .await
            .unwrap();
        let keys = wallet.get_keys(Some(Fingerprint(9)), false).await.unwrap();
        assert!(keys.is_empty());
    }
}
