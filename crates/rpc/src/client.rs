//! HTTP transport shared by the node and wallet clients.

use crate::types::Envelope;
use reqwest::{Client, Identity, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use simctl_core::{RpcEndpoint, RpcError};
use std::time::Duration;
use tracing::{debug, trace};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A JSON-over-HTTP(S) connection to one RPC service.
///
/// Each call is a single POST; nothing is retried. Dropping the inner
/// client on [`HttpTransport::close`] releases its connection pool.
pub struct HttpTransport {
    http: Option<Client>,
    endpoint: RpcEndpoint,
}

impl HttpTransport {
    /// Build a transport for `endpoint`.
    ///
    /// When the endpoint carries a client identity, its PEM certificate and
    /// key are presented to the service. Simulator services use self-signed
    /// certificates, so the server certificate is not verified.
    pub fn new(endpoint: RpcEndpoint, timeout: Duration) -> Result<Self, RpcError> {
        let mut builder = Client::builder().timeout(timeout);

        if let Some(identity) = &endpoint.tls {
            let mut pem = std::fs::read(&identity.certificate).map_err(|e| {
                RpcError::Tls(format!("{}: {}", identity.certificate.display(), e))
            })?;
            let key = std::fs::read(&identity.private_key).map_err(|e| {
                RpcError::Tls(format!("{}: {}", identity.private_key.display(), e))
            })?;
            pem.push(b'\n');
            pem.extend_from_slice(&key);
            let identity = Identity::from_pem(&pem).map_err(|e| RpcError::Tls(e.to_string()))?;
            builder = builder
                .identity(identity)
                .danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| RpcError::Tls(e.to_string()))?;

        Ok(Self {
            http: Some(http),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &RpcEndpoint {
        &self.endpoint
    }

    pub fn is_closed(&self) -> bool {
        self.http.is_none()
    }

    /// POST `body` to `name` and decode the response.
    pub async fn call<Req, Resp>(&self, name: &str, body: &Req) -> Result<Resp, RpcError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let http = self.http.as_ref().ok_or(RpcError::Closed)?;
        let url = self.endpoint.url(name);
        debug!(endpoint = name, %url, "RPC request");

        let response = http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(&url, e))?;
        trace!(endpoint = name, %status, len = bytes.len(), "RPC response");

        decode_response(name, status, &bytes)
    }

    pub fn close(&mut self) {
        if self.http.take().is_some() {
            debug!(endpoint = %self.endpoint, "Closed RPC session");
        }
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> RpcError {
    if e.is_timeout() {
        RpcError::Timeout {
            url: url.to_string(),
        }
    } else {
        RpcError::Transport {
            url: url.to_string(),
            message: error_chain(&e),
        }
    }
}

fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Decode an RPC response body.
///
/// A response whose `success` field is false becomes [`RpcError::Rejected`]
/// with the node's own error message.
pub fn decode_response<Resp: DeserializeOwned>(
    name: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<Resp, RpcError> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| RpcError::Decode {
        endpoint: name.to_string(),
        message: format!("HTTP {}: {}", status, e),
    })?;

    let envelope: Envelope =
        serde_json::from_value(value.clone()).map_err(|e| RpcError::Decode {
            endpoint: name.to_string(),
            message: e.to_string(),
        })?;

    if !envelope.success {
        return Err(RpcError::Rejected {
            endpoint: name.to_string(),
            message: envelope
                .error
                .unwrap_or_else(|| format!("request failed with HTTP {}", status)),
        });
    }

    serde_json::from_value(value).map_err(|e| RpcError::Decode {
        endpoint: name.to_string(),
        message: e.to_string(),
    })
}
