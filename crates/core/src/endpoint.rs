//! Addresses of RPC services.

use std::fmt;
use std::path::PathBuf;

/// Where to reach an RPC service and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    pub host: String,
    pub port: u16,

    /// Client certificate and key (PEM). Plain HTTP is used when absent.
    pub tls: Option<ClientIdentity>,
}

/// PEM files identifying this client to a TLS service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub certificate: PathBuf,
    pub private_key: PathBuf,
}

impl RpcEndpoint {
    /// Plain HTTP endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            tls: None,
        }
    }

    pub fn with_tls(mut self, certificate: PathBuf, private_key: PathBuf) -> Self {
        self.tls = Some(ClientIdentity {
            certificate,
            private_key,
        });
        self
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls.is_some() {
            "https"
        } else {
            "http"
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.host, self.port)
    }

    /// Full URL of an RPC endpoint.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url(), endpoint.trim_start_matches('/'))
    }
}

impl fmt::Display for RpcEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let plain = RpcEndpoint::new("localhost", 8555);
        assert_eq!(plain.url("farm_block"), "http://localhost:8555/farm_block");
        assert_eq!(plain.to_string(), "localhost:8555");

        let tls = plain.with_tls("a.crt".into(), "a.key".into());
        assert_eq!(tls.url("/healthz"), "https://localhost:8555/healthz");
    }
}
