//! Logical service names managed by the lifecycle manager.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical out-of-process service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceName {
    /// Owning daemon that the other services run under.
    Daemon,
    /// Simulated full node.
    Simulator,
    /// Wallet service.
    Wallet,
}

impl ServiceName {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceName::Daemon => "daemon",
            ServiceName::Simulator => "simulator",
            ServiceName::Wallet => "wallet",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of services to start or stop.
///
/// Always begins with the simulator; the wallet is only included on request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceGroup(Vec<ServiceName>);

impl ServiceGroup {
    /// The simulator, plus the wallet when `with_wallet` is set.
    pub fn new(with_wallet: bool) -> Self {
        let mut services = vec![ServiceName::Simulator];
        if with_wallet {
            services.push(ServiceName::Wallet);
        }
        Self(services)
    }

    pub fn services(&self) -> &[ServiceName] {
        &self.0
    }

    pub fn contains(&self, service: ServiceName) -> bool {
        self.0.contains(&service)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ServiceGroup {
    fn default() -> Self {
        Self::new(false)
    }
}

impl<'a> IntoIterator for &'a ServiceGroup {
    type Item = &'a ServiceName;
    type IntoIter = std::slice::Iter<'a, ServiceName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
