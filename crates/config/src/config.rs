//! Configuration types for a simulator instance.

use serde::{Deserialize, Serialize};
use simctl_types::{Fingerprint, ServiceName};
use std::path::{Path, PathBuf};

/// Default RPC port of the simulated full node.
pub const DEFAULT_FULL_NODE_RPC_PORT: u16 = 8555;

/// Default RPC port of the wallet service.
pub const DEFAULT_WALLET_RPC_PORT: u16 = 9256;

/// Contents of `config.yaml` in a simulator root.
///
/// Every section has defaults so a partial document still loads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Host the services listen on.
    #[serde(default = "default_hostname")]
    pub self_hostname: String,

    /// Simulated full node RPC endpoint.
    #[serde(default = "RpcEndpointConfig::full_node")]
    pub full_node: RpcEndpointConfig,

    /// Wallet RPC endpoint.
    #[serde(default = "RpcEndpointConfig::wallet")]
    pub wallet: RpcEndpointConfig,

    /// Farming settings written by the provisioning wizard.
    #[serde(default)]
    pub simulator: SimulatorSettings,

    /// Programs launched for each service.
    #[serde(default)]
    pub services: ServiceCommands,
}

fn default_hostname() -> String {
    "localhost".to_string()
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            self_hostname: default_hostname(),
            full_node: RpcEndpointConfig::full_node(),
            wallet: RpcEndpointConfig::wallet(),
            simulator: SimulatorSettings::default(),
            services: ServiceCommands::default(),
        }
    }
}

impl SimulatorConfig {
    /// Set the full node RPC port.
    pub fn with_rpc_port(mut self, port: u16) -> Self {
        self.full_node.rpc_port = port;
        self
    }

    /// Set the farming settings.
    pub fn with_simulator(mut self, simulator: SimulatorSettings) -> Self {
        self.simulator = simulator;
        self
    }

    /// Port to use for the node, preferring an explicit override.
    pub fn effective_rpc_port(&self, override_port: Option<u16>) -> u16 {
        override_port.unwrap_or(self.full_node.rpc_port)
    }
}

/// Where an RPC service listens and how to authenticate to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcEndpointConfig {
    pub rpc_port: u16,

    /// Client certificate material. Plain HTTP is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<SslConfig>,
}

impl RpcEndpointConfig {
    pub fn full_node() -> Self {
        Self {
            rpc_port: DEFAULT_FULL_NODE_RPC_PORT,
            ssl: None,
        }
    }

    pub fn wallet() -> Self {
        Self {
            rpc_port: DEFAULT_WALLET_RPC_PORT,
            ssl: None,
        }
    }
}

/// Client certificate and key, relative to the simulator root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslConfig {
    pub private_crt: PathBuf,
    pub private_key: PathBuf,
}

impl SslConfig {
    /// Absolute certificate and key paths under `root_path`.
    pub fn resolve(&self, root_path: &Path) -> (PathBuf, PathBuf) {
        (
            root_path.join(&self.private_crt),
            root_path.join(&self.private_key),
        )
    }
}

/// Farming configuration of the simulator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorSettings {
    /// Farm a block whenever a transaction is submitted.
    #[serde(default = "default_true")]
    pub auto_farm: bool,

    /// Identity used for farming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_fingerprint: Option<Fingerprint>,

    /// Default reward address for farmed blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farming_address: Option<String>,

    /// Plot directory, relative to the simulator root unless absolute.
    #[serde(default = "default_plot_directory")]
    pub plot_directory: PathBuf,

    /// Use bitfield ordering when the node generates plots.
    #[serde(default = "default_true")]
    pub use_bitfield: bool,
}

fn default_true() -> bool {
    true
}

fn default_plot_directory() -> PathBuf {
    PathBuf::from("plots")
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            auto_farm: true,
            key_fingerprint: None,
            farming_address: None,
            plot_directory: default_plot_directory(),
            use_bitfield: true,
        }
    }
}

/// A program and its arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ServiceCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }
}

/// Programs launched for each logical service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceCommands {
    pub daemon: ServiceCommand,
    pub simulator: ServiceCommand,
    pub wallet: ServiceCommand,
}

impl Default for ServiceCommands {
    fn default() -> Self {
        Self {
            daemon: ServiceCommand::new("sim_daemon"),
            simulator: ServiceCommand::new("sim_full_node_simulator"),
            wallet: ServiceCommand::new("sim_wallet"),
        }
    }
}

impl ServiceCommands {
    pub fn command(&self, service: ServiceName) -> &ServiceCommand {
        match service {
            ServiceName::Daemon => &self.daemon,
            ServiceName::Simulator => &self.simulator,
            ServiceName::Wallet => &self.wallet,
        }
    }
}
