//! Persisted simulator configuration.
//!
//! Each simulator root holds a `config.yaml`. The orchestrator never reads
//! the file directly; it goes through a [`ConfigProvider`] so tests can
//! substitute an in-memory configuration.

mod config;
mod provider;

pub use config::{
    RpcEndpointConfig, ServiceCommand, ServiceCommands, SimulatorConfig, SimulatorSettings,
    SslConfig, DEFAULT_FULL_NODE_RPC_PORT, DEFAULT_WALLET_RPC_PORT,
};
pub use provider::{
    config_path, load_config, parse_config, save_config, ConfigError, ConfigProvider,
    StaticConfigProvider, YamlConfigProvider, CONFIG_FILE_NAME,
};
