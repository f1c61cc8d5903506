//! Simulator session orchestration.
//!
//! Resolves which simulator a command targets, opens an RPC session with its
//! node, runs one control action and always releases the session. Also
//! manages the simulator's service processes and its one-time provisioning.
//!
//! Every external effect goes through an injected capability from
//! `simctl-core` ([`simctl_core::RpcConnector`],
//! [`simctl_core::ServiceSupervisor`], [`simctl_core::Confirm`],
//! [`simctl_core::Prompt`]) or a [`simctl_config::ConfigProvider`].

pub mod actions;
mod console;
mod error;
mod harness;
mod lifecycle;
mod orchestrator;
mod wizard;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use actions::{
    AddressBalance, AutoFarmAction, AutoFarmReport, CoinDetail, ControlAction, FarmAction,
    FarmReport, KeyDetail, RevertAction, RevertOutcome, RevertReport, StatusAction, StatusReport,
    WalletKeys,
};
pub use console::{is_yes, CannedConfirm, CannedPrompt, StdinConsole};
pub use error::{SessionError, WizardError};
pub use harness::{node_endpoint, wallet_endpoint, RpcHarness};
pub use lifecycle::{LifecycleStatus, ServiceManager, ServiceOutcome};
pub use orchestrator::Orchestrator;
pub use wizard::{
    create_simulator, ConfigWizard, ProvisioningWizard, WizardOutcome, WizardRequest,
};
