//! One-time provisioning of a simulator root.

use crate::harness::wallet_endpoint;
use crate::WizardError;
use async_trait::async_trait;
use simctl_config::{load_config, save_config, ConfigError, SimulatorConfig};
use simctl_core::{Prompt, RpcConnector};
use simctl_types::{decode_address, Fingerprint, InputError, SessionContext};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Answers supplied on the command line. Anything left `None` is taken from
/// an existing configuration or asked interactively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardRequest {
    pub fingerprint: Option<Fingerprint>,
    pub reward_address: Option<String>,
    pub plot_directory: Option<PathBuf>,
    pub mnemonic: Option<String>,
    pub auto_farm: Option<bool>,
    /// Never prompt.
    pub docker_mode: bool,
    pub use_bitfield: bool,
}

impl Default for WizardRequest {
    fn default() -> Self {
        Self {
            fingerprint: None,
            reward_address: None,
            plot_directory: None,
            mnemonic: None,
            auto_farm: None,
            docker_mode: false,
            use_bitfield: true,
        }
    }
}

impl WizardRequest {
    /// Reject combinations that name the farming identity twice.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.fingerprint.is_some() && self.mnemonic.is_some() {
            return Err(InputError::FingerprintAndMnemonic);
        }
        Ok(())
    }
}

/// A provisioned simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardOutcome {
    pub config_path: PathBuf,
    pub config: SimulatorConfig,
    /// Fingerprint of a key imported from a mnemonic.
    pub imported_fingerprint: Option<Fingerprint>,
}

impl fmt::Display for WizardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = &self.config.simulator;
        writeln!(f, "Configuration written to {}", self.config_path.display())?;
        if let Some(fingerprint) = self.imported_fingerprint {
            writeln!(f, "  Imported key: {fingerprint}")?;
        }
        match settings.key_fingerprint {
            Some(fingerprint) => writeln!(f, "  Farming key: {fingerprint}")?,
            None => writeln!(f, "  Farming key: node default")?,
        }
        match &settings.farming_address {
            Some(address) => writeln!(f, "  Reward address: {address}")?,
            None => writeln!(f, "  Reward address: node default")?,
        }
        writeln!(f, "  Plot directory: {}", settings.plot_directory.display())?;
        write!(
            f,
            "  Auto farming: {}",
            if settings.auto_farm { "on" } else { "off" }
        )
    }
}

/// Sets up the configuration of a new simulator.
#[async_trait]
pub trait ProvisioningWizard: Send + Sync {
    async fn provision(
        &self,
        ctx: &SessionContext,
        request: WizardRequest,
    ) -> Result<WizardOutcome, WizardError>;
}

/// Validate `request` locally, then hand it to `wizard`.
pub async fn create_simulator(
    wizard: &dyn ProvisioningWizard,
    ctx: &SessionContext,
    request: WizardRequest,
) -> Result<WizardOutcome, WizardError> {
    request.validate()?;
    info!(
        simulator = ctx.simulator_name(),
        root = %ctx.root_path().display(),
        "Provisioning simulator"
    );
    wizard.provision(ctx, request).await
}

/// Writes `config.yaml` and the plot directory, asking for missing answers.
///
/// Mnemonics are imported through the wallet service, which must be
/// reachable at the configured wallet endpoint.
pub struct ConfigWizard {
    prompt: Arc<dyn Prompt>,
    connector: Arc<dyn RpcConnector>,
}

impl ConfigWizard {
    pub fn new(prompt: Arc<dyn Prompt>, connector: Arc<dyn RpcConnector>) -> Self {
        Self { prompt, connector }
    }

    fn ask(&self, request: &WizardRequest, question: &str) -> Option<String> {
        if request.docker_mode {
            return None;
        }
        self.prompt.ask(question)
    }

    async fn import_mnemonic(
        &self,
        ctx: &SessionContext,
        config: &SimulatorConfig,
        mnemonic: &str,
    ) -> Result<Fingerprint, WizardError> {
        let endpoint = wallet_endpoint(ctx, config);
        let mut wallet = self
            .connector
            .connect_wallet(&endpoint)
            .await
            .map_err(WizardError::KeyImport)?;
        let result = wallet.add_key(mnemonic).await;
        wallet.close().await;
        let fingerprint = result.map_err(WizardError::KeyImport)?;
        info!(%fingerprint, "Imported key from mnemonic");
        Ok(fingerprint)
    }
}

#[async_trait]
impl ProvisioningWizard for ConfigWizard {
    async fn provision(
        &self,
        ctx: &SessionContext,
        request: WizardRequest,
    ) -> Result<WizardOutcome, WizardError> {
        request.validate()?;
        let root = ctx.root_path();

        let mut config = match load_config(root) {
            Ok(config) => {
                debug!(root = %root.display(), "Updating existing configuration");
                config
            }
            Err(ConfigError::NotProvisioned { .. }) => SimulatorConfig::default(),
            Err(e) => return Err(e.into()),
        };

        let imported_fingerprint = match &request.mnemonic {
            Some(mnemonic) => Some(self.import_mnemonic(ctx, &config, mnemonic).await?),
            None => None,
        };

        let fingerprint = match request.fingerprint.or(imported_fingerprint) {
            Some(fingerprint) => Some(fingerprint),
            None => match config.simulator.key_fingerprint {
                Some(existing) => Some(existing),
                None => self
                    .ask(
                        &request,
                        "Fingerprint of the key to farm with (blank for the node default): ",
                    )
                    .map(|answer| {
                        answer
                            .parse::<Fingerprint>()
                            .map_err(|_| WizardError::InvalidFingerprint(answer))
                    })
                    .transpose()?,
            },
        };

        let reward_address = match request.reward_address.clone() {
            Some(address) => Some(address),
            None => match config.simulator.farming_address.clone() {
                Some(existing) => Some(existing),
                None => self.ask(
                    &request,
                    "Address to send farming rewards to (blank for the farming key): ",
                ),
            },
        };
        if let Some(address) = &reward_address {
            decode_address(address).map_err(|source| WizardError::InvalidAddress {
                address: address.clone(),
                source,
            })?;
        }

        if let Some(plot_directory) = request.plot_directory {
            config.simulator.plot_directory = plot_directory;
        }
        let plots = root.join(&config.simulator.plot_directory);
        fs::create_dir_all(&plots).map_err(|source| WizardError::Io {
            path: plots.clone(),
            source,
        })?;

        config.simulator.key_fingerprint = fingerprint;
        config.simulator.farming_address = reward_address;
        if let Some(auto_farm) = request.auto_farm {
            config.simulator.auto_farm = auto_farm;
        }
        config.simulator.use_bitfield = request.use_bitfield;

        let config_path = save_config(root, &config)?;
        info!(path = %config_path.display(), "Wrote simulator configuration");

        Ok(WizardOutcome {
            config_path,
            config,
            imported_fingerprint,
        })
    }
}
