//! Command line arguments.

use clap::{Parser, Subcommand};
use simctl_types::{
    AutoFarmSetting, FarmParameters, Fingerprint, RevertParameters, ServiceGroup, SessionContext,
    StatusQuery,
};
use std::path::PathBuf;

/// Environment variable overriding the base directory of all simulators.
pub const ROOT_ENV: &str = "SIMCTL_ROOT";

#[derive(Debug, Parser)]
#[command(name = "simctl")]
#[command(about = "Control a local blockchain simulator")]
#[command(version)]
pub struct Cli {
    /// Full node RPC port. Read from the simulator's config when omitted
    #[arg(short = 'p', long)]
    pub rpc_port: Option<u16>,

    /// Base directory holding every simulator [default: ~/.simctl/simulator]
    #[arg(long, env = ROOT_ENV)]
    pub root_path: Option<PathBuf>,

    /// Name of the simulator to control
    #[arg(short = 'n', long, default_value = simctl_types::DEFAULT_SIMULATOR_NAME)]
    pub simulator_name: String,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Provision a new simulator
    Create {
        /// Fingerprint of the key to farm with
        #[arg(short, long)]
        fingerprint: Option<Fingerprint>,

        /// Address that receives farming rewards
        #[arg(short, long)]
        reward_address: Option<String>,

        /// Directory for plots, relative to the simulator root
        #[arg(short, long)]
        plot_directory: Option<PathBuf>,

        /// Mnemonic to import as the farming key
        #[arg(short, long)]
        mnemonic: Option<String>,

        /// Farm a block whenever a transaction is submitted
        #[arg(short, long)]
        auto_farm: Option<bool>,

        /// Never prompt
        #[arg(short, long, hide = true)]
        docker_mode: bool,

        /// Do not use bitfield ordering when generating plots
        #[arg(short = 'b', long)]
        no_bitfield: bool,
    },

    /// Start the simulator services
    Start {
        /// Restart services that are already running
        #[arg(short, long)]
        restart: bool,

        /// Also start the wallet
        #[arg(short, long)]
        wallet: bool,
    },

    /// Stop the simulator services
    Stop {
        /// Also stop the daemon
        #[arg(short, long)]
        daemon: bool,

        /// Also stop the wallet
        #[arg(short, long)]
        wallet: bool,
    },

    /// Show chain, key, coin and address information
    Status {
        /// Only show detail for this key
        #[arg(short, long)]
        fingerprint: Option<Fingerprint>,

        /// Show public keys
        #[arg(short = 'k', long)]
        show_key: bool,

        /// Show unspent coins
        #[arg(short = 'c', long)]
        show_coins: bool,

        /// Include farming rewards in the coin list
        #[arg(short = 'i', long)]
        include_rewards: bool,

        /// Show balances per address
        #[arg(short = 'a', long)]
        show_addresses: bool,
    },

    /// Revert recent blocks
    Revert {
        /// Number of blocks to revert
        #[arg(short, long, default_value_t = RevertParameters::DEFAULT_BLOCKS_BACK)]
        blocks: u32,

        /// Number of blocks to farm afterwards
        #[arg(short, long, default_value_t = RevertParameters::DEFAULT_NEW_BLOCKS)]
        new_blocks: u32,

        /// Revert to genesis
        #[arg(short, long)]
        reset: bool,

        /// Delete blocks instead of reorganizing. Breaks wallets
        #[arg(short, long)]
        force: bool,

        /// Do not ask before a forced revert
        #[arg(short, long)]
        disable_prompt: bool,
    },

    /// Farm blocks
    Farm {
        /// Number of blocks to farm
        #[arg(short, long, default_value_t = 1)]
        blocks: u32,

        /// Farm reward-only blocks and leave the mempool alone
        #[arg(short, long)]
        non_transaction: bool,

        /// Reward address [default: the node's farming address]
        #[arg(short = 'a', long, default_value = "")]
        target_address: String,
    },

    /// Turn auto farming on or off
    Autofarm {
        /// `on` or `off`
        setting: AutoFarmSetting,
    },
}

impl Cli {
    /// Base directory, falling back to `~/.simctl/simulator`.
    pub fn base_root(&self) -> PathBuf {
        self.root_path.clone().unwrap_or_else(default_root)
    }

    pub fn context(&self) -> SessionContext {
        SessionContext::resolve(self.base_root(), Some(&self.simulator_name), self.rpc_port)
    }
}

/// `~/.simctl/simulator`, or a relative `.simctl/simulator` without a home.
pub fn default_root() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".simctl")
        .join("simulator")
}

/// Farm parameters from `farm` flags.
pub fn farm_parameters(
    blocks: u32,
    non_transaction: bool,
    target_address: String,
) -> FarmParameters {
    let params = FarmParameters::new(blocks).with_target_address(target_address);
    if non_transaction {
        params.non_transaction()
    } else {
        params
    }
}

/// Revert parameters from `revert` flags.
pub fn revert_parameters(
    blocks: u32,
    new_blocks: u32,
    reset: bool,
    force: bool,
    disable_prompt: bool,
) -> RevertParameters {
    RevertParameters {
        blocks_back: blocks,
        new_blocks,
        reset,
        force,
        disable_prompt,
    }
}

/// Status query from `status` flags.
pub fn status_query(
    fingerprint: Option<Fingerprint>,
    show_key: bool,
    show_coins: bool,
    include_rewards: bool,
    show_addresses: bool,
) -> StatusQuery {
    StatusQuery {
        fingerprint,
        show_key,
        show_coins,
        include_reward_coins: include_rewards,
        show_addresses,
    }
}

/// Services addressed by `start` and `stop`.
pub fn service_group(wallet: bool) -> ServiceGroup {
    ServiceGroup::new(wallet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["simctl", "--root-path", "/srv/sims", "revert"]).unwrap();
        assert_eq!(cli.simulator_name, "main");
        assert_eq!(cli.rpc_port, None);
        assert_eq!(cli.context().root_path(), std::path::Path::new("/srv/sims/main"));

        let Commands::Revert {
            blocks,
            new_blocks,
            reset,
            force,
            disable_prompt,
        } = cli.command
        else {
            panic!("expected revert");
        };
        let params = revert_parameters(blocks, new_blocks, reset, force, disable_prompt);
        assert_eq!(params, RevertParameters::default());
    }

    #[test]
    fn test_top_level_options() {
        let cli = Cli::try_parse_from([
            "simctl", "-p", "9000", "-n", "alt", "--root-path", "/srv", "farm", "-b", "3", "-n",
        ])
        .unwrap();
        assert_eq!(cli.context().rpc_port(), Some(9000));
        assert_eq!(cli.context().simulator_name(), "alt");

        let Commands::Farm {
            blocks,
            non_transaction,
            target_address,
        } = cli.command
        else {
            panic!("expected farm");
        };
        let params = farm_parameters(blocks, non_transaction, target_address);
        assert_eq!(params.block_count, 3);
        assert!(!params.as_transaction_block);
        assert_eq!(params.target_address(), None);
    }

    #[test]
    fn test_autofarm_requires_on_or_off() {
        let cli = Cli::try_parse_from(["simctl", "autofarm", "OFF"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Autofarm {
                setting: AutoFarmSetting::Off
            }
        ));
        assert!(Cli::try_parse_from(["simctl", "autofarm", "maybe"]).is_err());
        assert!(Cli::try_parse_from(["simctl", "autofarm"]).is_err());
    }

    #[test]
    fn test_create_flags() {
        let cli = Cli::try_parse_from([
            "simctl", "create", "-f", "1234", "-a", "false", "-d", "-b",
        ])
        .unwrap();
        let Commands::Create {
            fingerprint,
            auto_farm,
            docker_mode,
            no_bitfield,
            ..
        } = cli.command
        else {
            panic!("expected create");
        };
        assert_eq!(fingerprint, Some(Fingerprint(1234)));
        assert_eq!(auto_farm, Some(false));
        assert!(docker_mode);
        assert!(no_bitfield);
    }
}
