//! The `simctl` command line.
//!
//! [`run`] executes one parsed command against an [`Environment`] of
//! injected capabilities and returns the process exit code. The binary
//! wires in the real RPC client, process supervisor and terminal; tests
//! wire in the in-memory doubles from `simctl-orchestrator`.

pub mod args;

pub use args::{Cli, Commands};

use args::{farm_parameters, revert_parameters, service_group, status_query};
use simctl_config::{ConfigError, ConfigProvider, SimulatorConfig, YamlConfigProvider};
use simctl_core::{Confirm, Prompt, RpcConnector, ServiceSupervisor};
use simctl_orchestrator::{
    create_simulator, ConfigWizard, Orchestrator, RevertOutcome, RpcHarness, ServiceManager,
    SessionError, StdinConsole, WizardRequest,
};
use simctl_rpc::HttpRpcConnector;
use simctl_types::SessionContext;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

/// Capabilities a command runs with.
#[derive(Clone)]
pub struct Environment {
    pub config: Arc<dyn ConfigProvider>,
    pub connector: Arc<dyn RpcConnector>,
    pub confirm: Arc<dyn Confirm>,
    pub prompt: Arc<dyn Prompt>,
    /// Supervisor to use for `start` and `stop`. When `None`, OS processes
    /// are supervised under the simulator root.
    pub supervisor: Option<Arc<dyn ServiceSupervisor>>,
}

impl Environment {
    /// Real configuration files, HTTP RPC, OS processes and the terminal.
    pub fn production() -> Self {
        let console = Arc::new(StdinConsole);
        Self {
            config: Arc::new(YamlConfigProvider),
            connector: Arc::new(HttpRpcConnector::new()),
            confirm: console.clone(),
            prompt: console,
            supervisor: None,
        }
    }

    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            RpcHarness::new(self.config.clone(), self.connector.clone()),
            self.confirm.clone(),
        )
    }

    fn service_manager(&self, ctx: &SessionContext, config: &SimulatorConfig) -> ServiceManager {
        match &self.supervisor {
            Some(supervisor) => ServiceManager::new(supervisor.clone()),
            None => ServiceManager::for_session(ctx, config),
        }
    }
}

/// Exit code for a failed command.
pub const EXIT_FAILURE: u8 = 1;

/// Run `cli` and return the exit code.
///
/// Reports go to `out`; expected failures are printed to stderr and turned
/// into a non-zero exit code. An `Err` means `out` could not be written.
pub async fn run(cli: Cli, env: &Environment, out: &mut dyn Write) -> anyhow::Result<u8> {
    let ctx = cli.context();
    debug!(
        simulator = ctx.simulator_name(),
        root = %ctx.root_path().display(),
        port = ?ctx.rpc_port(),
        "Resolved simulator"
    );

    match cli.command {
        Commands::Create {
            fingerprint,
            reward_address,
            plot_directory,
            mnemonic,
            auto_farm,
            docker_mode,
            no_bitfield,
        } => {
            let request = WizardRequest {
                fingerprint,
                reward_address,
                plot_directory,
                mnemonic,
                auto_farm,
                docker_mode,
                use_bitfield: !no_bitfield,
            };
            let wizard = ConfigWizard::new(env.prompt.clone(), env.connector.clone());
            match create_simulator(&wizard, &ctx, request).await {
                Ok(outcome) => {
                    writeln!(out, "Simulator '{}' created", ctx.simulator_name())?;
                    writeln!(out, "{outcome}")?;
                    Ok(0)
                }
                Err(e) => Ok(failure(&e)),
            }
        }

        Commands::Start { restart, wallet } => {
            let config = match env.config.load(ctx.root_path()) {
                Ok(config) => config,
                Err(e) => return Ok(failure(&e)),
            };
            let status = env
                .service_manager(&ctx, &config)
                .start(&service_group(wallet), restart)
                .await;
            writeln!(out, "{status}")?;
            Ok(status.exit_code())
        }

        Commands::Stop { daemon, wallet } => {
            // Stopping only needs the pid files, so a missing config is fine.
            let config = match env.config.load(ctx.root_path()) {
                Ok(config) => config,
                Err(ConfigError::NotProvisioned { .. }) => SimulatorConfig::default(),
                Err(e) => return Ok(failure(&e)),
            };
            let status = env
                .service_manager(&ctx, &config)
                .stop(&service_group(wallet), daemon)
                .await;
            writeln!(out, "{status}")?;
            Ok(status.exit_code())
        }

        Commands::Status {
            fingerprint,
            show_key,
            show_coins,
            include_rewards,
            show_addresses,
        } => {
            let query = status_query(
                fingerprint,
                show_key,
                show_coins,
                include_rewards,
                show_addresses,
            );
            report(out, env.orchestrator().status(&ctx, query).await)
        }

        Commands::Revert {
            blocks,
            new_blocks,
            reset,
            force,
            disable_prompt,
        } => {
            let params = revert_parameters(blocks, new_blocks, reset, force, disable_prompt);
            match env.orchestrator().revert(&ctx, params).await {
                Ok(RevertOutcome::Declined) => {
                    writeln!(out, "{}", RevertOutcome::Declined)?;
                    Ok(0)
                }
                result => report(out, result),
            }
        }

        Commands::Farm {
            blocks,
            non_transaction,
            target_address,
        } => {
            let params = farm_parameters(blocks, non_transaction, target_address);
            report(out, env.orchestrator().farm(&ctx, params).await)
        }

        Commands::Autofarm { setting } => {
            report(out, env.orchestrator().autofarm(&ctx, setting).await)
        }
    }
}

fn report<T: std::fmt::Display>(
    out: &mut dyn Write,
    result: Result<T, SessionError>,
) -> anyhow::Result<u8> {
    match result {
        Ok(report) => {
            writeln!(out, "{report}")?;
            Ok(0)
        }
        Err(e) => Ok(failure(&e)),
    }
}

fn failure(err: &dyn std::error::Error) -> u8 {
    eprintln!("Error: {err}");
    EXIT_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use simctl_config::StaticConfigProvider;
    use simctl_orchestrator::testing::{MemorySupervisor, MockConnector, MockNode};
    use simctl_orchestrator::{CannedConfirm, CannedPrompt};
    use simctl_types::{BlockHeight, ServiceName};

    struct Harness {
        node: MockNode,
        supervisor: Arc<MemorySupervisor>,
        prompt: Arc<CannedPrompt>,
        env: Environment,
    }

    fn harness(node: MockNode, supervisor: MemorySupervisor, confirm: &str) -> Harness {
        let supervisor = Arc::new(supervisor);
        let prompt = Arc::new(CannedPrompt::new(Vec::<Option<String>>::new()));
        let env = Environment {
            config: Arc::new(StaticConfigProvider::new(SimulatorConfig::default())),
            connector: Arc::new(MockConnector::new(node.clone())),
            confirm: Arc::new(CannedConfirm::new(confirm)),
            prompt: prompt.clone(),
            supervisor: Some(supervisor.clone()),
        };
        Harness {
            node,
            supervisor,
            prompt,
            env,
        }
    }

    async fn exec(env: &Environment, args: &[&str]) -> (u8, String) {
        let mut argv = vec!["simctl", "--root-path", "/tmp/simctl-cli-test"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        let code = run(cli, env, &mut out).await.unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_farm_command() {
        let h = harness(MockNode::new(), MemorySupervisor::new(), "");
        let (code, out) = exec(&h.env, &["farm", "-b", "3"]).await;

        assert_eq!(code, 0);
        assert!(out.contains("New chain height: 3"), "{out}");
        assert_eq!(h.node.height(), BlockHeight(3));
        assert_eq!(h.node.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_invalid_revert_exits_before_rpc() {
        let h = harness(MockNode::new().with_height(9), MemorySupervisor::new(), "y");
        let (code, out) = exec(&h.env, &["revert", "--reset", "-b", "3"]).await;

        assert_eq!(code, EXIT_FAILURE);
        assert!(out.is_empty());
        assert_eq!(h.node.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_declined_revert_exits_cleanly() {
        let h = harness(MockNode::new().with_height(9), MemorySupervisor::new(), "n");
        let (code, out) = exec(&h.env, &["revert", "-f"]).await;

        assert_eq!(code, 0);
        assert_eq!(out.trim(), "Revert cancelled");
        assert_eq!(h.node.height(), BlockHeight(9));
    }

    #[tokio::test]
    async fn test_unreachable_node_fails() {
        let h = harness(MockNode::new(), MemorySupervisor::new(), "");
        h.node.set_reachable(false);
        let (code, _) = exec(&h.env, &["status"]).await;
        assert_eq!(code, EXIT_FAILURE);
    }

    #[tokio::test]
    async fn test_stop_propagates_exit_code() {
        let h = harness(
            MockNode::new(),
            MemorySupervisor::new().with_running(ServiceName::Simulator),
            "",
        );
        let (code, out) = exec(&h.env, &["stop"]).await;
        assert_eq!(code, 0);
        assert_eq!(out.trim(), "simulator: stopped");

        let (code, _) = exec(&h.env, &["stop", "--wallet"]).await;
        assert_ne!(code, 0);
    }

    #[tokio::test]
    async fn test_start_with_wallet() {
        let h = harness(MockNode::new(), MemorySupervisor::new(), "");
        let (code, _) = exec(&h.env, &["start", "-w"]).await;

        assert_eq!(code, 0);
        assert!(h.supervisor.pid(ServiceName::Daemon).is_some());
        assert!(h.supervisor.pid(ServiceName::Wallet).is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_fingerprint_with_mnemonic() {
        let h = harness(MockNode::new(), MemorySupervisor::new(), "");
        let (code, out) = exec(&h.env, &["create", "-f", "1", "-m", "some words"]).await;

        assert_eq!(code, EXIT_FAILURE);
        assert!(out.is_empty());
        assert!(h.prompt.questions().is_empty());
        assert_eq!(h.node.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_create_writes_config() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(MockNode::new(), MemorySupervisor::new(), "");
        let root = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["simctl", "--root-path", root, "-n", "dev", "create", "-d"])
            .unwrap();

        let mut out = Vec::new();
        let code = run(cli, &h.env, &mut out).await.unwrap();

        assert_eq!(code, 0);
        assert!(dir.path().join("dev").join("config.yaml").is_file());
        assert!(String::from_utf8(out).unwrap().contains("Simulator 'dev' created"));
    }
}
