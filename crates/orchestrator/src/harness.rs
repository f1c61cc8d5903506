//! Connect, run one action, release.

use crate::actions::{ControlAction, WalletKeys};
use crate::SessionError;
use simctl_config::{ConfigError, ConfigProvider, SimulatorConfig};
use simctl_core::{RpcConnector, RpcEndpoint, SimulatorRpc};
use simctl_types::SessionContext;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs control actions against the node of a simulator.
///
/// Each run opens exactly one session and closes it before returning,
/// whether the action succeeded or not.
#[derive(Clone)]
pub struct RpcHarness {
    config: Arc<dyn ConfigProvider>,
    connector: Arc<dyn RpcConnector>,
}

impl RpcHarness {
    pub fn new(config: Arc<dyn ConfigProvider>, connector: Arc<dyn RpcConnector>) -> Self {
        Self { config, connector }
    }

    /// Configuration of the simulator at `ctx`.
    ///
    /// An explicit port override lets the harness reach a node whose root
    /// was never provisioned; defaults fill in the rest.
    pub fn load_config(&self, ctx: &SessionContext) -> Result<SimulatorConfig, SessionError> {
        match self.config.load(ctx.root_path()) {
            Ok(config) => Ok(config),
            Err(ConfigError::NotProvisioned { path }) if ctx.rpc_port().is_some() => {
                debug!(path = %path.display(), "No configuration, using defaults");
                Ok(SimulatorConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Node endpoint for `ctx`.
    pub fn node_endpoint(&self, ctx: &SessionContext) -> Result<RpcEndpoint, SessionError> {
        let config = self.load_config(ctx)?;
        Ok(node_endpoint(ctx, &config))
    }

    /// Key lookup through the wallet service of `ctx`.
    pub fn wallet_keys(&self, ctx: &SessionContext) -> Result<WalletKeys, SessionError> {
        let config = self.load_config(ctx)?;
        Ok(WalletKeys::new(self.connector.clone(), wallet_endpoint(ctx, &config)))
    }

    /// Open a session with the node of `ctx`.
    ///
    /// A transport failure while connecting becomes
    /// [`SessionError::NodeNotRunning`]. Unreadable client certificates are
    /// reported as [`SessionError::Tls`].
    pub async fn connect(
        &self,
        ctx: &SessionContext,
    ) -> Result<Box<dyn SimulatorRpc>, SessionError> {
        let endpoint = self.node_endpoint(ctx)?;
        match self.connector.connect_node(&endpoint).await {
            Ok(session) => {
                debug!(simulator = ctx.simulator_name(), %endpoint, "Opened session");
                Ok(session)
            }
            Err(e) if e.is_transport() => Err(SessionError::NodeNotRunning {
                host: endpoint.host,
                port: endpoint.port,
                source: e,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Run `action` against the node.
    ///
    /// When the node cannot be reached, fails with
    /// [`SessionError::NodeNotRunning`] if `must_be_running`, otherwise logs
    /// a warning and returns `Ok(None)` without running the action.
    pub async fn run<A: ControlAction>(
        &self,
        ctx: &SessionContext,
        action: A,
        must_be_running: bool,
    ) -> Result<Option<A::Output>, SessionError> {
        let session = match self.connect(ctx).await {
            Ok(session) => session,
            Err(SessionError::NodeNotRunning { host, port, source }) if !must_be_running => {
                warn!(
                    action = action.name(),
                    %host,
                    port,
                    error = %source,
                    "Simulator not reachable, skipping"
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        execute(session, action).await.map(Some)
    }

    /// Run `action` against a node that must be running.
    pub async fn run_required<A: ControlAction>(
        &self,
        ctx: &SessionContext,
        action: A,
    ) -> Result<A::Output, SessionError> {
        let session = self.connect(ctx).await?;
        execute(session, action).await
    }
}

/// Run `action` once and release `session` regardless of the outcome.
async fn execute<A: ControlAction>(
    mut session: Box<dyn SimulatorRpc>,
    action: A,
) -> Result<A::Output, SessionError> {
    let name = action.name();
    debug!(action = name, "Running action");
    let result = action.execute(session.as_ref()).await;
    session.close().await;
    if let Err(e) = &result {
        debug!(action = name, error = %e, "Action failed");
    }
    result
}

/// Endpoint of the full node described by `config`, honoring the port
/// override of `ctx`. TLS material is resolved against the root path.
pub fn node_endpoint(ctx: &SessionContext, config: &SimulatorConfig) -> RpcEndpoint {
    let endpoint = RpcEndpoint::new(
        config.self_hostname.clone(),
        config.effective_rpc_port(ctx.rpc_port()),
    );
    match &config.full_node.ssl {
        Some(ssl) => {
            let (certificate, private_key) = ssl.resolve(ctx.root_path());
            endpoint.with_tls(certificate, private_key)
        }
        None => endpoint,
    }
}

/// Wallet endpoint described by `config`.
pub fn wallet_endpoint(ctx: &SessionContext, config: &SimulatorConfig) -> RpcEndpoint {
    let endpoint = RpcEndpoint::new(config.self_hostname.clone(), config.wallet.rpc_port);
    match &config.wallet.ssl {
        Some(ssl) => {
            let (certificate, private_key) = ssl.resolve(ctx.root_path());
            endpoint.with_tls(certificate, private_key)
        }
        None => endpoint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{AutoFarmAction, FarmAction, RevertAction, StatusAction};
    use crate::console::CannedConfirm;
    use crate::testing::{MockConnector, MockFailure, MockNode};
    use simctl_config::{SslConfig, StaticConfigProvider, YamlConfigProvider};
    use simctl_types::{
        AutoFarmSetting, BlockHeight, FarmParameters, InputError, RevertParameters, StatusQuery,
    };
    use tracing_test::traced_test;

    fn harness(node: &MockNode) -> RpcHarness {
        RpcHarness::new(
            Arc::new(StaticConfigProvider::default()),
            Arc::new(MockConnector::new(node.clone())),
        )
    }

    fn ctx() -> SessionContext {
        SessionContext::resolve("/tmp/simctl-test", None, None)
    }

    #[tokio::test]
    async fn test_farm_releases_session_once() {
        let node = MockNode::new().with_height(7);
        let report = harness(&node)
            .run(&ctx(), FarmAction::new(FarmParameters::new(3)), true)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.new_height, BlockHeight(10));
        assert_eq!(node.sessions_opened(), 1);
        assert_eq!(node.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_node_must_be_running() {
        let node = MockNode::new();
        node.set_reachable(false);

        let err = harness(&node)
            .run(&ctx(), AutoFarmAction::new(AutoFarmSetting::On), true)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::NodeNotRunning { port: 8555, .. }
        ));
        assert!(err.is_transport());
        assert_eq!(node.sessions_opened(), 0);
        assert_eq!(node.rpc_calls(), 0);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_unreachable_node_may_be_skipped() {
        let node = MockNode::new();
        node.set_reachable(false);

        let output = harness(&node)
            .run(&ctx(), StatusAction::new(StatusQuery::default()), false)
            .await
            .unwrap();

        assert!(output.is_none());
        assert_eq!(node.rpc_calls(), 0);
        assert!(logs_contain("Simulator not reachable"));
    }

    #[tokio::test]
    async fn test_release_on_every_path() {
        let node = MockNode::new();
        let harness = harness(&node);
        let confirm = Arc::new(CannedConfirm::new("n"));

        for i in 0..100u32 {
            node.set_failure(match i % 4 {
                1 => Some(MockFailure::Transport),
                2 => Some(MockFailure::Rejected("boom".to_string())),
                _ => None,
            });

            let result = match i % 5 {
                0 => harness
                    .run(&ctx(), FarmAction::new(FarmParameters::new(1)), true)
                    .await
                    .map(|_| ()),
                1 => harness
                    .run(
                        &ctx(),
                        AutoFarmAction::new(AutoFarmSetting::from(i % 2 == 0)),
                        true,
                    )
                    .await
                    .map(|_| ()),
                2 => harness
                    .run(&ctx(), StatusAction::new(StatusQuery::default()), true)
                    .await
                    .map(|_| ()),
                3 => harness
                    .run(
                        &ctx(),
                        RevertAction::new(
                            RevertParameters::new(1, 1).with_force(false),
                            confirm.clone(),
                        ),
                        true,
                    )
                    .await
                    .map(|_| ()),
                _ => harness
                    .run(&ctx(), FarmAction::new(FarmParameters::new(0)), true)
                    .await
                    .map(|_| ()),
            };

            match (i % 4, i % 5) {
                // Declined reverts and invalid input never touch the node.
                (_, 3) => assert!(result.is_ok()),
                (_, 4) => assert!(matches!(result, Err(SessionError::InvalidInput(_)))),
                (1, _) => assert!(matches!(result, Err(SessionError::Transport(_)))),
                (2, _) => assert!(matches!(result, Err(SessionError::Action(_)))),
                _ => assert!(result.is_ok(), "iteration {i}: {result:?}"),
            }
            assert_eq!(node.open_sessions(), 0, "iteration {i}");
        }
        assert_eq!(node.sessions_opened(), 100);
        assert_eq!(node.sessions_closed(), 100);
    }

    #[tokio::test]
    async fn test_action_error_keeps_node_message() {
        let node = MockNode::new();
        node.set_failure(Some(MockFailure::Rejected("Invalid address".to_string())));

        let err = harness(&node)
            .run(
                &ctx(),
                FarmAction::new(FarmParameters::new(1).with_target_address("x")),
                true,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "farm_block failed: Invalid address");
        assert_eq!(node.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_still_releases() {
        let node = MockNode::new();
        let params = RevertParameters {
            blocks_back: 2,
            ..RevertParameters::reset()
        };
        let err = harness(&node)
            .run(&ctx(), RevertAction::new(params, Arc::new(CannedConfirm::yes())), true)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::InvalidInput(InputError::ResetWithBlocks { .. })
        ));
        assert_eq!(node.rpc_calls(), 0);
        assert_eq!(node.open_sessions(), 0);
    }

    #[test]
    fn test_endpoint_resolution() {
        let config = SimulatorConfig::default().with_rpc_port(18555);
        let root = SessionContext::resolve("/srv/sims", Some("alt"), None);
        assert_eq!(node_endpoint(&root, &config).port, 18555);

        let overridden = SessionContext::resolve("/srv/sims", Some("alt"), Some(9000));
        assert_eq!(node_endpoint(&overridden, &config).port, 9000);

        let mut tls = config.clone();
        tls.full_node.ssl = Some(SslConfig {
            private_crt: "ssl/node.crt".into(),
            private_key: "ssl/node.key".into(),
        });
        let endpoint = node_endpoint(&root, &tls);
        assert_eq!(endpoint.scheme(), "https");
        let identity = endpoint.tls.unwrap();
        assert_eq!(identity.certificate, root.root_path().join("ssl/node.crt"));

        assert_eq!(wallet_endpoint(&root, &config).port, 9256);
    }

    #[tokio::test]
    async fn test_missing_certificate_is_not_node_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SimulatorConfig::default();
        config.full_node.ssl = Some(SslConfig {
            private_crt: "ssl/missing.crt".into(),
            private_key: "ssl/missing.key".into(),
        });
        simctl_config::save_config(dir.path(), &config).unwrap();

        let node = MockNode::new();
        let harness = RpcHarness::new(
            Arc::new(YamlConfigProvider),
            Arc::new(MockConnector::new(node.clone())),
        );
        let ctx = SessionContext::resolve(dir.path(), None, None);

        let err = harness
            .run_required(&ctx, FarmAction::new(FarmParameters::new(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Tls(_)), "unexpected error: {err:?}");
        assert!(!err.is_transport());
        assert!(err.to_string().contains("missing.crt"));
        assert_eq!(node.sessions_opened(), 0);

        // Skipping applies to unreachable nodes, not to broken local setup.
        let err = harness
            .run(&ctx, StatusAction::new(StatusQuery::default()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Tls(_)));
    }

    #[test]
    fn test_port_override_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let node = MockNode::new();
        let harness = RpcHarness::new(
            Arc::new(YamlConfigProvider),
            Arc::new(MockConnector::new(node)),
        );

        let unprovisioned = SessionContext::resolve(dir.path(), None, None);
        assert!(matches!(
            harness.node_endpoint(&unprovisioned),
            Err(SessionError::Config(ConfigError::NotProvisioned { .. }))
        ));

        let overridden = SessionContext::resolve(dir.path(), None, Some(8123));
        assert_eq!(harness.node_endpoint(&overridden).unwrap().port, 8123);
    }
}
