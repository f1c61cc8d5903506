//! Starting and stopping the simulator's service processes.

use simctl_config::SimulatorConfig;
use simctl_core::{ServiceSupervisor, StopStatus};
use simctl_supervisor::ProcessSupervisor;
use simctl_types::{ServiceGroup, ServiceName, SessionContext};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// What happened to one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    Started { pid: Option<u32> },
    Restarted { pid: Option<u32> },
    AlreadyRunning,
    Stopped,
    NotRunning,
    Failed(String),
}

impl ServiceOutcome {
    /// Whether this outcome means the requested step succeeded.
    pub fn is_success(&self) -> bool {
        !matches!(self, ServiceOutcome::NotRunning | ServiceOutcome::Failed(_))
    }
}

impl fmt::Display for ServiceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceOutcome::Started { pid: Some(pid) } => write!(f, "started (pid {pid})"),
            ServiceOutcome::Started { pid: None } => f.write_str("started"),
            ServiceOutcome::Restarted { pid: Some(pid) } => write!(f, "restarted (pid {pid})"),
            ServiceOutcome::Restarted { pid: None } => f.write_str("restarted"),
            ServiceOutcome::AlreadyRunning => f.write_str("already running"),
            ServiceOutcome::Stopped => f.write_str("stopped"),
            ServiceOutcome::NotRunning => f.write_str("not running"),
            ServiceOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Per-service outcomes of a start or stop request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleStatus {
    outcomes: Vec<(ServiceName, ServiceOutcome)>,
}

impl LifecycleStatus {
    fn record(&mut self, service: ServiceName, outcome: ServiceOutcome) {
        self.outcomes.push((service, outcome));
    }

    pub fn outcomes(&self) -> &[(ServiceName, ServiceOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, service: ServiceName) -> Option<&ServiceOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| *name == service)
            .map(|(_, outcome)| outcome)
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_success())
    }

    /// Process exit code: 0 when every step succeeded, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (service, outcome)) in self.outcomes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{service}: {outcome}")?;
        }
        Ok(())
    }
}

/// Starts and stops a service group through a [`ServiceSupervisor`].
pub struct ServiceManager {
    supervisor: Arc<dyn ServiceSupervisor>,
}

impl ServiceManager {
    pub fn new(supervisor: Arc<dyn ServiceSupervisor>) -> Self {
        Self { supervisor }
    }

    /// Manager backed by OS processes under the root of `ctx`.
    pub fn for_session(ctx: &SessionContext, config: &SimulatorConfig) -> Self {
        Self::new(Arc::new(ProcessSupervisor::new(
            ctx.root_path(),
            config.services.clone(),
        )))
    }

    /// Start the daemon if needed, then every service of `group`.
    ///
    /// With `restart`, running services are stopped first. A service whose
    /// pre-stop fails is not started again. Nothing in the group is started
    /// when the daemon cannot be.
    pub async fn start(&self, group: &ServiceGroup, restart: bool) -> LifecycleStatus {
        let mut status = LifecycleStatus::default();

        let daemon = self.ensure_running(ServiceName::Daemon).await;
        let daemon_failed = !daemon.is_success();
        status.record(ServiceName::Daemon, daemon);
        if daemon_failed {
            warn!("Daemon failed to start, not starting services");
            for service in group {
                status.record(
                    *service,
                    ServiceOutcome::Failed("daemon is not running".to_string()),
                );
            }
            return status;
        }

        for service in group {
            let outcome = if restart {
                self.restart(*service).await
            } else {
                self.ensure_running(*service).await
            };
            info!(%service, %outcome, "Start requested");
            status.record(*service, outcome);
        }
        status
    }

    /// Stop every service of `group`, then the daemon when `stop_daemon`.
    pub async fn stop(&self, group: &ServiceGroup, stop_daemon: bool) -> LifecycleStatus {
        let mut status = LifecycleStatus::default();
        for service in group {
            let outcome = self.stop_one(*service).await;
            info!(%service, %outcome, "Stop requested");
            status.record(*service, outcome);
        }
        if stop_daemon {
            let outcome = self.stop_one(ServiceName::Daemon).await;
            status.record(ServiceName::Daemon, outcome);
        }
        status
    }

    async fn ensure_running(&self, service: ServiceName) -> ServiceOutcome {
        match self.supervisor.is_running(service).await {
            Ok(true) => return ServiceOutcome::AlreadyRunning,
            Ok(false) => {}
            Err(e) => return ServiceOutcome::Failed(e.to_string()),
        }
        match self.supervisor.start(service).await {
            Ok(handle) => ServiceOutcome::Started { pid: handle.pid },
            Err(e) => {
                warn!(%service, error = %e, "Failed to start service");
                ServiceOutcome::Failed(e.to_string())
            }
        }
    }

    async fn restart(&self, service: ServiceName) -> ServiceOutcome {
        let was_running = match self.supervisor.stop(service).await {
            Ok(StopStatus::Stopped) => true,
            Ok(StopStatus::NotRunning) => false,
            Err(e) => {
                warn!(%service, error = %e, "Failed to stop service for restart");
                return ServiceOutcome::Failed(e.to_string());
            }
        };
        match self.supervisor.start(service).await {
            Ok(handle) if was_running => ServiceOutcome::Restarted { pid: handle.pid },
            Ok(handle) => ServiceOutcome::Started { pid: handle.pid },
            Err(e) => ServiceOutcome::Failed(e.to_string()),
        }
    }

    async fn stop_one(&self, service: ServiceName) -> ServiceOutcome {
        match self.supervisor.stop(service).await {
            Ok(StopStatus::Stopped) => ServiceOutcome::Stopped,
            Ok(StopStatus::NotRunning) => ServiceOutcome::NotRunning,
            Err(e) => {
                warn!(%service, error = %e, "Failed to stop service");
                ServiceOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemorySupervisor, SupervisorCall};

    fn manager(supervisor: MemorySupervisor) -> (ServiceManager, Arc<MemorySupervisor>) {
        let supervisor = Arc::new(supervisor);
        (ServiceManager::new(supervisor.clone()), supervisor)
    }

    #[tokio::test]
    async fn test_start_launches_daemon_first() {
        let (manager, supervisor) = manager(MemorySupervisor::new());

        let status = manager.start(&ServiceGroup::new(true), false).await;

        assert_eq!(status.exit_code(), 0);
        assert_eq!(
            supervisor.calls(),
            vec![
                SupervisorCall::Start(ServiceName::Daemon),
                SupervisorCall::Start(ServiceName::Simulator),
                SupervisorCall::Start(ServiceName::Wallet),
            ]
        );
        assert!(supervisor.pid(ServiceName::Wallet).is_some());
    }

    #[tokio::test]
    async fn test_start_leaves_running_services() {
        let (manager, supervisor) =
            manager(MemorySupervisor::new().with_running(ServiceName::Simulator));
        let pid = supervisor.pid(ServiceName::Simulator);

        let status = manager.start(&ServiceGroup::new(false), false).await;

        assert!(status.is_success());
        assert_eq!(
            status.outcome(ServiceName::Simulator),
            Some(&ServiceOutcome::AlreadyRunning)
        );
        assert_eq!(supervisor.pid(ServiceName::Simulator), pid);
    }

    #[tokio::test]
    async fn test_restart_replaces_running_service() {
        let (manager, supervisor) = manager(
            MemorySupervisor::new()
                .with_running(ServiceName::Daemon)
                .with_running(ServiceName::Simulator),
        );
        let before = supervisor.pid(ServiceName::Simulator);

        let status = manager.start(&ServiceGroup::new(true), true).await;

        assert_eq!(status.exit_code(), 0);
        assert!(matches!(
            status.outcome(ServiceName::Simulator),
            Some(ServiceOutcome::Restarted { .. })
        ));
        assert!(matches!(
            status.outcome(ServiceName::Wallet),
            Some(ServiceOutcome::Started { .. })
        ));
        assert_ne!(supervisor.pid(ServiceName::Simulator), before);
        // The daemon is never restarted.
        assert!(!supervisor
            .calls()
            .contains(&SupervisorCall::Stop(ServiceName::Daemon)));
    }

    #[tokio::test]
    async fn test_failed_pre_stop_skips_start() {
        let (manager, supervisor) = manager(
            MemorySupervisor::new()
                .with_running(ServiceName::Simulator)
                .fail_stop(ServiceName::Simulator),
        );

        let status = manager.start(&ServiceGroup::new(false), true).await;

        assert_eq!(status.exit_code(), 1);
        assert!(!supervisor
            .calls()
            .contains(&SupervisorCall::Start(ServiceName::Simulator)));
    }

    #[tokio::test]
    async fn test_daemon_failure_blocks_group() {
        let (manager, supervisor) =
            manager(MemorySupervisor::new().fail_start(ServiceName::Daemon));

        let status = manager.start(&ServiceGroup::new(true), false).await;

        assert_eq!(status.exit_code(), 1);
        assert_eq!(supervisor.calls(), vec![SupervisorCall::Start(ServiceName::Daemon)]);
        assert_eq!(status.outcomes().len(), 3);
    }

    #[tokio::test]
    async fn test_stop_exit_code() {
        let (manager, _) = manager(
            MemorySupervisor::new()
                .with_running(ServiceName::Daemon)
                .with_running(ServiceName::Simulator),
        );
        let status = manager.stop(&ServiceGroup::new(false), true).await;
        assert_eq!(status.exit_code(), 0);
        assert_eq!(status.to_string(), "simulator: stopped\ndaemon: stopped");

        // Nothing left to stop.
        let status = manager.stop(&ServiceGroup::new(false), false).await;
        assert_ne!(status.exit_code(), 0);
        assert_eq!(
            status.outcome(ServiceName::Simulator),
            Some(&ServiceOutcome::NotRunning)
        );
    }

    #[tokio::test]
    async fn test_stop_failure_is_reported() {
        let (manager, supervisor) = manager(
            MemorySupervisor::new()
                .with_running(ServiceName::Simulator)
                .with_running(ServiceName::Wallet)
                .fail_stop(ServiceName::Wallet),
        );

        let status = manager.stop(&ServiceGroup::new(true), false).await;

        assert_eq!(status.exit_code(), 1);
        assert_eq!(
            status.outcome(ServiceName::Simulator),
            Some(&ServiceOutcome::Stopped)
        );
        assert!(matches!(
            status.outcome(ServiceName::Wallet),
            Some(ServiceOutcome::Failed(_))
        ));
        assert!(supervisor.pid(ServiceName::Daemon).is_none());
    }
}
