//! Pid-file based supervision of service processes.

use crate::signal;
use async_trait::async_trait;
use simctl_config::{ServiceCommand, ServiceCommands};
use simctl_core::{ServiceHandle, ServiceSupervisor, StopStatus, SupervisorError};
use simctl_types::ServiceName;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Environment variable telling launched services which root they serve.
pub const ROOT_PATH_ENV: &str = "SIMCTL_ROOT_PATH";

/// Configuration for process supervision.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// How long to wait for a service to exit after SIGTERM.
    pub stop_timeout: Duration,

    /// How long to watch a freshly launched service for an immediate exit.
    pub startup_grace: Duration,

    /// Interval between liveness checks while waiting.
    pub poll_interval: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(30),
            startup_grace: Duration::from_millis(250),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Launches services as detached processes rooted at one simulator root.
///
/// State lives entirely on disk under the root:
/// - `run/<service>.pid` holds the pid of a running service and, where the
///   platform reports it, the process start time
/// - `log/<service>.log` receives its stdout and stderr
///
/// A pid whose start time no longer matches belongs to another process and
/// is treated as stale.
pub struct ProcessSupervisor {
    root_path: PathBuf,
    commands: ServiceCommands,
    config: SupervisorConfig,
}

impl ProcessSupervisor {
    pub fn new(root_path: impl Into<PathBuf>, commands: ServiceCommands) -> Self {
        Self {
            root_path: root_path.into(),
            commands,
            config: SupervisorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SupervisorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn pid_path(&self, service: ServiceName) -> PathBuf {
        self.root_path.join("run").join(format!("{service}.pid"))
    }

    pub fn log_path(&self, service: ServiceName) -> PathBuf {
        self.root_path.join("log").join(format!("{service}.log"))
    }

    /// Pid of a live process for `service`, cleaning up stale pid files.
    fn live_pid(&self, service: ServiceName) -> Result<Option<u32>, SupervisorError> {
        let path = self.pid_path(service);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SupervisorError::Io { path, source }),
        };

        match PidRecord::parse(&contents) {
            Some(record) if record.is_current() => Ok(Some(record.pid)),
            _ => {
                debug!(%service, path = %path.display(), "Removing stale pid file");
                remove_file(&path)?;
                Ok(None)
            }
        }
    }

    fn spawn(
        &self,
        service: ServiceName,
        command: &ServiceCommand,
    ) -> Result<tokio::process::Child, SupervisorError> {
        let log_path = self.log_path(service);
        create_parent(&log_path)?;
        let log = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|source| SupervisorError::Io {
                path: log_path.clone(),
                source,
            })?;
        let log_err = log.try_clone().map_err(|source| SupervisorError::Io {
            path: log_path.clone(),
            source,
        })?;

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .env(ROOT_PATH_ENV, &self.root_path)
            .current_dir(&self.root_path)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(false);
        #[cfg(unix)]
        cmd.process_group(0);

        cmd.spawn().map_err(|source| SupervisorError::Spawn {
            service,
            program: command.program.clone(),
            source,
        })
    }
}

#[async_trait]
impl ServiceSupervisor for ProcessSupervisor {
    async fn is_running(&self, service: ServiceName) -> Result<bool, SupervisorError> {
        Ok(self.live_pid(service)?.is_some())
    }

    async fn start(&self, service: ServiceName) -> Result<ServiceHandle, SupervisorError> {
        if let Some(pid) = self.live_pid(service)? {
            debug!(%service, pid, "Service already running");
            return Ok(ServiceHandle {
                service,
                pid: Some(pid),
            });
        }

        let command = self.commands.command(service);
        let mut child = self.spawn(service, command)?;

        sleep(self.config.startup_grace).await;
        if let Ok(Some(status)) = child.try_wait() {
            return Err(SupervisorError::ExitedEarly {
                service,
                status: status.to_string(),
            });
        }

        let pid = child.id();
        if let Some(pid) = pid {
            let path = self.pid_path(service);
            create_parent(&path)?;
            fs::write(&path, PidRecord::of(pid).to_string())
                .map_err(|source| SupervisorError::Io { path, source })?;
        }

        info!(
            %service,
            pid,
            program = %command.program,
            log = %self.log_path(service).display(),
            "Started service"
        );
        Ok(ServiceHandle { service, pid })
    }

    async fn stop(&self, service: ServiceName) -> Result<StopStatus, SupervisorError> {
        let Some(pid) = self.live_pid(service)? else {
            debug!(%service, "Service not running");
            return Ok(StopStatus::NotRunning);
        };

        signal::terminate(pid).map_err(|e| SupervisorError::Signal {
            service,
            pid,
            message: e.to_string(),
        })?;

        let deadline = Instant::now() + self.config.stop_timeout;
        while signal::is_alive(pid) {
            if Instant::now() >= deadline {
                warn!(%service, pid, "Service ignored SIGTERM");
                return Err(SupervisorError::StopTimeout { service, pid });
            }
            sleep(self.config.poll_interval).await;
        }

        remove_file(&self.pid_path(service))?;
        info!(%service, pid, "Stopped service");
        Ok(StopStatus::Stopped)
    }
}

/// Contents of a pid file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PidRecord {
    pid: u32,
    start_time: Option<u64>,
}

impl PidRecord {
    fn of(pid: u32) -> Self {
        Self {
            pid,
            start_time: signal::start_time(pid),
        }
    }

    fn parse(contents: &str) -> Option<Self> {
        let mut fields = contents.split_whitespace();
        let pid = fields.next()?.parse().ok()?;
        let start_time = match fields.next() {
            Some(field) => Some(field.parse().ok()?),
            None => None,
        };
        Some(Self { pid, start_time })
    }

    /// Whether the recorded process is still the one running under its pid.
    fn is_current(&self) -> bool {
        if !signal::is_alive(self.pid) {
            return false;
        }
        match (signal::start_time(self.pid), self.start_time) {
            (Some(actual), Some(recorded)) => actual == recorded,
            // The platform reports start times but none was recorded.
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

impl std::fmt::Display for PidRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.start_time {
            Some(start_time) => write!(f, "{} {}", self.pid, start_time),
            None => write!(f, "{}", self.pid),
        }
    }
}

fn create_parent(path: &Path) -> Result<(), SupervisorError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SupervisorError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn remove_file(path: &Path) -> Result<(), SupervisorError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SupervisorError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
