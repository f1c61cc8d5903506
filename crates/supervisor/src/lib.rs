//! OS process supervision for simulator services.
//!
//! [`ProcessSupervisor`] implements [`simctl_core::ServiceSupervisor`] by
//! launching each service's configured program in its own process group and
//! tracking it through a pid file under the simulator root.

mod process;
mod signal;

pub use process::{ProcessSupervisor, SupervisorConfig, ROOT_PATH_ENV};
