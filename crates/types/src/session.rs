//! Simulator session identity.

use std::path::{Path, PathBuf};

/// Name used when no simulator name is supplied.
pub const DEFAULT_SIMULATOR_NAME: &str = "main";

/// A concrete on-disk simulator instance targeted by one command invocation.
///
/// `root_path` is always `base_root / simulator_name`. When `rpc_port` is
/// `None`, the port is read from the simulator's configuration at the time
/// a session is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    root_path: PathBuf,
    simulator_name: String,
    rpc_port: Option<u16>,
}

impl SessionContext {
    /// Resolve a session context from user-supplied identifiers.
    ///
    /// Performs no I/O. Whether the resolved directory holds a provisioned
    /// simulator is discovered later, when its configuration is loaded.
    pub fn resolve(
        base_root: impl AsRef<Path>,
        simulator_name: Option<&str>,
        rpc_port: Option<u16>,
    ) -> Self {
        let simulator_name = simulator_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SIMULATOR_NAME)
            .to_string();
        Self {
            root_path: base_root.as_ref().join(&simulator_name),
            simulator_name,
            rpc_port,
        }
    }

    /// Directory holding this simulator's configuration and state.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn simulator_name(&self) -> &str {
        &self.simulator_name
    }

    /// Explicit RPC port override, if any.
    pub fn rpc_port(&self) -> Option<u16> {
        self.rpc_port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_joins_name_onto_base() {
        let ctx = SessionContext::resolve("/tmp/sims", Some("alt"), Some(9000));
        assert_eq!(ctx.root_path(), Path::new("/tmp/sims/alt"));
        assert_eq!(ctx.simulator_name(), "alt");
        assert_eq!(ctx.rpc_port(), Some(9000));
    }

    #[test]
    fn test_resolve_defaults_name() {
        let ctx = SessionContext::resolve("/tmp/sims", None, None);
        assert_eq!(ctx.simulator_name(), DEFAULT_SIMULATOR_NAME);
        assert_eq!(ctx.root_path(), Path::new("/tmp/sims/main"));

        let blank = SessionContext::resolve("/tmp/sims", Some("  "), None);
        assert_eq!(blank, ctx);
    }
}
