//! Auto farming toggle.

use super::ControlAction;
use crate::SessionError;
use async_trait::async_trait;
use simctl_core::SimulatorRpc;
use simctl_types::AutoFarmSetting;
use std::fmt;
use tracing::info;

/// Enable or disable farming a block per submitted transaction.
#[derive(Debug, Clone, Copy)]
pub struct AutoFarmAction {
    setting: AutoFarmSetting,
}

impl AutoFarmAction {
    pub fn new(setting: AutoFarmSetting) -> Self {
        Self { setting }
    }
}

/// State reported by the node after the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoFarmReport {
    pub requested: AutoFarmSetting,
    pub current: AutoFarmSetting,
}

impl fmt::Display for AutoFarmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Auto farming is now {}", self.current)
    }
}

#[async_trait]
impl ControlAction for AutoFarmAction {
    type Output = AutoFarmReport;

    fn name(&self) -> &'static str {
        "autofarm"
    }

    async fn execute(self, rpc: &dyn SimulatorRpc) -> Result<AutoFarmReport, SessionError> {
        let enabled = rpc.set_auto_farming(self.setting.is_enabled()).await?;
        let current = AutoFarmSetting::from(enabled);
        info!(%current, "Set auto farming");
        Ok(AutoFarmReport {
            requested: self.setting,
            current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockNode;

    #[tokio::test]
    async fn test_setting_twice_is_idempotent() {
        let node = MockNode::new();
        let session = node.session();

        for _ in 0..2 {
            let report = AutoFarmAction::new(AutoFarmSetting::On)
                .execute(&session)
                .await
                .unwrap();
            assert_eq!(report.current, AutoFarmSetting::On);
            assert!(node.auto_farm());
        }

        let report = AutoFarmAction::new(AutoFarmSetting::Off)
            .execute(&session)
            .await
            .unwrap();
        assert_eq!(report.to_string(), "Auto farming is now off");
        assert!(!node.auto_farm());
    }
}
