//! Entry points for the control commands.

use crate::actions::{
    AutoFarmAction, AutoFarmReport, FarmAction, FarmReport, RevertAction, RevertOutcome,
    StatusAction, StatusReport,
};
use crate::{RpcHarness, SessionError};
use simctl_core::Confirm;
use simctl_types::{AutoFarmSetting, FarmParameters, RevertParameters, SessionContext, StatusQuery};
use std::sync::Arc;

/// Runs control commands for one invocation.
///
/// Local pre-conditions are checked before a session is opened, so rejected
/// or declined commands never reach the network.
#[derive(Clone)]
pub struct Orchestrator {
    harness: RpcHarness,
    confirm: Arc<dyn Confirm>,
}

impl Orchestrator {
    pub fn new(harness: RpcHarness, confirm: Arc<dyn Confirm>) -> Self {
        Self { harness, confirm }
    }

    pub fn harness(&self) -> &RpcHarness {
        &self.harness
    }

    pub async fn farm(
        &self,
        ctx: &SessionContext,
        params: FarmParameters,
    ) -> Result<FarmReport, SessionError> {
        params.validate()?;
        self.harness.run_required(ctx, FarmAction::new(params)).await
    }

    pub async fn revert(
        &self,
        ctx: &SessionContext,
        params: RevertParameters,
    ) -> Result<RevertOutcome, SessionError> {
        let Some(action) = RevertAction::new(params, self.confirm.clone()).prepare()? else {
            return Ok(RevertOutcome::Declined);
        };
        self.harness.run_required(ctx, action).await
    }

    pub async fn autofarm(
        &self,
        ctx: &SessionContext,
        setting: AutoFarmSetting,
    ) -> Result<AutoFarmReport, SessionError> {
        self.harness
            .run_required(ctx, AutoFarmAction::new(setting))
            .await
    }

    pub async fn status(
        &self,
        ctx: &SessionContext,
        query: StatusQuery,
    ) -> Result<StatusReport, SessionError> {
        let wallet = self.harness.wallet_keys(ctx)?;
        self.harness
            .run_required(ctx, StatusAction::new(query).with_wallet(wallet))
            .await
    }
}
