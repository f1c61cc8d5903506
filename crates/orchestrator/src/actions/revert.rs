//! Chain reversion.

use super::ControlAction;
use crate::SessionError;
use async_trait::async_trait;
use simctl_core::{Confirm, SimulatorRpc};
use simctl_types::{BlockHeight, InputError, RevertParameters};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Question asked before force-deleting blocks.
pub const FORCE_REVERT_PROMPT: &str =
    "WARNING: force reverting deletes blocks outright and will break wallets. Continue? (y/n): ";

/// Revert recent blocks, optionally farming replacements.
///
/// Pre-conditions are checked before any RPC call: `reset` is exclusive with
/// a custom depth, and `force` needs an explicit `y` unless the prompt is
/// disabled. Both checks can be run up front with [`RevertAction::prepare`].
pub struct RevertAction {
    params: RevertParameters,
    confirm: Arc<dyn Confirm>,
    confirmed: bool,
}

/// Result of a revert action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertOutcome {
    Reverted(RevertReport),
    /// The user did not confirm a forced revert. Nothing was changed.
    Declined,
}

/// Heights before and after a revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertReport {
    pub params: RevertParameters,
    pub previous_height: BlockHeight,
    pub new_height: BlockHeight,
}

impl fmt::Display for RevertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.params.force {
            "Deleted"
        } else {
            "Reverted"
        };
        if self.params.reset {
            writeln!(
                f,
                "{verb} all blocks down to genesis from height {}",
                self.previous_height
            )?;
        } else {
            writeln!(
                f,
                "{verb} {} block(s) from height {}",
                self.params.blocks_back, self.previous_height
            )?;
        }
        if self.params.new_blocks > 0 {
            writeln!(f, "Farmed {} new block(s)", self.params.new_blocks)?;
        }
        write!(f, "New chain height: {}", self.new_height)
    }
}

impl fmt::Display for RevertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevertOutcome::Reverted(report) => report.fmt(f),
            RevertOutcome::Declined => f.write_str("Revert cancelled"),
        }
    }
}

impl RevertAction {
    pub fn new(params: RevertParameters, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            params,
            confirm,
            confirmed: false,
        }
    }

    pub fn params(&self) -> &RevertParameters {
        &self.params
    }

    /// Run the local pre-conditions.
    ///
    /// Returns `Ok(None)` when the user declined, `Ok(Some(self))` when the
    /// action may proceed. A prepared action does not ask again.
    pub fn prepare(mut self) -> Result<Option<Self>, InputError> {
        if self.confirmed {
            return Ok(Some(self));
        }
        self.params.validate()?;
        if self.params.requires_confirmation() && !self.confirm.confirm(FORCE_REVERT_PROMPT) {
            warn!("Forced revert declined");
            return Ok(None);
        }
        self.confirmed = true;
        Ok(Some(self))
    }
}

#[async_trait]
impl ControlAction for RevertAction {
    type Output = RevertOutcome;

    fn name(&self) -> &'static str {
        "revert"
    }

    async fn execute(self, rpc: &dyn SimulatorRpc) -> Result<RevertOutcome, SessionError> {
        let Some(action) = self.prepare()? else {
            return Ok(RevertOutcome::Declined);
        };
        let params = action.params;

        let previous_height = rpc.get_blockchain_state().await?.peak_height();
        let new_height = rpc
            .revert_blocks(
                params.blocks_back,
                params.new_blocks,
                params.reset,
                params.force,
            )
            .await?;

        info!(
            previous = previous_height.0,
            height = new_height.0,
            reset = params.reset,
            force = params.force,
            "Reverted chain"
        );

        Ok(RevertOutcome::Reverted(RevertReport {
            params,
            previous_height,
            new_height,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::CannedConfirm;
    use crate::testing::MockNode;

    fn confirm(answer: &str) -> Arc<CannedConfirm> {
        Arc::new(CannedConfirm::new(answer))
    }

    async fn revert(node: &MockNode, params: RevertParameters, answer: &str) -> RevertOutcome {
        let session = node.session();
        RevertAction::new(params, confirm(answer))
            .execute(&session)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_revert_then_farm_new_blocks() {
        let node = MockNode::new().with_height(100);

        let outcome = revert(&node, RevertParameters::new(5, 1), "").await;
        let RevertOutcome::Reverted(report) = outcome else {
            panic!("expected a revert");
        };
        assert_eq!(report.previous_height, BlockHeight(100));
        assert_eq!(report.new_height, BlockHeight(96));
        assert_eq!(node.height(), BlockHeight(96));
    }

    #[tokio::test]
    async fn test_reset_to_genesis() {
        let node = MockNode::new().with_height(42);

        let outcome = revert(&node, RevertParameters::reset(), "").await;
        assert!(matches!(
            outcome,
            RevertOutcome::Reverted(RevertReport { new_height: BlockHeight(1), .. })
        ));
        assert_eq!(node.height(), BlockHeight(1));
    }

    #[tokio::test]
    async fn test_reset_with_blocks_makes_no_rpc() {
        let node = MockNode::new().with_height(10);
        let session = node.session();
        let params = RevertParameters {
            blocks_back: 3,
            ..RevertParameters::reset()
        };

        let err = RevertAction::new(params, confirm("y"))
            .execute(&session)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::InvalidInput(InputError::ResetWithBlocks { blocks_back: 3 })
        ));
        assert_eq!(node.rpc_calls(), 0);
        assert_eq!(node.height(), BlockHeight(10));
    }

    #[tokio::test]
    async fn test_force_requires_explicit_yes() {
        for answer in ["", "n", "yes", "Y", "no"] {
            let node = MockNode::new().with_height(10);
            let canned = confirm(answer);
            let session = node.session();

            let outcome = RevertAction::new(
                RevertParameters::new(2, 0).with_force(false),
                canned.clone(),
            )
            .execute(&session)
            .await
            .unwrap();

            assert_eq!(outcome, RevertOutcome::Declined, "answer {answer:?}");
            assert_eq!(canned.prompts().len(), 1);
            assert_eq!(node.rpc_calls(), 0);
        }

        let node = MockNode::new().with_height(10);
        let outcome = revert(&node, RevertParameters::new(2, 0).with_force(false), "y").await;
        assert!(matches!(outcome, RevertOutcome::Reverted(_)));
        assert_eq!(node.height(), BlockHeight(8));
    }

    #[tokio::test]
    async fn test_disable_prompt_skips_confirmation() {
        let node = MockNode::new().with_height(10);
        let canned = confirm("n");
        let session = node.session();

        let params = RevertParameters::new(1, 1).with_force(true);
        let outcome = RevertAction::new(params, canned.clone())
            .execute(&session)
            .await
            .unwrap();

        assert!(matches!(outcome, RevertOutcome::Reverted(_)));
        assert!(canned.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_unforced_revert_never_prompts() {
        let node = MockNode::new().with_height(3);
        let canned = confirm("n");
        let session = node.session();

        RevertAction::new(RevertParameters::default(), canned.clone())
            .execute(&session)
            .await
            .unwrap();
        assert!(canned.prompts().is_empty());
    }

    #[test]
    fn test_prepared_action_does_not_ask_twice() {
        let canned = confirm("y");
        let params = RevertParameters::new(1, 1).with_force(false);
        let action = RevertAction::new(params, canned.clone())
            .prepare()
            .unwrap()
            .unwrap();
        assert!(action.prepare().unwrap().is_some());
        assert_eq!(canned.prompts().len(), 1);
    }
}
