//! Parameters for the control actions.
//!
//! Every parameter object is built from user input for a single command,
//! passed by value into one action and dropped afterwards.

use crate::Fingerprint;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A problem with user-supplied parameters, detected before any external call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("blocks must not be set when resetting the chain to genesis")]
    ResetWithBlocks { blocks_back: u32 },

    #[error("block count must be at least 1")]
    ZeroBlocks,

    #[error("use either a fingerprint or a mnemonic, not both")]
    FingerprintAndMnemonic,

    #[error("expected 'on' or 'off', got {0:?}")]
    InvalidAutoFarm(String),
}

/// Parameters for producing blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmParameters {
    /// Number of blocks to produce.
    pub block_count: u32,

    /// When false, only reward blocks are produced and the mempool is left
    /// untouched.
    pub as_transaction_block: bool,

    /// Reward address. Empty means the node's configured farming address.
    pub target_address: String,
}

impl Default for FarmParameters {
    fn default() -> Self {
        Self {
            block_count: 1,
            as_transaction_block: true,
            target_address: String::new(),
        }
    }
}

impl FarmParameters {
    pub fn new(block_count: u32) -> Self {
        Self {
            block_count,
            ..Default::default()
        }
    }

    /// Produce reward-only blocks.
    pub fn non_transaction(mut self) -> Self {
        self.as_transaction_block = false;
        self
    }

    pub fn with_target_address(mut self, address: impl Into<String>) -> Self {
        self.target_address = address.into();
        self
    }

    /// Reward address to send, `None` when deferring to the node.
    pub fn target_address(&self) -> Option<&str> {
        let address = self.target_address.trim();
        (!address.is_empty()).then_some(address)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.block_count == 0 {
            return Err(InputError::ZeroBlocks);
        }
        Ok(())
    }
}

/// Parameters for reverting the chain.
///
/// `reset` and a non-default `blocks_back` are two ways of choosing the
/// revert depth; supplying both is rejected by [`RevertParameters::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertParameters {
    /// Number of most recent blocks to remove.
    pub blocks_back: u32,

    /// Number of blocks produced after the revert, simulating a reorg.
    pub new_blocks: u32,

    /// Revert all the way to genesis.
    pub reset: bool,

    /// Delete blocks outright instead of reorganizing. Breaks wallets.
    pub force: bool,

    /// Skip the confirmation normally required by `force`.
    pub disable_prompt: bool,
}

impl RevertParameters {
    pub const DEFAULT_BLOCKS_BACK: u32 = 1;
    pub const DEFAULT_NEW_BLOCKS: u32 = 1;

    pub fn new(blocks_back: u32, new_blocks: u32) -> Self {
        Self {
            blocks_back,
            new_blocks,
            ..Default::default()
        }
    }

    /// Revert to genesis.
    pub fn reset() -> Self {
        Self {
            reset: true,
            ..Default::default()
        }
    }

    pub fn with_force(mut self, disable_prompt: bool) -> Self {
        self.force = true;
        self.disable_prompt = disable_prompt;
        self
    }

    /// Whether an interactive confirmation is needed before reverting.
    pub fn requires_confirmation(&self) -> bool {
        self.force && !self.disable_prompt
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.reset && self.blocks_back != Self::DEFAULT_BLOCKS_BACK {
            return Err(InputError::ResetWithBlocks {
                blocks_back: self.blocks_back,
            });
        }
        Ok(())
    }
}

impl Default for RevertParameters {
    fn default() -> Self {
        Self {
            blocks_back: Self::DEFAULT_BLOCKS_BACK,
            new_blocks: Self::DEFAULT_NEW_BLOCKS,
            reset: false,
            force: false,
            disable_prompt: false,
        }
    }
}

/// Whether the node farms a block on every submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoFarmSetting {
    On,
    Off,
}

impl AutoFarmSetting {
    pub fn is_enabled(self) -> bool {
        matches!(self, AutoFarmSetting::On)
    }
}

impl From<bool> for AutoFarmSetting {
    fn from(enabled: bool) -> Self {
        if enabled {
            AutoFarmSetting::On
        } else {
            AutoFarmSetting::Off
        }
    }
}

impl FromStr for AutoFarmSetting {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(AutoFarmSetting::On),
            "off" => Ok(AutoFarmSetting::Off),
            _ => Err(InputError::InvalidAutoFarm(s.to_string())),
        }
    }
}

impl fmt::Display for AutoFarmSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoFarmSetting::On => f.write_str("on"),
            AutoFarmSetting::Off => f.write_str("off"),
        }
    }
}

/// Independent detail toggles for the status report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusQuery {
    /// Restrict key, coin and address detail to this identity.
    pub fingerprint: Option<Fingerprint>,
    pub show_key: bool,
    pub show_coins: bool,
    /// Include farming reward coins in the coin listing.
    pub include_reward_coins: bool,
    pub show_addresses: bool,
}
