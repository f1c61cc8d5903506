//! Core types for the simulator control surface.
//!
//! Everything here is plain data: session identity, action parameters,
//! service names and the chain/wallet shapes returned by the node. No
//! module in this crate performs I/O.

pub mod address;
mod chain;
mod hash;
mod identifiers;
mod params;
mod service;
mod session;

pub use address::{decode_address, decode_address_for, encode_address, AddressError};
pub use chain::{
    BlockchainState, Coin, CoinRecord, KeyInfo, NetworkInfo, PeakInfo, PuzzleHashBalance,
    SyncState,
};
pub use hash::{Bytes32, HexError};
pub use identifiers::{BlockHeight, Fingerprint};
pub use params::{AutoFarmSetting, FarmParameters, InputError, RevertParameters, StatusQuery};
pub use service::{ServiceGroup, ServiceName};
pub use session::{SessionContext, DEFAULT_SIMULATOR_NAME};
