//! # veth-types
//!
//! Shared domain types used across the vETH workspace.

pub mod access;
pub mod address;
pub mod capability;
pub mod events;
pub mod time;

pub use access::{AccessError, AccessGate, Role};
pub use address::{Address, AddressError};
pub use capability::{LegacyToken, LiquiditySink, TokenError, VoucherToken};
pub use events::Event;
pub use veth_math::Amount;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Burn destination for retired legacy tokens.
pub const DEAD_ADDRESS: Address = Address::new([
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0xde, 0xad,
]);
