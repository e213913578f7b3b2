//! Integration test crate for the vETH accounting core.
//!
//! This crate has no library code. It only contains integration tests
//! that exercise end-to-end flows across the ledger, the withdrawal queue
//! and the vesting vault.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p veth-integration-tests
//! ```
