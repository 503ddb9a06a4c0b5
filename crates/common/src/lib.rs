//! Shared primitive types for the aevm execution engine.
//!
//! This crate carries everything the VM core and its embedders have in
//! common: the 256-bit word type and its signed/modular arithmetic, the
//! revision (hard fork) enumeration, and the transaction/block data model.

pub mod arith;
pub mod constants;
pub mod revision;
pub mod types;
pub mod utils;

pub use ethereum_types::{H160, H256, U256, U512};
pub use revision::Revision;

/// A 20-byte account address.
pub type Address = H160;
