use crate::Address;
use ethereum_types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An ommer (uncle) header reference, used for the pre-merge block reward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ommer {
    pub beneficiary: Address,
    /// Difference between the including block number and the ommer's.
    pub delta: u32,
}

/// A validator withdrawal ([EIP-4895]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub index: u64,
    pub validator_index: u64,
    pub recipient: Address,
    pub amount_in_gwei: u64,
}

impl Withdrawal {
    /// Withdrawal amount in wei.
    pub fn amount(&self) -> U256 {
        U256::from(self.amount_in_gwei) * U256::from(1_000_000_000u64)
    }
}

/// Execution context of the block the transaction belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub base_fee: U256,
    pub coinbase: Address,
    pub prev_randao: H256,
    pub difficulty: U256,
    pub excess_blob_gas: u64,
    pub ommers: Vec<Ommer>,
    pub withdrawals: Vec<Withdrawal>,
    /// Hashes of recent ancestor blocks, keyed by number, for BLOCKHASH.
    pub known_block_hashes: HashMap<u64, H256>,
}
