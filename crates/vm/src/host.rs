//! The boundary between the execution core and world state.
//!
//! The interpreter and the translated programs never touch accounts
//! directly; every outward effect goes through [`Host`]. The transition
//! driver provides the canonical implementation over the journaled state
//! (`state::StateHost`); embedders and tests may substitute their own.

use crate::errors::StatusCode;
use aevm_common::{Address, H256, U256};
use bytes::Bytes;

/// Kind of a message call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    DelegateCall,
    CallCode,
    Create,
    Create2,
}

/// A message triggering one frame of execution.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: CallKind,
    pub depth: u32,
    pub gas: i64,
    pub recipient: Address,
    pub sender: Address,
    /// Address the executed code belongs to. Differs from `recipient` for
    /// DELEGATECALL and CALLCODE.
    pub code_address: Address,
    pub value: U256,
    pub data: Bytes,
    pub is_static: bool,
    /// CREATE2 salt.
    pub salt: Option<H256>,
}

/// Result of one frame of execution.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: StatusCode,
    /// Remaining gas; zero unless the status keeps gas.
    pub gas_left: i64,
    /// Accrued refund; zero unless the frame succeeded.
    pub gas_refund: i64,
    pub output: Bytes,
    /// Address of the created contract, when the message was a create.
    pub create_address: Option<Address>,
}

impl ExecutionResult {
    pub fn failure(status: StatusCode) -> Self {
        Self {
            status,
            gas_left: 0,
            gas_refund: 0,
            output: Bytes::new(),
            create_address: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Transaction-level context, memoized per frame on first use.
#[derive(Debug, Clone, Default)]
pub struct TxContext {
    /// Effective gas price of the transaction.
    pub gas_price: U256,
    pub origin: Address,
    pub coinbase: Address,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub block_gas_limit: u64,
    pub prev_randao: H256,
    pub chain_id: U256,
    pub base_fee: U256,
    pub blob_base_fee: U256,
    pub blob_hashes: Vec<H256>,
}

/// Cold/warm access status ([EIP-2929]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessStatus {
    #[default]
    Cold,
    Warm,
}

/// Effect of a storage write, per [EIP-2200]/[EIP-3529] transition naming.
/// The letters in the comments are the (original, current, new) values; `0`
/// is zero, distinct letters are distinct non-zero values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStatus {
    /// The write is a no-op: the new value equals the current one.
    Unchanged,
    /// Any dirty transition not covered by a more specific status.
    Assigned,
    /// 0 -> 0 -> Z
    Added,
    /// X -> X -> 0
    Deleted,
    /// X -> X -> Z
    Modified,
    /// X -> 0 -> Z
    DeletedAdded,
    /// X -> Y -> 0
    ModifiedDeleted,
    /// X -> 0 -> X
    DeletedRestored,
    /// 0 -> Y -> 0
    AddedDeleted,
    /// X -> Y -> X
    ModifiedRestored,
}

/// Capability set the execution core consumes.
pub trait Host {
    /// True if the account exists; from Spurious Dragon empty accounts are
    /// reported as non-existent.
    fn account_exists(&self, address: Address) -> bool;

    fn get_balance(&self, address: Address) -> U256;
    fn get_code_size(&self, address: Address) -> usize;
    fn get_code_hash(&self, address: Address) -> H256;
    /// Copies code starting at `code_offset` into `buffer`, returning the
    /// number of bytes written. Out-of-range reads copy nothing.
    fn copy_code(&self, address: Address, code_offset: usize, buffer: &mut [u8]) -> usize;

    fn get_storage(&self, address: Address, key: U256) -> U256;
    fn set_storage(&mut self, address: Address, key: U256, value: U256) -> StorageStatus;

    fn get_transient_storage(&self, address: Address, key: U256) -> U256;
    fn set_transient_storage(&mut self, address: Address, key: U256, value: U256);

    /// Marks the address warm, returning its previous status.
    fn access_account(&mut self, address: Address) -> AccessStatus;
    /// Marks the storage slot warm, returning its previous status.
    fn access_storage(&mut self, address: Address, key: U256) -> AccessStatus;

    fn emit_log(&mut self, address: Address, data: &[u8], topics: &[H256]);

    /// Transfers the remaining balance to the beneficiary and schedules the
    /// account for destruction. Returns true if this was the first
    /// destruction of `address` in this transaction.
    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> bool;

    /// Executes a nested message (calls, creates and precompiles).
    fn call(&mut self, msg: &Message) -> ExecutionResult;

    fn get_tx_context(&self) -> TxContext;

    /// Hash of an ancestor block, or zero when unknown. The 256-block
    /// window rule is enforced by the BLOCKHASH instruction, not here.
    fn get_block_hash(&self, block_number: u64) -> H256;
}
