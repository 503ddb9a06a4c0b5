//! Shared helpers for the integration suites: a small world-state builder
//! and runners for single frames and whole transactions.

use aevm::{
    host::{CallKind, ExecutionResult, Message},
    state::{Account, EvmState, ExecutorKind, StateHost},
    transition::{self, TransactionReceipt},
    Revision,
};
use aevm_common::{
    types::{BlockInfo, Transaction},
    Address, U256,
};
use bytes::Bytes;

pub const CONTRACT: u64 = 0xc0de;
pub const SENDER: u64 = 0xca11e4;
pub const COINBASE: u64 = 0xc01bba5e;

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn contract_address() -> Address {
    addr(CONTRACT)
}

pub fn sender_address() -> Address {
    addr(SENDER)
}

/// A funded sender and a contract account holding `code`.
pub fn state_with_contract(code: &[u8]) -> EvmState {
    let mut state = EvmState::new();
    state.insert(
        sender_address(),
        Account {
            balance: U256::from(u64::MAX),
            ..Default::default()
        },
    );
    state.insert(
        contract_address(),
        Account {
            nonce: 1,
            balance: U256::from(1_000_000u64),
            code: Bytes::copy_from_slice(code),
            ..Default::default()
        },
    );
    state
}

pub fn test_block() -> BlockInfo {
    BlockInfo {
        number: 1000,
        timestamp: 1234567,
        gas_limit: 30_000_000,
        coinbase: addr(COINBASE),
        ..Default::default()
    }
}

pub fn call_tx(calldata: &[u8], gas_limit: u64) -> Transaction {
    Transaction {
        sender: sender_address(),
        to: Some(contract_address()),
        gas_limit,
        max_gas_price: U256::one(),
        max_priority_gas_price: U256::one(),
        data: Bytes::copy_from_slice(calldata),
        ..Default::default()
    }
}

/// Runs one frame of `code` against a fresh state, returning the result and
/// the post-call state.
pub fn run_frame(
    revision: Revision,
    code: &[u8],
    calldata: &[u8],
    gas: i64,
    executor: ExecutorKind,
) -> (ExecutionResult, EvmState) {
    let mut state = state_with_contract(code);
    let block = test_block();
    let tx = call_tx(calldata, 1_000_000);

    let msg = Message {
        kind: CallKind::Call,
        depth: 0,
        gas,
        recipient: contract_address(),
        sender: sender_address(),
        code_address: contract_address(),
        value: U256::zero(),
        data: Bytes::copy_from_slice(calldata),
        is_static: false,
        salt: None,
    };

    let result = {
        let mut host = StateHost::new(revision, &mut state, &block, &tx, executor);
        aevm::execute(revision, code, &msg, &mut host, executor)
    };
    (result, state)
}

/// Applies one transaction to the given state.
pub fn run_tx(
    state: &mut EvmState,
    revision: Revision,
    tx: &Transaction,
    executor: ExecutorKind,
) -> Result<TransactionReceipt, aevm::errors::TxValidationError> {
    let block = test_block();
    transition::transition(
        state,
        &block,
        tx,
        revision,
        executor,
        block.gas_limit,
        786432,
    )
}
