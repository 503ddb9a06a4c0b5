//! Whole-transaction behaviour: validation, fee settlement, refunds,
//! destructs and the journaled revert.

mod common;

use aevm::{
    errors::{StatusCode, TxValidationError},
    host::{CallKind, Host, Message, StorageStatus},
    state::{Account, EvmState, ExecutorKind, StateHost},
    utils::{calculate_create2_address, calculate_create_address},
    Revision,
};
use aevm_common::{
    types::{Transaction, TxType},
    utils::keccak,
    Address, H256, U256,
};
use bytes::Bytes;
use common::{addr, call_tx, run_tx, sender_address, state_with_contract, test_block};

#[test]
fn plain_transfer_costs_the_base_fee() {
    let mut state = EvmState::new();
    state.insert(
        sender_address(),
        Account {
            balance: U256::from(10_000_000u64),
            ..Default::default()
        },
    );
    let recipient = addr(0xbeef);
    let tx = Transaction {
        sender: sender_address(),
        to: Some(recipient),
        gas_limit: 100_000,
        value: U256::from(1234),
        max_gas_price: U256::from(1),
        max_priority_gas_price: U256::from(1),
        ..Default::default()
    };

    let receipt = run_tx(&mut state, Revision::Cancun, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.status, StatusCode::Success);
    assert_eq!(receipt.gas_used, 21000);
    assert_eq!(state.find(&recipient).unwrap().balance, U256::from(1234));
    assert_eq!(
        state.find(&sender_address()).unwrap().balance,
        U256::from(10_000_000u64 - 1234 - 21000)
    );
    assert_eq!(state.find(&sender_address()).unwrap().nonce, 1);
}

#[test]
fn sstore_fresh_slot_at_istanbul() {
    // Seed scenario: SSTORE 0 -> 1; the slot is created, no refund.
    // PUSH1 1 PUSH1 0 SSTORE STOP
    let code = hex::decode("600160005500").unwrap();
    let mut state = state_with_contract(&code);
    let tx = call_tx(&[], 100_000);

    let receipt = run_tx(&mut state, Revision::Istanbul, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.status, StatusCode::Success);
    // Intrinsic + two pushes + storage creation; no refund.
    assert_eq!(receipt.gas_used, 21000 + 6 + 20000);
    let slot = state.find(&common::contract_address()).unwrap().storage[&U256::zero()];
    assert_eq!(slot.current, U256::one());
    // The original value is re-baselined for the next transaction.
    assert_eq!(slot.original, U256::one());
}

#[test]
fn storage_status_derivation() {
    let mut state = state_with_contract(&[]);
    let contract = common::contract_address();
    state.find_mut(&contract).unwrap().storage.insert(
        U256::one(),
        aevm::state::StorageValue {
            current: U256::one(),
            original: U256::one(),
            ..Default::default()
        },
    );
    let block = test_block();
    let tx = call_tx(&[], 100_000);
    let mut host = StateHost::new(
        Revision::Istanbul,
        &mut state,
        &block,
        &tx,
        ExecutorKind::Baseline,
    );

    // Fresh slot: 0 -> 0 -> 1.
    assert_eq!(
        host.set_storage(contract, U256::zero(), U256::one()),
        StorageStatus::Added
    );
    // 1 -> 1 -> 0, then 1 -> 0 -> 2, then 1 -> 2 -> 1, then a no-op.
    assert_eq!(
        host.set_storage(contract, U256::one(), U256::zero()),
        StorageStatus::Deleted
    );
    assert_eq!(
        host.set_storage(contract, U256::one(), U256::from(2)),
        StorageStatus::DeletedAdded
    );
    assert_eq!(
        host.set_storage(contract, U256::one(), U256::one()),
        StorageStatus::ModifiedRestored
    );
    assert_eq!(
        host.set_storage(contract, U256::one(), U256::one()),
        StorageStatus::Unchanged
    );
}

#[test]
fn sstore_clear_then_restore_balances_the_refund_ledger() {
    // Seed scenario: 1 -> 0 followed by 0 -> 1 in the same transaction.
    //   PUSH1 0 PUSH1 0 SSTORE   (Deleted: 5000, refund +15000)
    //   PUSH1 1 PUSH1 0 SSTORE   (DeletedRestored: 800, refund -15000 + 4200)
    //   STOP
    let code = hex::decode("60006000556001600055 00".replace(' ', "")).unwrap();
    let mut state = state_with_contract(&code);
    state.find_mut(&common::contract_address()).unwrap().storage.insert(
        U256::zero(),
        aevm::state::StorageValue {
            current: U256::one(),
            original: U256::one(),
            ..Default::default()
        },
    );
    let tx = call_tx(&[], 100_000);

    let receipt = run_tx(&mut state, Revision::Istanbul, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.status, StatusCode::Success);
    // Four pushes, a reset and a dirty restore; the net refund is the
    // restore credit of 4200 (under the cap of gas_used / 2).
    assert_eq!(receipt.gas_used, 21000 + 12 + 5000 + 800 - 4200);
    let slot = state.find(&common::contract_address()).unwrap().storage[&U256::zero()];
    assert_eq!(slot.current, U256::one());
}

#[test]
fn refund_is_capped_by_the_quotient() {
    // Clearing a slot refunds 15000 at Istanbul, capped at gas_used / 2.
    // PUSH1 0 PUSH1 0 SSTORE STOP
    let code = hex::decode("600060005500").unwrap();
    let make_state = || {
        let mut state = state_with_contract(&code);
        state.find_mut(&common::contract_address()).unwrap().storage.insert(
            U256::zero(),
            aevm::state::StorageValue {
                current: U256::one(),
                original: U256::one(),
                ..Default::default()
            },
        );
        state
    };
    let tx = call_tx(&[], 100_000);

    // Istanbul: 26006 consumed, refund capped at 13003.
    let mut state = make_state();
    let receipt = run_tx(&mut state, Revision::Istanbul, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.gas_used, 26006 - 13003);

    // London: the cold slot costs as much, but the refund itself is 4800
    // and the cap divisor is 5.
    let mut state = make_state();
    let receipt = run_tx(&mut state, Revision::London, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.gas_used, 26006 - 4800);
}

#[test]
fn call_depth_limit() {
    // Seed scenario: the 1024th nested call fails with CallDepthExceeded
    // and the outer frame continues.
    // PUSH0 x5 ADDRESS GAS CALL; store the flag and return it.
    let code = hex::decode("5f5f5f5f5f305af15f5260205ff3").unwrap();
    let mut state = state_with_contract(&code);
    let block = test_block();
    let tx = call_tx(&[], 1_000_000);

    let run_at_depth = |state: &mut EvmState, depth| {
        let msg = Message {
            kind: CallKind::Call,
            depth,
            gas: 200_000,
            recipient: common::contract_address(),
            sender: sender_address(),
            code_address: common::contract_address(),
            value: U256::zero(),
            data: Bytes::new(),
            is_static: false,
            salt: None,
        };
        let mut host = StateHost::new(Revision::Cancun, state, &block, &tx, ExecutorKind::Baseline);
        host.call(&msg)
    };

    // At depth 1023 the nested call (depth 1024) still runs; its own call
    // attempt is the one that fails, so it returns the failure flag.
    let result = run_at_depth(&mut state, 1023);
    assert_eq!(result.status, StatusCode::Success);
    assert_eq!(U256::from_big_endian(&result.output), U256::one());

    // A frame at depth 1024 observes the failed sub-call directly.
    let result = run_at_depth(&mut state, 1024);
    assert_eq!(result.status, StatusCode::Success);
    assert_eq!(U256::from_big_endian(&result.output), U256::zero());
}

#[test]
fn create2_collision() {
    // Seed scenario: CREATE2 lands on an address that already has a nonce.
    let initcode = Bytes::new();
    let collision = calculate_create2_address(
        common::contract_address(),
        keccak(&initcode),
        H256::zero(),
    );

    let mut state = state_with_contract(&[]);
    state.insert(
        collision,
        Account {
            nonce: 7,
            ..Default::default()
        },
    );
    let block = test_block();
    let tx = call_tx(&[], 1_000_000);
    let mut host = StateHost::new(
        Revision::Cancun,
        &mut state,
        &block,
        &tx,
        ExecutorKind::Baseline,
    );

    let msg = Message {
        kind: CallKind::Create2,
        depth: 1,
        gas: 100_000,
        recipient: Address::zero(),
        sender: common::contract_address(),
        code_address: Address::zero(),
        value: U256::zero(),
        data: initcode,
        is_static: false,
        salt: Some(H256::zero()),
    };
    let result = host.call(&msg);
    assert_eq!(result.status, StatusCode::OutOfGas);
    assert_eq!(result.gas_left, 0);
    assert_eq!(result.create_address, Some(collision));
    // The collided account is untouched.
    assert_eq!(state.find(&collision).unwrap().nonce, 7);
}

#[test]
fn blob_transaction_with_too_many_blobs() {
    // Seed scenario: seven blob hashes exceed the per-transaction limit.
    let mut state = EvmState::new();
    state.insert(
        sender_address(),
        Account {
            balance: U256::MAX / 2,
            ..Default::default()
        },
    );
    let tx = Transaction {
        tx_type: TxType::Blob,
        sender: sender_address(),
        to: Some(addr(0xbeef)),
        gas_limit: 100_000,
        max_gas_price: U256::from(1),
        max_priority_gas_price: U256::from(1),
        max_blob_gas_price: U256::from(1),
        blob_hashes: {
            let mut hash = [0u8; 32];
            hash[0] = 0x01;
            vec![H256(hash); 7]
        },
        ..Default::default()
    };

    let err = run_tx(&mut state, Revision::Cancun, &tx, ExecutorKind::Baseline).unwrap_err();
    assert_eq!(err, TxValidationError::BlobHashesListSizeLimitExceeded);
    // State unchanged: balance intact, nonce not bumped.
    assert_eq!(state.find(&sender_address()).unwrap().balance, U256::MAX / 2);
    assert_eq!(state.find(&sender_address()).unwrap().nonce, 0);
}

#[test]
fn blob_transaction_happy_path() {
    let mut state = EvmState::new();
    state.insert(
        sender_address(),
        Account {
            balance: U256::from(u64::MAX),
            ..Default::default()
        },
    );
    let mut hash = [0u8; 32];
    hash[0] = 0x01;
    let tx = Transaction {
        tx_type: TxType::Blob,
        sender: sender_address(),
        to: Some(addr(0xbeef)),
        gas_limit: 100_000,
        max_gas_price: U256::from(1),
        max_priority_gas_price: U256::from(1),
        max_blob_gas_price: U256::from(1),
        blob_hashes: vec![H256(hash), H256(hash)],
        ..Default::default()
    };

    let receipt = run_tx(&mut state, Revision::Cancun, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.status, StatusCode::Success);
    assert_eq!(receipt.blob_gas_used, 2 * 131072);
    // The blob fee is burned on top of the execution fee.
    assert_eq!(
        state.find(&sender_address()).unwrap().balance,
        U256::from(u64::MAX - 21000 - 2 * 131072)
    );
}

#[test]
fn validation_error_taxonomy() {
    let mut state = EvmState::new();
    state.insert(
        sender_address(),
        Account {
            balance: U256::from(10_000_000u64),
            nonce: 5,
            ..Default::default()
        },
    );

    let base_tx = Transaction {
        sender: sender_address(),
        to: Some(addr(1_000)),
        gas_limit: 100_000,
        nonce: 5,
        ..Default::default()
    };

    let run = |state: &mut EvmState, tx: &Transaction| {
        run_tx(state, Revision::Cancun, tx, ExecutorKind::Baseline).unwrap_err()
    };

    let tx = Transaction { nonce: 7, ..base_tx.clone() };
    assert_eq!(run(&mut state, &tx), TxValidationError::NonceTooHigh);

    let tx = Transaction { nonce: 3, ..base_tx.clone() };
    assert_eq!(run(&mut state, &tx), TxValidationError::NonceTooLow);

    let tx = Transaction {
        value: U256::from(u64::MAX),
        ..base_tx.clone()
    };
    assert_eq!(run(&mut state, &tx), TxValidationError::InsufficientFunds);

    let tx = Transaction { gas_limit: 20_000, ..base_tx.clone() };
    assert_eq!(run(&mut state, &tx), TxValidationError::IntrinsicGasTooLow);

    let tx = Transaction {
        gas_limit: 40_000_000,
        ..base_tx.clone()
    };
    assert_eq!(run(&mut state, &tx), TxValidationError::GasLimitReached);

    let tx = Transaction {
        tx_type: TxType::Eip1559,
        max_gas_price: U256::from(5),
        max_priority_gas_price: U256::from(6),
        ..base_tx.clone()
    };
    assert_eq!(run(&mut state, &tx), TxValidationError::TipGreaterThanFeeCap);

    let tx = Transaction {
        tx_type: TxType::Blob,
        ..base_tx.clone()
    };
    assert_eq!(
        run_tx(&mut state, Revision::London, &tx, ExecutorKind::Baseline).unwrap_err(),
        TxValidationError::TxTypeNotSupported
    );

    // A contract sender is rejected ([EIP-3607]).
    state.find_mut(&sender_address()).unwrap().code = Bytes::from_static(&[0x00]);
    assert_eq!(run(&mut state, &base_tx), TxValidationError::SenderNotEoa);
}

#[test]
fn reverted_transaction_keeps_fee_and_nonce() {
    // PUSH1 1 PUSH1 0 SSTORE PUSH0 PUSH0 REVERT
    let code = hex::decode("6001600055 5f5f fd".replace(' ', "")).unwrap();
    let mut state = state_with_contract(&code);
    let balance_before = state.find(&sender_address()).unwrap().balance;
    let tx = call_tx(&[], 100_000);

    let receipt = run_tx(&mut state, Revision::Cancun, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.status, StatusCode::Revert);

    // The write was rolled back, but gas was paid and the nonce advanced.
    let contract = state.find(&common::contract_address()).unwrap();
    assert!(contract
        .storage
        .get(&U256::zero())
        .is_none_or(|slot| slot.current.is_zero()));
    assert_eq!(state.find(&sender_address()).unwrap().nonce, 1);
    assert!(state.find(&sender_address()).unwrap().balance < balance_before);
}

#[test]
fn selfdestruct_transfers_and_erases() {
    // SELFDESTRUCT to a beneficiary: pre-Cancun the account is erased.
    // PUSH1 0xBE SELFDESTRUCT
    let code = hex::decode("60beff").unwrap();
    let mut state = state_with_contract(&code);
    let contract_balance = state.find(&common::contract_address()).unwrap().balance;
    let tx = call_tx(&[], 100_000);

    let receipt = run_tx(&mut state, Revision::London, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.status, StatusCode::Success);
    assert!(state.find(&common::contract_address()).is_none());
    assert_eq!(state.find(&addr(0xBE)).unwrap().balance, contract_balance);

    // From Cancun the account survives unless created in this transaction.
    let mut state = state_with_contract(&code);
    let receipt = run_tx(&mut state, Revision::Cancun, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.status, StatusCode::Success);
    let contract = state.find(&common::contract_address()).unwrap();
    assert_eq!(contract.balance, U256::zero());
    assert_eq!(state.find(&addr(0xBE)).unwrap().balance, contract_balance);
}

#[test]
fn create_transaction_deploys_code() {
    let mut state = EvmState::new();
    state.insert(
        sender_address(),
        Account {
            balance: U256::from(u64::MAX),
            ..Default::default()
        },
    );
    // Initcode returning the runtime [0x00]:
    // PUSH1 0 PUSH0 MSTORE8 PUSH1 1 PUSH0 RETURN
    let initcode = hex::decode("60005f5360015ff3").unwrap();
    let tx = Transaction {
        sender: sender_address(),
        to: None,
        gas_limit: 200_000,
        data: Bytes::from(initcode),
        ..Default::default()
    };

    let receipt = run_tx(&mut state, Revision::Cancun, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.status, StatusCode::Success);

    let created = calculate_create_address(sender_address(), 0);
    let account = state.find(&created).unwrap();
    assert_eq!(account.code.as_ref(), &[0x00]);
    assert_eq!(account.nonce, 1);
}

#[test]
fn touched_empty_accounts_are_deleted() {
    // CALL with zero value to an existing empty account touches it; from
    // Spurious Dragon it is deleted at transaction end.
    // PUSH0 x4 PUSH0 (value) PUSH1 0xEE (callee) GAS CALL STOP
    let code = hex::decode("5f5f5f5f5f60ee5af100").unwrap();
    let mut state = state_with_contract(&code);
    state.insert(addr(0xEE), Account::default());
    let tx = call_tx(&[], 200_000);

    let receipt = run_tx(&mut state, Revision::Cancun, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.status, StatusCode::Success);
    assert!(state.find(&addr(0xEE)).is_none());
}

#[test]
fn logs_reach_the_receipt() {
    // PUSH1 0xAB PUSH1 0 MSTORE8 PUSH1 1 PUSH1 0 LOG0 STOP
    let code = hex::decode("60ab60005360016000a000").unwrap();
    let mut state = state_with_contract(&code);
    let tx = call_tx(&[], 200_000);

    let receipt = run_tx(&mut state, Revision::Cancun, &tx, ExecutorKind::Baseline).unwrap();
    assert_eq!(receipt.logs.len(), 1);
    assert_eq!(receipt.logs[0].address, common::contract_address());
    assert_eq!(receipt.logs[0].data.as_ref(), &[0xAB]);
    assert!(receipt.logs[0].topics.is_empty());
}

#[test]
fn transition_is_deterministic() {
    // Re-running the same transaction on the same initial state yields an
    // identical receipt and post-state.
    let code = hex::decode("600160005560ab60005360016000a000").unwrap();
    let tx = call_tx(&[], 200_000);

    let run_once = || {
        let mut state = state_with_contract(&code);
        let receipt = run_tx(&mut state, Revision::Cancun, &tx, ExecutorKind::Baseline).unwrap();
        (receipt, state)
    };
    let (first_receipt, first_state) = run_once();
    let (second_receipt, second_state) = run_once();

    assert_eq!(
        serde_json::to_string(&first_receipt).unwrap(),
        serde_json::to_string(&second_receipt).unwrap()
    );
    assert_eq!(first_state.accounts(), second_state.accounts());
}

#[test]
fn coinbase_collects_the_priority_fee() {
    let mut state = EvmState::new();
    state.insert(
        sender_address(),
        Account {
            balance: U256::from(u64::MAX),
            ..Default::default()
        },
    );
    let tx = Transaction {
        sender: sender_address(),
        to: Some(addr(0xbeef)),
        gas_limit: 100_000,
        max_gas_price: U256::from(3),
        max_priority_gas_price: U256::from(3),
        ..Default::default()
    };

    let receipt = run_tx(&mut state, Revision::Cancun, &tx, ExecutorKind::Baseline).unwrap();
    // base_fee is zero in the test block, so the whole price is priority.
    assert_eq!(
        state.find(&addr(common::COINBASE)).unwrap().balance,
        U256::from(receipt.gas_used * 3)
    );
}
