//! Single-transaction state transition: validation, execution, refund
//! settlement and end-of-transaction cleanup.

use crate::{
    errors::{StatusCode, TxValidationError},
    gas_cost,
    gas_schedule::GasSchedule,
    host::{AccessStatus, CallKind, Host, Message},
    state::{Account, EvmState, ExecutorKind, StateHost},
};
use aevm_common::{
    constants::{
        BLOB_BASE_FEE_UPDATE_FRACTION, MAX_BLOB_HASHES_PER_TX, MAX_INITCODE_SIZE,
        VERSIONED_HASH_VERSION_KZG,
    },
    types::{BlockInfo, Log, Ommer, Transaction, TxType, Withdrawal},
    Address, Revision, U256, U512,
};
use serde::Serialize;

/// Result of applying one transaction.
///
/// The cumulative gas and the bloom filter are block-level concerns filled
/// in by the embedder.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionReceipt {
    pub tx_type: TxType,
    pub status: StatusCode,
    pub gas_used: u64,
    pub cumulative_gas_used: u64,
    pub blob_gas_used: u64,
    pub logs: Vec<Log>,
}

/// Blob gas price for the given excess blob gas ([EIP-4844]).
pub fn blob_gas_price(excess_blob_gas: u64) -> U256 {
    fake_exponential(1, excess_blob_gas, BLOB_BASE_FEE_UPDATE_FRACTION)
}

/// Linear-approximation exponential used by the blob fee market.
fn fake_exponential(factor: u64, numerator: u64, denominator: u64) -> U256 {
    let mut i: u128 = 1;
    let mut output: U256 = U256::zero();
    let mut accum: u128 = (factor as u128) * (denominator as u128);
    while accum > 0 {
        output += U256::from(accum);
        accum = accum * (numerator as u128) / ((denominator as u128) * i);
        i += 1;
    }
    output / U256::from(denominator)
}

/// Validates a transaction against the sender account and the block context,
/// returning the execution gas limit (the gas handed to the entry frame).
///
/// The sender may be absent from the state; it is treated as an empty
/// account for these checks only.
pub fn validate_transaction(
    sender: Option<&Account>,
    block: &BlockInfo,
    tx: &Transaction,
    revision: Revision,
    block_gas_left: u64,
    blob_gas_left: u64,
) -> Result<u64, TxValidationError> {
    let default_account = Account::default();
    let sender = sender.unwrap_or(&default_account);

    // Type gate first: a transaction type unknown to the revision fails
    // before any of its fields are interpreted.
    match tx.tx_type {
        TxType::Blob if revision < Revision::Cancun => {
            return Err(TxValidationError::TxTypeNotSupported)
        }
        TxType::Eip1559 if revision < Revision::London => {
            return Err(TxValidationError::TxTypeNotSupported)
        }
        TxType::AccessList if revision < Revision::Berlin => {
            return Err(TxValidationError::TxTypeNotSupported)
        }
        _ => {}
    }

    if tx.tx_type == TxType::Blob {
        if tx.to.is_none() {
            return Err(TxValidationError::CreateBlobTx);
        }
        if tx.blob_hashes.is_empty() {
            return Err(TxValidationError::EmptyBlobHashesList);
        }
        if tx.blob_hashes.len() > MAX_BLOB_HASHES_PER_TX {
            return Err(TxValidationError::BlobHashesListSizeLimitExceeded);
        }
        if tx.max_blob_gas_price < blob_gas_price(block.excess_blob_gas) {
            return Err(TxValidationError::FeeCapLessThanBlocks);
        }
        if tx
            .blob_hashes
            .iter()
            .any(|hash| hash.as_bytes()[0] != VERSIONED_HASH_VERSION_KZG)
        {
            return Err(TxValidationError::InvalidBlobHashVersion);
        }
        if tx.blob_gas() > blob_gas_left {
            return Err(TxValidationError::BlobGasLimitExceeded);
        }
    }

    if matches!(tx.tx_type, TxType::Eip1559 | TxType::Blob)
        && tx.max_priority_gas_price > tx.max_gas_price
    {
        return Err(TxValidationError::TipGreaterThanFeeCap);
    }

    if tx.gas_limit > block_gas_left {
        return Err(TxValidationError::GasLimitReached);
    }
    if tx.max_gas_price < block.base_fee {
        return Err(TxValidationError::FeeCapLessThanBlocks);
    }

    // [EIP-3607]: the sender must not be a contract.
    if !sender.code.is_empty() {
        return Err(TxValidationError::SenderNotEoa);
    }
    if sender.nonce == Account::NONCE_MAX {
        return Err(TxValidationError::NonceHasMaxValue);
    }
    if sender.nonce < tx.nonce {
        return Err(TxValidationError::NonceTooHigh);
    }
    if sender.nonce > tx.nonce {
        return Err(TxValidationError::NonceTooLow);
    }

    // [EIP-3860] initcode cap for create transactions.
    if revision >= Revision::Shanghai && tx.is_create() && tx.data.len() > MAX_INITCODE_SIZE {
        return Err(TxValidationError::InitCodeSizeLimitExceeded);
    }

    // Balance must cover the theoretical maximum cost, computed in 512 bits
    // so it cannot overflow.
    let mut max_total_fee =
        U512::from(tx.gas_limit) * U512::from(tx.max_gas_price) + U512::from(tx.value);
    if tx.tx_type == TxType::Blob {
        max_total_fee += U512::from(tx.blob_gas()) * U512::from(tx.max_blob_gas_price);
    }
    if U512::from(sender.balance) < max_total_fee {
        return Err(TxValidationError::InsufficientFunds);
    }

    let intrinsic = intrinsic_gas_cost(tx, revision)?;
    tx.gas_limit
        .checked_sub(intrinsic)
        .ok_or(TxValidationError::IntrinsicGasTooLow)
}

fn intrinsic_gas_cost(tx: &Transaction, revision: Revision) -> Result<u64, TxValidationError> {
    let schedule = GasSchedule::for_revision(revision);
    let base = if tx.is_create() {
        schedule.tx_create_cost
    } else {
        gas_cost::TX_BASE_COST
    };
    let data_cost = gas_cost::tx_calldata(&tx.data, revision)
        .map_err(|_| TxValidationError::IntrinsicGasTooLow)?;
    let access_list_cost = gas_cost::tx_access_list(&tx.access_list)
        .map_err(|_| TxValidationError::IntrinsicGasTooLow)?;
    let initcode_cost = if tx.is_create() && revision >= Revision::Shanghai {
        gas_cost::INITCODE_WORD_COST * tx.data.len().div_ceil(32) as u64
    } else {
        0
    };
    base.checked_add(data_cost)
        .and_then(|cost| cost.checked_add(access_list_cost))
        .and_then(|cost| cost.checked_add(initcode_cost))
        .ok_or(TxValidationError::IntrinsicGasTooLow)
}

/// Validates and executes a single transaction against the state.
///
/// On a validation error no state change is persisted. On success the
/// journal is committed, destructed accounts are erased, touched-empty
/// accounts are deleted (from Spurious Dragon), transient storage is reset
/// and every warm access is demoted back to cold.
pub fn transition(
    state: &mut EvmState,
    block: &BlockInfo,
    tx: &Transaction,
    revision: Revision,
    executor: ExecutorKind,
    block_gas_left: u64,
    blob_gas_left: u64,
) -> Result<TransactionReceipt, TxValidationError> {
    let execution_gas_limit = validate_transaction(
        state.find(&tx.sender),
        block,
        tx,
        revision,
        block_gas_left,
        blob_gas_left,
    )?;

    tracing::debug!(
        sender = ?tx.sender,
        to = ?tx.to,
        gas_limit = tx.gas_limit,
        execution_gas_limit,
        "executing transaction"
    );

    let base_fee = if revision >= Revision::London {
        block.base_fee
    } else {
        U256::zero()
    };
    let priority_gas_price = tx
        .max_priority_gas_price
        .min(tx.max_gas_price - base_fee);
    let effective_gas_price = base_fee + priority_gas_price;
    let tx_max_cost = U256::from(tx.gas_limit) * effective_gas_price;

    let mut blob_gas_used = 0u64;
    let mut blob_fee = U256::zero();
    if tx.tx_type == TxType::Blob {
        blob_gas_used = tx.blob_gas();
        blob_fee = U256::from(blob_gas_used) * blob_gas_price(block.excess_blob_gas);
    }

    // Up-front changes are written in stone: the fee deduction and the nonce
    // bump survive even a reverting transaction.
    {
        let sender = state.insert(tx.sender, Account::default());
        sender.balance = sender.balance - tx_max_cost - blob_fee;
        sender.nonce += 1;
    }

    // Pre-warm the sender, the recipient, the access list and (from
    // Shanghai) the coinbase.
    if revision >= Revision::Berlin {
        prewarm(state, tx, block, revision);
    }

    let msg = Message {
        kind: if tx.is_create() {
            CallKind::Create
        } else {
            CallKind::Call
        },
        depth: 0,
        gas: execution_gas_limit as i64,
        recipient: tx.to.unwrap_or_default(),
        sender: tx.sender,
        code_address: tx.to.unwrap_or_default(),
        value: tx.value,
        data: tx.data.clone(),
        is_static: false,
        salt: None,
    };

    let (result, logs) = {
        let mut host = StateHost::new(revision, state, block, tx, executor);
        let result = host.call(&msg);
        let logs = host.take_logs();
        (result, logs)
    };

    // Settle gas: cap the refund against the gas actually used.
    let gas_left = u64::try_from(result.gas_left).unwrap_or_default();
    let mut gas_used = tx.gas_limit - gas_left;
    let refund_limit = gas_used / GasSchedule::for_revision(revision).max_refund_quotient;
    let refund = u64::try_from(result.gas_refund.max(0))
        .unwrap_or_default()
        .min(refund_limit);
    gas_used -= refund;

    {
        let sender = state.insert(tx.sender, Account::default());
        sender.balance += tx_max_cost - U256::from(gas_used) * effective_gas_price;
    }
    {
        let coinbase = state.touch(block.coinbase);
        coinbase.balance += U256::from(gas_used) * priority_gas_price;
    }

    // Erase accounts destructed in this transaction.
    state.accounts_mut().retain(|_, account| !account.destructed);

    // Delete touched-and-empty accounts ([EIP-161]).
    if revision >= Revision::SpuriousDragon {
        state
            .accounts_mut()
            .retain(|_, account| !(account.touched && account.is_empty()));
    }

    // Per-transaction resets: transient storage, warm accesses, original
    // storage values.
    for account in state.accounts_mut().values_mut() {
        account.transient_storage.clear();
        account.access_status = AccessStatus::Cold;
        account.touched = false;
        for slot in account.storage.values_mut() {
            slot.access_status = AccessStatus::Cold;
            slot.original = slot.current;
        }
    }
    state.commit();

    tracing::debug!(status = ?result.status, gas_used, refund, "transaction complete");

    Ok(TransactionReceipt {
        tx_type: tx.tx_type,
        status: result.status,
        gas_used,
        cumulative_gas_used: 0,
        blob_gas_used,
        logs,
    })
}

fn prewarm(state: &mut EvmState, tx: &Transaction, block: &BlockInfo, revision: Revision) {
    let warm_account = |state: &mut EvmState, address: Address| {
        state.insert(address, Account::default()).access_status = AccessStatus::Warm;
    };

    warm_account(state, tx.sender);
    if let Some(to) = tx.to {
        warm_account(state, to);
    }
    for item in &tx.access_list {
        warm_account(state, item.address);
        let account = state.insert(item.address, Account::default());
        for key in &item.storage_keys {
            account.storage.entry(*key).or_default().access_status = AccessStatus::Warm;
        }
    }
    // [EIP-3651]: warm COINBASE.
    if revision >= Revision::Shanghai {
        warm_account(state, block.coinbase);
    }
}

/// Block-level finalization: credits the block reward and the ommers, applies
/// withdrawals, and deletes touched-empty accounts.
pub fn finalize(
    state: &mut EvmState,
    revision: Revision,
    coinbase: Address,
    block_reward: Option<u64>,
    ommers: &[Ommer],
    withdrawals: &[Withdrawal],
) {
    if let Some(reward) = block_reward {
        let reward_by_32 = reward / 32;
        let reward_by_8 = reward / 8;

        state.touch(coinbase).balance +=
            U256::from(reward) + U256::from(reward_by_32) * U256::from(ommers.len() as u64);
        for ommer in ommers {
            // `reward * (8 - delta) / 8` per ommer.
            let delta = u64::from(ommer.delta.min(8));
            state.touch(ommer.beneficiary).balance += U256::from(reward_by_8) * U256::from(8 - delta);
        }
    }

    for withdrawal in withdrawals {
        state.touch(withdrawal.recipient).balance += withdrawal.amount();
    }

    if revision >= Revision::SpuriousDragon {
        state
            .accounts_mut()
            .retain(|_, account| !(account.touched && account.is_empty()));
    }
    for account in state.accounts_mut().values_mut() {
        account.touched = false;
    }
    state.commit();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_gas_price_at_zero_excess() {
        assert_eq!(blob_gas_price(0), U256::one());
    }

    #[test]
    fn blob_gas_price_grows_with_excess() {
        let low = blob_gas_price(0);
        let high = blob_gas_price(10 * BLOB_BASE_FEE_UPDATE_FRACTION);
        assert!(high > low);
    }

    #[test]
    fn intrinsic_cost_of_plain_transfer() {
        let tx = Transaction {
            to: Some(Address::from_low_u64_be(1)),
            ..Default::default()
        };
        assert_eq!(intrinsic_gas_cost(&tx, Revision::Cancun).unwrap(), 21000);
    }

    #[test]
    fn intrinsic_cost_counts_calldata_and_access_list() {
        let tx = Transaction {
            to: Some(Address::from_low_u64_be(1)),
            data: bytes::Bytes::from_static(&[0, 1]),
            access_list: vec![aevm_common::types::AccessListItem {
                address: Address::from_low_u64_be(9),
                storage_keys: vec![U256::one()],
            }],
            ..Default::default()
        };
        assert_eq!(
            intrinsic_gas_cost(&tx, Revision::Cancun).unwrap(),
            21000 + 4 + 16 + 2400 + 1900
        );
    }
}
