//! Dynamic gas costs of the instructions.
//!
//! The base per-opcode costs are folded into the dispatcher precheck (the
//! per-revision cost table), so the functions here compute only the dynamic
//! part an instruction charges on top: copy costs per word, cold-access
//! surcharges, storage transitions, call extras and intrinsic transaction
//! cost.

use crate::{
    errors::{ExceptionalHalt, InternalError, VMError},
    gas_schedule::{GasSchedule, COLD_SLOAD_COST},
    host::StorageStatus,
    memory,
};
use aevm_common::{arith, constants::WORD_SIZE_IN_BYTES_USIZE, types::AccessList, Revision, U256};
use ExceptionalHalt::OutOfGas;

// Word-granular dynamic costs.
pub const KECCAK256_WORD_COST: u64 = 6;
pub const COPY_WORD_COST: u64 = 3;
pub const INITCODE_WORD_COST: u64 = 2;

// Logging.
pub const LOG_TOPIC_COST: u64 = 375;
pub const LOG_DATA_BYTE_COST: u64 = 8;

// Storage.
pub const SSTORE_STIPEND: i64 = 2300;

// Calls.
pub const CALL_STIPEND: u64 = 2300;

// Create.
pub const CODE_DEPOSIT_COST: u64 = 200;

// Transactions.
pub const TX_BASE_COST: u64 = 21000;
pub const ACCESS_LIST_ADDRESS_COST: u64 = 2400;
pub const ACCESS_LIST_STORAGE_KEY_COST: u64 = 1900;

// Precompiles.
pub const SHA2_256_STATIC_COST: u64 = 60;
pub const SHA2_256_WORD_COST: u64 = 12;
pub const RIPEMD_160_STATIC_COST: u64 = 600;
pub const RIPEMD_160_WORD_COST: u64 = 120;
pub const IDENTITY_STATIC_COST: u64 = 15;
pub const IDENTITY_WORD_COST: u64 = 3;
pub const MODEXP_MIN_COST: u64 = 200;

/// Number of 32-byte words needed to hold `size` bytes.
#[inline]
pub fn num_words(size: usize) -> Result<u64, VMError> {
    let words = size
        .checked_add(WORD_SIZE_IN_BYTES_USIZE - 1)
        .ok_or(OutOfGas)?
        / WORD_SIZE_IN_BYTES_USIZE;
    u64::try_from(words).map_err(|_| InternalError::TypeConversion.into())
}

/// Per-word copy cost plus memory expansion, shared by the *COPY family and
/// KECCAK256.
pub fn copy_cost(
    word_cost: u64,
    size: usize,
    new_memory_size: usize,
    current_memory_size: usize,
) -> Result<u64, VMError> {
    let words_cost = word_cost.checked_mul(num_words(size)?).ok_or(OutOfGas)?;
    let expansion_cost = memory::expansion_cost(new_memory_size, current_memory_size)?;
    words_cost.checked_add(expansion_cost).ok_or(OutOfGas.into())
}

pub fn keccak256(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, VMError> {
    copy_cost(KECCAK256_WORD_COST, size, new_memory_size, current_memory_size)
}

pub fn log(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
    topic_count: usize,
) -> Result<u64, VMError> {
    let expansion_cost = memory::expansion_cost(new_memory_size, current_memory_size)?;
    let topics_cost = LOG_TOPIC_COST
        .checked_mul(topic_count as u64)
        .ok_or(OutOfGas)?;
    let size: u64 = size.try_into().map_err(|_| OutOfGas)?;
    let bytes_cost = LOG_DATA_BYTE_COST.checked_mul(size).ok_or(OutOfGas)?;

    topics_cost
        .checked_add(bytes_cost)
        .ok_or(OutOfGas)?
        .checked_add(expansion_cost)
        .ok_or(OutOfGas.into())
}

/// Dynamic part of EXP: per-byte cost of the significant exponent bytes.
pub fn exp(exponent: U256, revision: Revision) -> Result<u64, VMError> {
    let schedule = GasSchedule::for_revision(revision);
    schedule
        .exp_byte_cost
        .checked_mul(arith::count_significant_bytes(exponent))
        .ok_or(OutOfGas.into())
}

/// Cold surcharge of one storage slot read ([EIP-2929]); zero before Berlin
/// and for warm slots.
pub fn sload_surcharge(revision: Revision, slot_was_cold: bool) -> u64 {
    let schedule = GasSchedule::for_revision(revision);
    if schedule.has_access_lists && slot_was_cold {
        schedule.cold_sload_surcharge
    } else {
        0
    }
}

/// Cold surcharge of one account access ([EIP-2929]); zero before Berlin and
/// for warm addresses.
pub fn account_access_surcharge(revision: Revision, address_was_cold: bool) -> u64 {
    let schedule = GasSchedule::for_revision(revision);
    if schedule.has_access_lists && address_was_cold {
        schedule.cold_account_access_surcharge
    } else {
        0
    }
}

/// Gas cost and refund delta of one SSTORE, from the storage transition
/// reported by the host.
///
/// Net gas metering applies in Constantinople ([EIP-1283], reverted in
/// Petersburg) and from Istanbul on ([EIP-2200]); Berlin adds the cold-slot
/// surcharge ([EIP-2929]); London trims the clears refund ([EIP-3529]).
pub fn sstore(
    revision: Revision,
    status: StorageStatus,
    slot_was_cold: bool,
) -> Result<(u64, i64), VMError> {
    let schedule = GasSchedule::for_revision(revision);

    let cold_cost = if schedule.has_access_lists && slot_was_cold {
        COLD_SLOAD_COST
    } else {
        0
    };

    let clears_refund = schedule.sstore_clears_refund as i64;
    let net_metering = revision == Revision::Constantinople || revision >= Revision::Istanbul;

    let (cost, refund) = if net_metering {
        let restore_reset = (schedule.sstore_reset - schedule.sstore_noop) as i64;
        let restore_set = (schedule.sstore_set - schedule.sstore_noop) as i64;
        match status {
            StorageStatus::Unchanged | StorageStatus::Assigned => (schedule.sstore_noop, 0),
            StorageStatus::Added => (schedule.sstore_set, 0),
            StorageStatus::Deleted => (schedule.sstore_reset, clears_refund),
            StorageStatus::Modified => (schedule.sstore_reset, 0),
            StorageStatus::DeletedAdded => (schedule.sstore_noop, -clears_refund),
            StorageStatus::ModifiedDeleted => (schedule.sstore_noop, clears_refund),
            StorageStatus::DeletedRestored => {
                (schedule.sstore_noop, restore_reset - clears_refund)
            }
            StorageStatus::AddedDeleted => (schedule.sstore_noop, restore_set),
            StorageStatus::ModifiedRestored => (schedule.sstore_noop, restore_reset),
        }
    } else {
        // Legacy model: only the (current, new) pair matters.
        match status {
            // current == 0, new != 0
            StorageStatus::Added | StorageStatus::DeletedAdded | StorageStatus::DeletedRestored => {
                (schedule.sstore_set, 0)
            }
            // current != 0, new == 0
            StorageStatus::Deleted
            | StorageStatus::ModifiedDeleted
            | StorageStatus::AddedDeleted => (schedule.sstore_reset, clears_refund),
            _ => (schedule.sstore_reset, 0),
        }
    };

    Ok((cost.checked_add(cold_cost).ok_or(OutOfGas)?, refund))
}

/// CREATE/CREATE2 dynamic cost: memory expansion, [EIP-3860] initcode words
/// from Shanghai, and the CREATE2 hashing cost.
pub fn create(
    new_memory_size: usize,
    current_memory_size: usize,
    initcode_size: usize,
    is_create2: bool,
    revision: Revision,
) -> Result<u64, VMError> {
    let words = num_words(initcode_size)?;

    let initcode_cost = if revision >= Revision::Shanghai {
        words.checked_mul(INITCODE_WORD_COST).ok_or(OutOfGas)?
    } else {
        0
    };
    let hash_cost = if is_create2 {
        words.checked_mul(KECCAK256_WORD_COST).ok_or(OutOfGas)?
    } else {
        0
    };
    let expansion_cost = memory::expansion_cost(new_memory_size, current_memory_size)?;

    expansion_cost
        .checked_add(initcode_cost)
        .ok_or(OutOfGas)?
        .checked_add(hash_cost)
        .ok_or(OutOfGas.into())
}

/// All but one 64th of the remaining gas ([EIP-150]); everything before
/// Tangerine Whistle.
pub fn max_message_call_gas(gas_left: i64, revision: Revision) -> i64 {
    if GasSchedule::for_revision(revision).has_63_64_rule {
        gas_left - gas_left / 64
    } else {
        gas_left
    }
}

/// Intrinsic calldata cost: per-byte, zero bytes cheaper.
pub fn tx_calldata(data: &[u8], revision: Revision) -> Result<u64, VMError> {
    let schedule = GasSchedule::for_revision(revision);
    let mut cost: u64 = 0;
    for byte in data {
        let byte_cost = if *byte == 0 {
            schedule.calldata_zero_byte_cost
        } else {
            schedule.calldata_nonzero_byte_cost
        };
        cost = cost.checked_add(byte_cost).ok_or(OutOfGas)?;
    }
    Ok(cost)
}

/// Intrinsic access-list cost ([EIP-2930]).
pub fn tx_access_list(access_list: &AccessList) -> Result<u64, VMError> {
    let mut cost: u64 = 0;
    for item in access_list {
        cost = cost
            .checked_add(ACCESS_LIST_ADDRESS_COST)
            .ok_or(OutOfGas)?
            .checked_add(
                ACCESS_LIST_STORAGE_KEY_COST
                    .checked_mul(item.storage_keys.len() as u64)
                    .ok_or(OutOfGas)?,
            )
            .ok_or(OutOfGas)?;
    }
    Ok(cost)
}

/// Word-priced precompile cost (SHA2-256, RIPEMD-160, IDENTITY).
pub fn precompile_words(
    static_cost: u64,
    word_cost: u64,
    data_size: usize,
) -> Result<u64, VMError> {
    let dynamic = word_cost.checked_mul(num_words(data_size)?).ok_or(OutOfGas)?;
    static_cost.checked_add(dynamic).ok_or(OutOfGas.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_rounding() {
        assert_eq!(num_words(0).unwrap(), 0);
        assert_eq!(num_words(1).unwrap(), 1);
        assert_eq!(num_words(32).unwrap(), 1);
        assert_eq!(num_words(33).unwrap(), 2);
    }

    #[test]
    fn sstore_fresh_write_istanbul() {
        // 0 -> 0 -> 1: storage creation, no refund.
        let (cost, refund) = sstore(Revision::Istanbul, StorageStatus::Added, true).unwrap();
        assert_eq!(cost, 20000);
        assert_eq!(refund, 0);
    }

    #[test]
    fn sstore_clear_istanbul() {
        // X -> X -> 0: reset with clears refund.
        let (cost, refund) = sstore(Revision::Istanbul, StorageStatus::Deleted, true).unwrap();
        assert_eq!(cost, 5000);
        assert_eq!(refund, 15000);
    }

    #[test]
    fn sstore_deleted_added_istanbul() {
        // 1 -> 0 -> 1: dirty slot, takes the clears refund back.
        let (cost, refund) =
            sstore(Revision::Istanbul, StorageStatus::DeletedAdded, false).unwrap();
        assert_eq!(cost, 800);
        assert_eq!(refund, -15000);
    }

    #[test]
    fn sstore_cold_surcharge_berlin() {
        let (cold, _) = sstore(Revision::Berlin, StorageStatus::Added, true).unwrap();
        let (warm, _) = sstore(Revision::Berlin, StorageStatus::Added, false).unwrap();
        assert_eq!(cold - warm, COLD_SLOAD_COST);
    }

    #[test]
    fn sstore_legacy_model() {
        // Petersburg reverted net metering: a no-op write still costs 5000.
        let (cost, refund) = sstore(Revision::Petersburg, StorageStatus::Unchanged, true).unwrap();
        assert_eq!(cost, 5000);
        assert_eq!(refund, 0);
    }

    #[test]
    fn sstore_restore_berlin() {
        // 1 -> 2 -> 1: dirty slot restored to its original value.
        let (cost, refund) =
            sstore(Revision::Berlin, StorageStatus::ModifiedRestored, false).unwrap();
        assert_eq!(cost, 100);
        assert_eq!(refund, 2800);
    }

    #[test]
    fn london_trims_clears_refund() {
        let (_, refund) = sstore(Revision::London, StorageStatus::Deleted, false).unwrap();
        assert_eq!(refund, 4800);
    }

    #[test]
    fn sixty_three_sixty_fourths() {
        assert_eq!(max_message_call_gas(6400, Revision::Cancun), 6300);
        assert_eq!(max_message_call_gas(6400, Revision::Homestead), 6400);
    }

    #[test]
    fn calldata_cost_by_revision() {
        let data = [0u8, 1, 2];
        assert_eq!(tx_calldata(&data, Revision::Homestead).unwrap(), 4 + 68 + 68);
        assert_eq!(tx_calldata(&data, Revision::Istanbul).unwrap(), 4 + 16 + 16);
    }
}
