//! # Control flow, memory and storage operations
//!
//! Includes the following opcodes:
//!   - `POP`, `PC`, `MSIZE`, `GAS`
//!   - `MLOAD`, `MSTORE`, `MSTORE8`, `MCOPY`
//!   - `TLOAD`, `TSTORE`, `SLOAD`, `SSTORE`
//!   - `JUMPDEST`, `JUMP`, `JUMPI`

use crate::{
    call_frame::ExecutionState,
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost::{self, SSTORE_STIPEND},
    gas_schedule::GasSchedule,
    host::AccessStatus,
    memory::{self, calculate_memory_size},
    opcode_handlers::OpcodeHandler,
    utils::{size_offset_to_usize, u256_to_usize},
};
use aevm_common::{constants::WORD_SIZE_IN_BYTES_USIZE, Revision, U256};

/// Implementation for the `POP` opcode.
pub struct OpPopHandler;
impl OpcodeHandler for OpPopHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.pop1()?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `PC` opcode.
pub struct OpPcHandler;
impl OpcodeHandler for OpPcHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.push(U256::from(state.pc))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MSIZE` opcode.
pub struct OpMSizeHandler;
impl OpcodeHandler for OpMSizeHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.push(U256::from(state.memory.len()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GAS` opcode.
pub struct OpGasHandler;
impl OpcodeHandler for OpGasHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.push(U256::from(state.gas_left.max(0) as u64))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MLOAD` opcode.
pub struct OpMLoadHandler;
impl OpcodeHandler for OpMLoadHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let offset = u256_to_usize(state.stack.pop1()?)?;
        let new_memory_size = calculate_memory_size(offset, WORD_SIZE_IN_BYTES_USIZE)?;
        state.charge_gas(memory::expansion_cost(new_memory_size, state.memory.len())?)?;

        let word = state.memory.load_word(offset)?;
        state.stack.push(word)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MSTORE` opcode.
pub struct OpMStoreHandler;
impl OpcodeHandler for OpMStoreHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [offset, value] = state.stack.pop()?;
        let offset = u256_to_usize(offset)?;
        let new_memory_size = calculate_memory_size(offset, WORD_SIZE_IN_BYTES_USIZE)?;
        state.charge_gas(memory::expansion_cost(new_memory_size, state.memory.len())?)?;

        state.memory.store_word(offset, value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MSTORE8` opcode.
pub struct OpMStore8Handler;
impl OpcodeHandler for OpMStore8Handler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [offset, value] = state.stack.pop()?;
        let offset = u256_to_usize(offset)?;
        let new_memory_size = calculate_memory_size(offset, 1)?;
        state.charge_gas(memory::expansion_cost(new_memory_size, state.memory.len())?)?;

        state.memory.store_data(offset, &[value.byte(0)])?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MCOPY` opcode.
pub struct OpMCopyHandler;
impl OpcodeHandler for OpMCopyHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [dst_offset, src_offset, size] = state.stack.pop()?;
        let (size, dst_offset) = size_offset_to_usize(size, dst_offset)?;
        let src_offset = if size == 0 {
            0
        } else {
            u256_to_usize(src_offset)?
        };

        let new_memory_size = calculate_memory_size(dst_offset.max(src_offset), size)?;
        state.charge_gas(gas_cost::copy_cost(
            gas_cost::COPY_WORD_COST,
            size,
            new_memory_size,
            state.memory.len(),
        )?)?;

        state.memory.copy_within(src_offset, dst_offset, size)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `TLOAD` opcode.
pub struct OpTLoadHandler;
impl OpcodeHandler for OpTLoadHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let key = state.stack.pop1()?;
        let value = state.host.get_transient_storage(state.msg.recipient, key);
        state.stack.push(value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `TSTORE` opcode.
pub struct OpTStoreHandler;
impl OpcodeHandler for OpTStoreHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        if state.msg.is_static {
            return Err(ExceptionalHalt::StaticModeViolation.into());
        }
        let [key, value] = state.stack.pop()?;
        state
            .host
            .set_transient_storage(state.msg.recipient, key, value);
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SLOAD` opcode.
pub struct OpSLoadHandler;
impl OpcodeHandler for OpSLoadHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let key = state.stack.pop1()?;
        let recipient = state.msg.recipient;

        if state.revision >= Revision::Berlin {
            let was_cold = state.host.access_storage(recipient, key) == AccessStatus::Cold;
            state.charge_gas(gas_cost::sload_surcharge(state.revision, was_cold))?;
        }

        let value = state.host.get_storage(recipient, key);
        state.stack.push(value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SSTORE` opcode.
pub struct OpSStoreHandler;
impl OpcodeHandler for OpSStoreHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        if state.msg.is_static {
            return Err(ExceptionalHalt::StaticModeViolation.into());
        }

        // [EIP-2200]: an SSTORE is forbidden outright when the remaining gas
        // is at or below the stipend.
        if GasSchedule::for_revision(state.revision).sstore_stipend_check
            && state.gas_left <= SSTORE_STIPEND
        {
            return Err(ExceptionalHalt::OutOfGas.into());
        }

        let [key, value] = state.stack.pop()?;
        let recipient = state.msg.recipient;

        let slot_was_cold = state.revision >= Revision::Berlin
            && state.host.access_storage(recipient, key) == AccessStatus::Cold;

        let status = state.host.set_storage(recipient, key, value);
        let (cost, refund) = gas_cost::sstore(state.revision, status, slot_was_cold)?;
        state.charge_gas(cost)?;
        state.gas_refund += refund;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `JUMPDEST` opcode.
pub struct OpJumpDestHandler;
impl OpcodeHandler for OpJumpDestHandler {
    #[inline(always)]
    fn eval(_state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `JUMP` opcode.
pub struct OpJumpHandler;
impl OpcodeHandler for OpJumpHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let target = state.stack.pop1()?;
        jump(state, target)?;
        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }
}

/// Implementation for the `JUMPI` opcode.
pub struct OpJumpIHandler;
impl OpcodeHandler for OpJumpIHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [target, condition] = state.stack.pop()?;
        if condition.is_zero() {
            Ok(OpcodeResult::Continue { pc_increment: 1 })
        } else {
            jump(state, target)?;
            Ok(OpcodeResult::Continue { pc_increment: 0 })
        }
    }
}

fn jump(state: &mut ExecutionState<'_>, target: U256) -> Result<(), VMError> {
    let target = usize::try_from(target).unwrap_or(usize::MAX);
    if !state.analysis.is_jumpdest(target) {
        return Err(ExceptionalHalt::BadJumpDestination.into());
    }
    state.pc = target;
    Ok(())
}
