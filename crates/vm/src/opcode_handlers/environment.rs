//! # Environmental information
//!
//! Includes the following opcodes:
//!   - `ADDRESS`, `BALANCE`, `ORIGIN`, `CALLER`, `CALLVALUE`
//!   - `CALLDATALOAD`, `CALLDATASIZE`, `CALLDATACOPY`
//!   - `CODESIZE`, `CODECOPY`, `GASPRICE`
//!   - `EXTCODESIZE`, `EXTCODECOPY`, `EXTCODEHASH`
//!   - `RETURNDATASIZE`, `RETURNDATACOPY`

use crate::{
    call_frame::ExecutionState,
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    host::AccessStatus,
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    utils::size_offset_to_usize,
};
use aevm_common::{
    utils::{address_to_word, h256_to_u256, u256_from_big_endian, word_to_address},
    Address, Revision, U256,
};

/// Marks the address warm and charges the cold surcharge when applicable.
#[inline]
fn charge_account_access(state: &mut ExecutionState<'_>, address: Address) -> Result<(), VMError> {
    if state.revision >= Revision::Berlin {
        let was_cold = state.host.access_account(address) == AccessStatus::Cold;
        state.charge_gas(gas_cost::account_access_surcharge(state.revision, was_cold))?;
    }
    Ok(())
}

/// Copies `data[src_offset..src_offset + size]` to memory, zero-padding
/// reads past the end of `data`.
fn copy_zero_padded(
    state: &mut ExecutionState<'_>,
    dst_offset: usize,
    data: &[u8],
    src_offset: usize,
    size: usize,
) -> Result<(), VMError> {
    if size == 0 {
        return Ok(());
    }
    let mut buffer = vec![0u8; size];
    if src_offset < data.len() {
        let n = size.min(data.len() - src_offset);
        buffer[..n].copy_from_slice(&data[src_offset..src_offset + n]);
    }
    state.memory.store_data(dst_offset, &buffer)
}

/// Implementation for the `ADDRESS` opcode.
pub struct OpAddressHandler;
impl OpcodeHandler for OpAddressHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.push(address_to_word(state.msg.recipient))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BALANCE` opcode.
pub struct OpBalanceHandler;
impl OpcodeHandler for OpBalanceHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let address = word_to_address(state.stack.pop1()?);
        charge_account_access(state, address)?;
        state.stack.push(state.host.get_balance(address))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `ORIGIN` opcode.
pub struct OpOriginHandler;
impl OpcodeHandler for OpOriginHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let origin = state.get_tx_context().origin;
        state.stack.push(address_to_word(origin))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLER` opcode.
pub struct OpCallerHandler;
impl OpcodeHandler for OpCallerHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.push(address_to_word(state.msg.sender))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLVALUE` opcode.
pub struct OpCallValueHandler;
impl OpcodeHandler for OpCallValueHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.push(state.msg.value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLDATALOAD` opcode.
pub struct OpCallDataLoadHandler;
impl OpcodeHandler for OpCallDataLoadHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let offset = state.stack.pop1()?;
        let data = &state.msg.data;

        // Out-of-bounds reads are zero-padded.
        let value = match usize::try_from(offset) {
            Ok(offset) if offset < data.len() => {
                let mut word = [0u8; 32];
                let n = 32.min(data.len() - offset);
                word[..n].copy_from_slice(&data[offset..offset + n]);
                u256_from_big_endian(&word)
            }
            _ => U256::zero(),
        };
        state.stack.push(value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLDATASIZE` opcode.
pub struct OpCallDataSizeHandler;
impl OpcodeHandler for OpCallDataSizeHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.push(U256::from(state.msg.data.len()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLDATACOPY` opcode.
pub struct OpCallDataCopyHandler;
impl OpcodeHandler for OpCallDataCopyHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [dst_offset, src_offset, size] = state.stack.pop()?;
        let (size, dst_offset) = size_offset_to_usize(size, dst_offset)?;
        let src_offset = usize::try_from(src_offset).unwrap_or(usize::MAX);

        let new_memory_size = calculate_memory_size(dst_offset, size)?;
        state.charge_gas(gas_cost::copy_cost(
            gas_cost::COPY_WORD_COST,
            size,
            new_memory_size,
            state.memory.len(),
        )?)?;

        let data = state.msg.data.clone();
        copy_zero_padded(state, dst_offset, &data, src_offset, size)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CODESIZE` opcode.
pub struct OpCodeSizeHandler;
impl OpcodeHandler for OpCodeSizeHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.push(U256::from(state.analysis.code_len()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CODECOPY` opcode.
pub struct OpCodeCopyHandler;
impl OpcodeHandler for OpCodeCopyHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [dst_offset, src_offset, size] = state.stack.pop()?;
        let (size, dst_offset) = size_offset_to_usize(size, dst_offset)?;
        let src_offset = usize::try_from(src_offset).unwrap_or(usize::MAX);

        let new_memory_size = calculate_memory_size(dst_offset, size)?;
        state.charge_gas(gas_cost::copy_cost(
            gas_cost::COPY_WORD_COST,
            size,
            new_memory_size,
            state.memory.len(),
        )?)?;

        let code = state.analysis.original_code().to_vec();
        copy_zero_padded(state, dst_offset, &code, src_offset, size)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GASPRICE` opcode.
pub struct OpGasPriceHandler;
impl OpcodeHandler for OpGasPriceHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let gas_price = state.get_tx_context().gas_price;
        state.stack.push(gas_price)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXTCODESIZE` opcode.
pub struct OpExtCodeSizeHandler;
impl OpcodeHandler for OpExtCodeSizeHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let address = word_to_address(state.stack.pop1()?);
        charge_account_access(state, address)?;
        state.stack.push(U256::from(state.host.get_code_size(address)))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXTCODECOPY` opcode.
pub struct OpExtCodeCopyHandler;
impl OpcodeHandler for OpExtCodeCopyHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [address, dst_offset, src_offset, size] = state.stack.pop()?;
        let address = word_to_address(address);
        let (size, dst_offset) = size_offset_to_usize(size, dst_offset)?;
        let src_offset = usize::try_from(src_offset).unwrap_or(usize::MAX);

        let new_memory_size = calculate_memory_size(dst_offset, size)?;
        state.charge_gas(gas_cost::copy_cost(
            gas_cost::COPY_WORD_COST,
            size,
            new_memory_size,
            state.memory.len(),
        )?)?;
        charge_account_access(state, address)?;

        if size > 0 {
            let mut buffer = vec![0u8; size];
            state.host.copy_code(address, src_offset, &mut buffer);
            state.memory.store_data(dst_offset, &buffer)?;
        }
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `RETURNDATASIZE` opcode.
pub struct OpReturnDataSizeHandler;
impl OpcodeHandler for OpReturnDataSizeHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.push(U256::from(state.return_data.len()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `RETURNDATACOPY` opcode.
pub struct OpReturnDataCopyHandler;
impl OpcodeHandler for OpReturnDataCopyHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [dst_offset, src_offset, size] = state.stack.pop()?;
        let (size, dst_offset) = size_offset_to_usize(size, dst_offset)?;

        // Unlike the other copy instructions, reading past the end of the
        // return data buffer is a fault, not a zero-pad.
        let src_offset = usize::try_from(src_offset)
            .map_err(|_| ExceptionalHalt::InvalidMemoryAccess)?;
        let end = src_offset
            .checked_add(size)
            .ok_or(ExceptionalHalt::InvalidMemoryAccess)?;
        if end > state.return_data.len() {
            return Err(ExceptionalHalt::InvalidMemoryAccess.into());
        }

        let new_memory_size = calculate_memory_size(dst_offset, size)?;
        state.charge_gas(gas_cost::copy_cost(
            gas_cost::COPY_WORD_COST,
            size,
            new_memory_size,
            state.memory.len(),
        )?)?;

        let data = state.return_data.slice(src_offset..end);
        state.memory.store_data(dst_offset, &data)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXTCODEHASH` opcode.
pub struct OpExtCodeHashHandler;
impl OpcodeHandler for OpExtCodeHashHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let address = word_to_address(state.stack.pop1()?);
        charge_account_access(state, address)?;
        state.stack.push(h256_to_u256(state.host.get_code_hash(address)))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
