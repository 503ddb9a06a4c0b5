//! # KECCAK256

use crate::{
    call_frame::ExecutionState,
    errors::{OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    utils::size_offset_to_usize,
};
use aevm_common::utils::{h256_to_u256, keccak};

/// Implementation for the `KECCAK256` opcode.
pub struct OpKeccak256Handler;
impl OpcodeHandler for OpKeccak256Handler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [offset, size] = state.stack.pop()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;

        let new_memory_size = calculate_memory_size(offset, size)?;
        state.charge_gas(gas_cost::keccak256(
            new_memory_size,
            state.memory.len(),
            size,
        )?)?;

        let data = state.memory.load_range(offset, size)?;
        state.stack.push(h256_to_u256(keccak(data)))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
