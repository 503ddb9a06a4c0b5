//! # Logging operations
//!
//! Opcodes: `LOG0` ... `LOG4`

use crate::{
    call_frame::ExecutionState,
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    utils::size_offset_to_usize,
};
use aevm_common::utils::u256_to_h256;

/// Generic `LOGn` implementation; `TOPICS` is the topic count.
pub struct OpLogHandler<const TOPICS: usize>;
impl<const TOPICS: usize> OpcodeHandler for OpLogHandler<TOPICS> {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        if state.msg.is_static {
            return Err(ExceptionalHalt::StaticModeViolation.into());
        }

        let [offset, size] = state.stack.pop()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;
        let topic_words = state.stack.pop::<TOPICS>()?;

        let new_memory_size = calculate_memory_size(offset, size)?;
        state.charge_gas(gas_cost::log(
            new_memory_size,
            state.memory.len(),
            size,
            TOPICS,
        )?)?;

        let data = state.memory.load_range(offset, size)?;
        let topics = topic_words.map(u256_to_h256);
        state.host.emit_log(state.msg.recipient, &data, &topics);

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
