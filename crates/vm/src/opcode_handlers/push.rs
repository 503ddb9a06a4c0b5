//! # Push operations
//!
//! Opcodes: `PUSH0`, `PUSH1` ... `PUSH32`

use crate::{
    call_frame::ExecutionState,
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
};
use aevm_common::{utils::u256_from_big_endian, U256};

/// Generic `PUSHn` implementation, monomorphized per immediate size.
pub struct OpPushHandler<const N: usize>;
impl<const N: usize> OpcodeHandler for OpPushHandler<N> {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let start = state.pc.wrapping_add(1);
        let code = state.analysis.padded_code();

        // The immediate is always in bounds thanks to the STOP padding; a
        // truncated trailing PUSH reads the zero padding.
        let value = match code.get(start..start.wrapping_add(N)) {
            Some(immediate) => u256_from_big_endian(immediate),
            None => U256::zero(),
        };
        state.stack.push(value)?;

        Ok(OpcodeResult::Continue {
            pc_increment: N.wrapping_add(1),
        })
    }
}

/// Implementation for the `PUSH0` opcode.
pub struct OpPush0Handler;
impl OpcodeHandler for OpPush0Handler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.push_zero()?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
