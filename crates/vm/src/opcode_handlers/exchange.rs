//! # Exchange operations
//!
//! Opcodes: `SWAP1` ... `SWAP16`

use crate::{
    call_frame::ExecutionState,
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
};

/// Generic `SWAPn` implementation; `SWAP1` is `OpSwapHandler<1>`.
pub struct OpSwapHandler<const DEPTH: usize>;
impl<const DEPTH: usize> OpcodeHandler for OpSwapHandler<DEPTH> {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.swap(DEPTH)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
