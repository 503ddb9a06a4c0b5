//! # Duplication operations
//!
//! Opcodes: `DUP1` ... `DUP16`

use crate::{
    call_frame::ExecutionState,
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
};

/// Generic `DUPn` implementation; `DEPTH` is zero-based, so `DUP1` is
/// `OpDupHandler<0>`.
pub struct OpDupHandler<const DEPTH: usize>;
impl<const DEPTH: usize> OpcodeHandler for OpDupHandler<DEPTH> {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        state.stack.dup(DEPTH)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
