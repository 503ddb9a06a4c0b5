//! One handler per opcode.
//!
//! Handlers implement pure instruction behaviour. The base gas cost and the
//! stack height preconditions are checked by the dispatcher (or, in
//! translated code, once per basic block); handlers only charge dynamic
//! costs and may assume their operands are present.

use crate::{
    call_frame::ExecutionState,
    errors::{ExceptionalHalt, OpcodeResult, VMError},
};

pub mod arithmetic;
pub mod bitwise_comparison;
pub mod block;
pub mod dup;
pub mod environment;
pub mod exchange;
pub mod keccak;
pub mod logging;
pub mod push;
pub mod stack_memory_storage_flow;
pub mod system;

pub trait OpcodeHandler {
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError>;
}

pub struct OpStopHandler;
impl OpcodeHandler for OpStopHandler {
    fn eval(_state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        Ok(OpcodeResult::Halt)
    }
}

pub struct OpInvalidHandler;
impl OpcodeHandler for OpInvalidHandler {
    fn eval(_state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        Err(ExceptionalHalt::InvalidInstruction.into())
    }
}
