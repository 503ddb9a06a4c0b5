//! # Comparison and bitwise operations
//!
//! Includes the following opcodes:
//!   - `LT`, `GT`, `SLT`, `SGT`, `EQ`, `ISZERO`
//!   - `AND`, `OR`, `XOR`, `NOT`
//!   - `BYTE`, `SHL`, `SHR`, `SAR`

use crate::{
    call_frame::ExecutionState,
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
};
use aevm_common::{arith, U256};

#[inline(always)]
fn bool_word(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Implementation for the `LT` opcode.
pub struct OpLtHandler;
impl OpcodeHandler for OpLtHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(bool_word(lhs < rhs))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GT` opcode.
pub struct OpGtHandler;
impl OpcodeHandler for OpGtHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(bool_word(lhs > rhs))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SLT` opcode.
pub struct OpSLtHandler;
impl OpcodeHandler for OpSLtHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(bool_word(arith::slt(lhs, rhs)))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SGT` opcode.
pub struct OpSGtHandler;
impl OpcodeHandler for OpSGtHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(bool_word(arith::sgt(lhs, rhs)))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EQ` opcode.
pub struct OpEqHandler;
impl OpcodeHandler for OpEqHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(bool_word(lhs == rhs))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `ISZERO` opcode.
pub struct OpIsZeroHandler;
impl OpcodeHandler for OpIsZeroHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let value = state.stack.pop1()?;
        state.stack.push(bool_word(value.is_zero()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `AND` opcode.
pub struct OpAndHandler;
impl OpcodeHandler for OpAndHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(lhs & rhs)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `OR` opcode.
pub struct OpOrHandler;
impl OpcodeHandler for OpOrHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(lhs | rhs)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `XOR` opcode.
pub struct OpXorHandler;
impl OpcodeHandler for OpXorHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(lhs ^ rhs)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `NOT` opcode.
pub struct OpNotHandler;
impl OpcodeHandler for OpNotHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let value = state.stack.pop1()?;
        state.stack.push(!value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BYTE` opcode.
pub struct OpByteHandler;
impl OpcodeHandler for OpByteHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [index, value] = state.stack.pop()?;
        state.stack.push(arith::byte(index, value))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SHL` opcode.
pub struct OpShlHandler;
impl OpcodeHandler for OpShlHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [shift, value] = state.stack.pop()?;
        state.stack.push(arith::shl(shift, value))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SHR` opcode.
pub struct OpShrHandler;
impl OpcodeHandler for OpShrHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [shift, value] = state.stack.pop()?;
        state.stack.push(arith::shr(shift, value))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SAR` opcode.
pub struct OpSarHandler;
impl OpcodeHandler for OpSarHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [shift, value] = state.stack.pop()?;
        state.stack.push(arith::sar(shift, value))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
