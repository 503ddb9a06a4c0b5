//! # Arithmetic operations
//!
//! Includes the following opcodes:
//!   - `ADD`
//!   - `SUB`
//!   - `MUL`
//!   - `DIV`
//!   - `SDIV`
//!   - `MOD`
//!   - `SMOD`
//!   - `ADDMOD`
//!   - `MULMOD`
//!   - `EXP`
//!   - `SIGNEXTEND`

use crate::{
    call_frame::ExecutionState,
    errors::{OpcodeResult, VMError},
    gas_cost,
    opcode_handlers::OpcodeHandler,
};
use aevm_common::arith;

/// Implementation for the `ADD` opcode.
pub struct OpAddHandler;
impl OpcodeHandler for OpAddHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(lhs.overflowing_add(rhs).0)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SUB` opcode.
pub struct OpSubHandler;
impl OpcodeHandler for OpSubHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(lhs.overflowing_sub(rhs).0)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MUL` opcode.
pub struct OpMulHandler;
impl OpcodeHandler for OpMulHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(lhs.overflowing_mul(rhs).0)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `DIV` opcode.
pub struct OpDivHandler;
impl OpcodeHandler for OpDivHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        match lhs.checked_div(rhs) {
            Some(quotient) => state.stack.push(quotient)?,
            None => state.stack.push_zero()?,
        }
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SDIV` opcode.
pub struct OpSDivHandler;
impl OpcodeHandler for OpSDivHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(arith::sdiv(lhs, rhs))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MOD` opcode.
pub struct OpModHandler;
impl OpcodeHandler for OpModHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        match lhs.checked_rem(rhs) {
            Some(rem) => state.stack.push(rem)?,
            None => state.stack.push_zero()?,
        }
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SMOD` opcode.
pub struct OpSModHandler;
impl OpcodeHandler for OpSModHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = state.stack.pop()?;
        state.stack.push(arith::smod(lhs, rhs))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `ADDMOD` opcode.
pub struct OpAddModHandler;
impl OpcodeHandler for OpAddModHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs, modulus] = state.stack.pop()?;
        state.stack.push(arith::addmod(lhs, rhs, modulus))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MULMOD` opcode.
pub struct OpMulModHandler;
impl OpcodeHandler for OpMulModHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs, modulus] = state.stack.pop()?;
        state.stack.push(arith::mulmod(lhs, rhs, modulus))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXP` opcode.
pub struct OpExpHandler;
impl OpcodeHandler for OpExpHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [base, exponent] = state.stack.pop()?;
        state.charge_gas(gas_cost::exp(exponent, state.revision)?)?;
        state.stack.push(arith::exp(base, exponent))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SIGNEXTEND` opcode.
pub struct OpSignExtendHandler;
impl OpcodeHandler for OpSignExtendHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [index, value] = state.stack.pop()?;
        state.stack.push(arith::signextend(index, value))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
