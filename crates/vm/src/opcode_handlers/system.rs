//! # System operations
//!
//! Includes the following opcodes:
//!   - `CALL`, `CALLCODE`, `DELEGATECALL`, `STATICCALL`
//!   - `CREATE`, `CREATE2`
//!   - `RETURN`, `REVERT`, `SELFDESTRUCT`

use crate::{
    call_frame::ExecutionState,
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    gas_schedule::{GasSchedule, COLD_ACCOUNT_ACCESS_COST},
    host::{AccessStatus, CallKind, Message},
    memory::{self, calculate_memory_size},
    opcode_handlers::OpcodeHandler,
    utils::size_offset_to_usize,
};
use aevm_common::{
    constants::{FAIL_WORD, MAX_INITCODE_SIZE, SUCCESS_WORD},
    utils::{address_to_word, u256_to_h256, word_to_address},
    Revision, U256,
};
use bytes::Bytes;

/// Implementation for the `CALL` opcode.
pub struct OpCallHandler;
impl OpcodeHandler for OpCallHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee, value, args_offset, args_len, ret_offset, ret_len] = state.stack.pop()?;
        let callee = word_to_address(callee);

        if state.msg.is_static && !value.is_zero() {
            return Err(ExceptionalHalt::StaticModeViolation.into());
        }

        let msg = Message {
            kind: CallKind::Call,
            depth: state.msg.depth + 1,
            gas: 0,
            recipient: callee,
            sender: state.msg.recipient,
            code_address: callee,
            value,
            data: Bytes::new(),
            is_static: state.msg.is_static,
            salt: None,
        };
        generic_call(state, msg, gas, value, true, (args_offset, args_len), (ret_offset, ret_len))
    }
}

/// Implementation for the `CALLCODE` opcode.
pub struct OpCallCodeHandler;
impl OpcodeHandler for OpCallCodeHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee, value, args_offset, args_len, ret_offset, ret_len] = state.stack.pop()?;
        let callee = word_to_address(callee);

        // The callee's code runs against the caller's own account.
        let msg = Message {
            kind: CallKind::CallCode,
            depth: state.msg.depth + 1,
            gas: 0,
            recipient: state.msg.recipient,
            sender: state.msg.recipient,
            code_address: callee,
            value,
            data: Bytes::new(),
            is_static: state.msg.is_static,
            salt: None,
        };
        generic_call(state, msg, gas, value, false, (args_offset, args_len), (ret_offset, ret_len))
    }
}

/// Implementation for the `DELEGATECALL` opcode.
pub struct OpDelegateCallHandler;
impl OpcodeHandler for OpDelegateCallHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee, args_offset, args_len, ret_offset, ret_len] = state.stack.pop()?;
        let callee = word_to_address(callee);

        // Caller context is inherited wholesale: sender, recipient, value.
        let msg = Message {
            kind: CallKind::DelegateCall,
            depth: state.msg.depth + 1,
            gas: 0,
            recipient: state.msg.recipient,
            sender: state.msg.sender,
            code_address: callee,
            value: state.msg.value,
            data: Bytes::new(),
            is_static: state.msg.is_static,
            salt: None,
        };
        generic_call(
            state,
            msg,
            gas,
            U256::zero(),
            false,
            (args_offset, args_len),
            (ret_offset, ret_len),
        )
    }
}

/// Implementation for the `STATICCALL` opcode.
pub struct OpStaticCallHandler;
impl OpcodeHandler for OpStaticCallHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee, args_offset, args_len, ret_offset, ret_len] = state.stack.pop()?;
        let callee = word_to_address(callee);

        let msg = Message {
            kind: CallKind::Call,
            depth: state.msg.depth + 1,
            gas: 0,
            recipient: callee,
            sender: state.msg.recipient,
            code_address: callee,
            value: U256::zero(),
            data: Bytes::new(),
            is_static: true,
            salt: None,
        };
        generic_call(
            state,
            msg,
            gas,
            U256::zero(),
            false,
            (args_offset, args_len),
            (ret_offset, ret_len),
        )
    }
}

/// Shared tail of the CALL family. `msg.gas` and `msg.data` are filled in
/// here; `transfers_value` marks a plain CALL moving value to a distinct
/// recipient (the only case charging the new-account cost).
#[allow(clippy::too_many_arguments)]
fn generic_call(
    state: &mut ExecutionState<'_>,
    mut msg: Message,
    requested_gas: U256,
    transferred_value: U256,
    transfers_value: bool,
    (args_offset, args_len): (U256, U256),
    (ret_offset, ret_len): (U256, U256),
) -> Result<OpcodeResult, VMError> {
    let (args_len, args_offset) = size_offset_to_usize(args_len, args_offset)?;
    let (ret_len, ret_offset) = size_offset_to_usize(ret_len, ret_offset)?;
    let schedule = GasSchedule::for_revision(state.revision);

    // Cold account surcharge ([EIP-2929]).
    if state.revision >= Revision::Berlin {
        let was_cold = state.host.access_account(msg.code_address) == AccessStatus::Cold;
        state.charge_gas(gas_cost::account_access_surcharge(state.revision, was_cold))?;
    }

    // Memory expansion for the larger of the input and output regions.
    let new_memory_size = calculate_memory_size(args_offset, args_len)?
        .max(calculate_memory_size(ret_offset, ret_len)?);
    state.charge_gas(memory::expansion_cost(new_memory_size, state.memory.len())?)?;

    // Value-transfer and new-account surcharges.
    if !transferred_value.is_zero() {
        state.charge_gas(schedule.call_value_cost)?;
    }
    if transfers_value {
        let charge_new_account = if state.revision >= Revision::SpuriousDragon {
            // Empty accounts count as dead from Spurious Dragon on.
            !transferred_value.is_zero() && !state.host.account_exists(msg.recipient)
        } else {
            !state.host.account_exists(msg.recipient)
        };
        if charge_new_account {
            state.charge_gas(schedule.call_new_account_cost)?;
        }
    }
    state.memory.resize(new_memory_size);

    // Gas forwarded to the callee: capped at 63/64 of the remainder from
    // Tangerine Whistle; before that, requesting more than available fails.
    let callee_gas = if schedule.has_63_64_rule {
        let cap = gas_cost::max_message_call_gas(state.gas_left, state.revision);
        match u64::try_from(requested_gas) {
            Ok(requested) if requested <= i64::MAX as u64 => (requested as i64).min(cap),
            _ => cap,
        }
    } else {
        let requested = u64::try_from(requested_gas).map_err(|_| ExceptionalHalt::OutOfGas)?;
        i64::try_from(requested).map_err(|_| ExceptionalHalt::OutOfGas)?
    };
    state.charge_gas(u64::try_from(callee_gas).map_err(|_| ExceptionalHalt::OutOfGas)?)?;

    // The stipend is granted on top, for free.
    let stipend = if transferred_value.is_zero() {
        0
    } else {
        schedule.call_stipend as i64
    };
    msg.gas = callee_gas + stipend;

    state.return_data = Bytes::new();

    // A sender that cannot cover the transfer fails the call without
    // reaching the callee; the reserved gas is handed back. This applies to
    // CALLCODE as well, even though its transfer is a self-to-self no-op.
    if !transferred_value.is_zero()
        && state.host.get_balance(state.msg.recipient) < transferred_value
    {
        state.gas_left += msg.gas;
        state.stack.push(FAIL_WORD)?;
        return Ok(OpcodeResult::Continue { pc_increment: 1 });
    }

    msg.data = Bytes::from(state.memory.load_range(args_offset, args_len)?);

    let result = state.host.call(&msg);

    state.gas_left += result.gas_left;
    state.gas_refund += result.gas_refund;
    state.return_data = result.output.clone();

    // At most `ret_len` bytes of callee output land in memory.
    let n = ret_len.min(result.output.len());
    if n > 0 {
        state.memory.store_data(ret_offset, &result.output[..n])?;
    }

    state.stack.push(if result.is_success() {
        SUCCESS_WORD
    } else {
        FAIL_WORD
    })?;
    Ok(OpcodeResult::Continue { pc_increment: 1 })
}

/// Implementation for the `CREATE` opcode.
pub struct OpCreateHandler;
impl OpcodeHandler for OpCreateHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [value, offset, len] = state.stack.pop()?;
        generic_create(state, value, offset, len, None)
    }
}

/// Implementation for the `CREATE2` opcode.
pub struct OpCreate2Handler;
impl OpcodeHandler for OpCreate2Handler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [value, offset, len, salt] = state.stack.pop()?;
        generic_create(state, value, offset, len, Some(salt))
    }
}

fn generic_create(
    state: &mut ExecutionState<'_>,
    value: U256,
    offset: U256,
    len: U256,
    salt: Option<U256>,
) -> Result<OpcodeResult, VMError> {
    if state.msg.is_static {
        return Err(ExceptionalHalt::StaticModeViolation.into());
    }

    let (len, offset) = size_offset_to_usize(len, offset)?;

    // [EIP-3860] initcode size cap.
    if state.revision >= Revision::Shanghai && len > MAX_INITCODE_SIZE {
        return Err(ExceptionalHalt::OutOfGas.into());
    }

    let new_memory_size = calculate_memory_size(offset, len)?;
    state.charge_gas(gas_cost::create(
        new_memory_size,
        state.memory.len(),
        len,
        salt.is_some(),
        state.revision,
    )?)?;

    state.return_data = Bytes::new();

    // A deployer that cannot fund the endowment fails without executing the
    // initcode or reserving gas.
    if !value.is_zero() && state.host.get_balance(state.msg.recipient) < value {
        state.stack.push(FAIL_WORD)?;
        return Ok(OpcodeResult::Continue { pc_increment: 1 });
    }

    let callee_gas = gas_cost::max_message_call_gas(state.gas_left, state.revision);
    state.charge_gas(u64::try_from(callee_gas).map_err(|_| ExceptionalHalt::OutOfGas)?)?;

    let initcode = Bytes::from(state.memory.load_range(offset, len)?);

    let msg = Message {
        kind: if salt.is_some() {
            CallKind::Create2
        } else {
            CallKind::Create
        },
        depth: state.msg.depth + 1,
        gas: callee_gas,
        recipient: Default::default(), // Derived by the host.
        sender: state.msg.recipient,
        code_address: Default::default(),
        value,
        data: initcode,
        is_static: false,
        salt: salt.map(u256_to_h256),
    };

    let result = state.host.call(&msg);

    state.gas_left += result.gas_left;
    state.gas_refund += result.gas_refund;

    // Only REVERT carries output back to the deployer.
    if result.status == crate::errors::StatusCode::Revert {
        state.return_data = result.output.clone();
    }

    match result.create_address.filter(|_| result.is_success()) {
        Some(address) => state.stack.push(address_to_word(address))?,
        None => state.stack.push(FAIL_WORD)?,
    }
    Ok(OpcodeResult::Continue { pc_increment: 1 })
}

/// Implementation for the `RETURN` opcode.
pub struct OpReturnHandler;
impl OpcodeHandler for OpReturnHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [offset, len] = state.stack.pop()?;
        let (len, offset) = size_offset_to_usize(len, offset)?;

        let new_memory_size = calculate_memory_size(offset, len)?;
        state.charge_gas(memory::expansion_cost(new_memory_size, state.memory.len())?)?;

        if len != 0 {
            state.output = Bytes::from(state.memory.load_range(offset, len)?);
        }
        Ok(OpcodeResult::Halt)
    }
}

/// Implementation for the `REVERT` opcode.
pub struct OpRevertHandler;
impl OpcodeHandler for OpRevertHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let [offset, len] = state.stack.pop()?;
        let (len, offset) = size_offset_to_usize(len, offset)?;

        let new_memory_size = calculate_memory_size(offset, len)?;
        state.charge_gas(memory::expansion_cost(new_memory_size, state.memory.len())?)?;

        if len != 0 {
            state.output = Bytes::from(state.memory.load_range(offset, len)?);
        }
        Err(VMError::RevertOpcode)
    }
}

/// Implementation for the `SELFDESTRUCT` opcode.
pub struct OpSelfDestructHandler;
impl OpcodeHandler for OpSelfDestructHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        if state.msg.is_static {
            return Err(ExceptionalHalt::StaticModeViolation.into());
        }

        let beneficiary = word_to_address(state.stack.pop1()?);
        let schedule = GasSchedule::for_revision(state.revision);

        // SELFDESTRUCT charges the full cold access cost: its base cost
        // carries no warm access component.
        if state.revision >= Revision::Berlin
            && state.host.access_account(beneficiary) == AccessStatus::Cold
        {
            state.charge_gas(COLD_ACCOUNT_ACCESS_COST)?;
        }

        if state.revision >= Revision::Tangerine {
            let balance = state.host.get_balance(state.msg.recipient);
            let charge_new_account = if state.revision >= Revision::SpuriousDragon {
                !balance.is_zero() && !state.host.account_exists(beneficiary)
            } else {
                !state.host.account_exists(beneficiary)
            };
            if charge_new_account {
                state.charge_gas(schedule.selfdestruct_new_account_cost)?;
            }
        }

        let first_destruction = state
            .host
            .selfdestruct(state.msg.recipient, beneficiary);
        if first_destruction && schedule.selfdestruct_refund > 0 {
            state.gas_refund += schedule.selfdestruct_refund as i64;
        }

        Ok(OpcodeResult::Halt)
    }
}
