//! # Block information
//!
//! Includes the following opcodes:
//!   - `BLOCKHASH`, `COINBASE`, `TIMESTAMP`, `NUMBER`, `PREVRANDAO`
//!   - `GASLIMIT`, `CHAINID`, `SELFBALANCE`, `BASEFEE`
//!   - `BLOBHASH`, `BLOBBASEFEE`

use crate::{
    call_frame::ExecutionState,
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
};
use aevm_common::{
    constants::LAST_AVAILABLE_BLOCK_LIMIT,
    utils::{address_to_word, h256_to_u256},
    U256,
};

/// Implementation for the `BLOCKHASH` opcode.
pub struct OpBlockHashHandler;
impl OpcodeHandler for OpBlockHashHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let number = state.stack.pop1()?;
        let current = state.get_tx_context().block_number;

        // Only the 256 most recent ancestors are addressable; the current
        // block and anything newer hash to zero.
        let value = match u64::try_from(number) {
            Ok(number)
                if number < current
                    && number >= current.saturating_sub(LAST_AVAILABLE_BLOCK_LIMIT) =>
            {
                h256_to_u256(state.host.get_block_hash(number))
            }
            _ => U256::zero(),
        };
        state.stack.push(value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `COINBASE` opcode.
pub struct OpCoinbaseHandler;
impl OpcodeHandler for OpCoinbaseHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let coinbase = state.get_tx_context().coinbase;
        state.stack.push(address_to_word(coinbase))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `TIMESTAMP` opcode.
pub struct OpTimestampHandler;
impl OpcodeHandler for OpTimestampHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let timestamp = state.get_tx_context().block_timestamp;
        state.stack.push(U256::from(timestamp))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `NUMBER` opcode.
pub struct OpNumberHandler;
impl OpcodeHandler for OpNumberHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let number = state.get_tx_context().block_number;
        state.stack.push(U256::from(number))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `PREVRANDAO` opcode; `DIFFICULTY` before Paris.
pub struct OpPrevRandaoHandler;
impl OpcodeHandler for OpPrevRandaoHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        // The context slot carries the difficulty before Paris.
        let value = h256_to_u256(state.get_tx_context().prev_randao);
        state.stack.push(value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GASLIMIT` opcode.
pub struct OpGasLimitHandler;
impl OpcodeHandler for OpGasLimitHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let gas_limit = state.get_tx_context().block_gas_limit;
        state.stack.push(U256::from(gas_limit))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CHAINID` opcode.
pub struct OpChainIdHandler;
impl OpcodeHandler for OpChainIdHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let chain_id = state.get_tx_context().chain_id;
        state.stack.push(chain_id)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SELFBALANCE` opcode.
pub struct OpSelfBalanceHandler;
impl OpcodeHandler for OpSelfBalanceHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let balance = state.host.get_balance(state.msg.recipient);
        state.stack.push(balance)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BASEFEE` opcode.
pub struct OpBaseFeeHandler;
impl OpcodeHandler for OpBaseFeeHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let base_fee = state.get_tx_context().base_fee;
        state.stack.push(base_fee)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BLOBHASH` opcode.
pub struct OpBlobHashHandler;
impl OpcodeHandler for OpBlobHashHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let index = state.stack.pop1()?;
        let value = match usize::try_from(index) {
            Ok(index) => state
                .get_tx_context()
                .blob_hashes
                .get(index)
                .map(|hash| h256_to_u256(*hash))
                .unwrap_or_default(),
            Err(_) => U256::zero(),
        };
        state.stack.push(value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BLOBBASEFEE` opcode.
pub struct OpBlobBaseFeeHandler;
impl OpcodeHandler for OpBlobBaseFeeHandler {
    #[inline(always)]
    fn eval(state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        let blob_base_fee = state.get_tx_context().blob_base_fee;
        state.stack.push(blob_base_fee)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
