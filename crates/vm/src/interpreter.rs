//! Baseline interpreter: the reference dispatch loop.
//!
//! Each iteration folds the instruction precheck into one step — undefined
//! check, stack overflow check (only for instructions that grow the stack),
//! stack underflow check (only for instructions with operands), and the base
//! gas charge — then invokes the handler and advances. The trailing STOP
//! padding guarantees the loop terminates on well-formed programs.

use crate::{
    analysis::CodeAnalysis,
    call_frame::ExecutionState,
    errors::{ExceptionalHalt, OpcodeResult, StatusCode, VMError},
    host::{ExecutionResult, Host, Message},
    instruction_table::{cost_table, instruction_info, CostTable, InstructionInfo},
    opcode_handlers::{
        arithmetic::*, bitwise_comparison::*, block::*, dup::*, environment::*, exchange::*,
        keccak::*, logging::*, push::*, stack_memory_storage_flow::*, system::*, OpInvalidHandler,
        OpStopHandler, OpcodeHandler,
    },
    opcodes::Opcode,
};
use aevm_common::{constants::STACK_LIMIT, Revision};
use bytes::Bytes;

/// An opcode handler function pointer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpCodeFn(fn(&mut ExecutionState<'_>) -> Result<OpcodeResult, VMError>);

impl OpCodeFn {
    pub const fn new<T>() -> Self
    where
        T: OpcodeHandler,
    {
        Self(T::eval)
    }

    #[inline(always)]
    pub fn call(self, state: &mut ExecutionState<'_>) -> Result<OpcodeResult, VMError> {
        (self.0)(state)
    }
}

/// Executes `msg` against analyzed code with the baseline interpreter.
pub fn execute(
    revision: Revision,
    analysis: &CodeAnalysis,
    msg: &Message,
    host: &mut dyn Host,
) -> ExecutionResult {
    let mut state = ExecutionState::new(msg, revision, analysis, host);
    let outcome = dispatch(&mut state);
    build_result(state, outcome)
}

/// Checks one instruction's requirements before invoking it.
#[inline(always)]
fn check_requirements(
    base_cost: i16,
    info: &InstructionInfo,
    gas_left: &mut i64,
    stack_len: usize,
) -> Result<(), ExceptionalHalt> {
    // A negative cost marks an undefined instruction. This check must come
    // first to produce the right status.
    if base_cost < 0 {
        return Err(ExceptionalHalt::UndefinedInstruction);
    }
    if info.stack_height_change > 0 {
        debug_assert!(info.stack_height_change == 1);
        if stack_len >= STACK_LIMIT {
            return Err(ExceptionalHalt::StackOverflow);
        }
    }
    if info.stack_height_required > 0 && stack_len < info.stack_height_required as usize {
        return Err(ExceptionalHalt::StackUnderflow);
    }
    *gas_left -= base_cost as i64;
    if *gas_left < 0 {
        return Err(ExceptionalHalt::OutOfGas);
    }
    Ok(())
}

fn dispatch(state: &mut ExecutionState<'_>) -> Result<(), VMError> {
    let costs: &CostTable = cost_table(state.revision);

    loop {
        let op = state
            .analysis
            .padded_code()
            .get(state.pc)
            .copied()
            .unwrap_or(Opcode::STOP.into());
        let info = instruction_info(op);

        check_requirements(
            costs[op as usize],
            info,
            &mut state.gas_left,
            state.stack.len(),
        )?;

        match HANDLER_TABLE[op as usize].call(state)? {
            OpcodeResult::Continue { pc_increment } => {
                state.pc = state.pc.wrapping_add(pc_increment);
            }
            OpcodeResult::Halt => return Ok(()),
        }
    }
}

/// Folds the dispatch outcome into the frame result: only success and revert
/// keep the remaining gas, only success keeps the refund and a revert keeps
/// its output.
fn build_result(state: ExecutionState<'_>, outcome: Result<(), VMError>) -> ExecutionResult {
    let status = match &outcome {
        Ok(()) => StatusCode::Success,
        Err(err) => err.into(),
    };
    ExecutionResult {
        status,
        gas_left: if status.keeps_gas() { state.gas_left } else { 0 },
        gas_refund: if status.is_success() { state.gas_refund } else { 0 },
        output: if status.keeps_gas() {
            state.output
        } else {
            Bytes::new()
        },
        create_address: None,
    }
}

#[allow(clippy::as_conversions, clippy::indexing_slicing)]
static HANDLER_TABLE: [OpCodeFn; 256] = const {
    let mut table: [OpCodeFn; 256] = [OpCodeFn::new::<OpInvalidHandler>(); 256];

    table[Opcode::STOP as usize] = OpCodeFn::new::<OpStopHandler>();
    table[Opcode::ADD as usize] = OpCodeFn::new::<OpAddHandler>();
    table[Opcode::MUL as usize] = OpCodeFn::new::<OpMulHandler>();
    table[Opcode::SUB as usize] = OpCodeFn::new::<OpSubHandler>();
    table[Opcode::DIV as usize] = OpCodeFn::new::<OpDivHandler>();
    table[Opcode::SDIV as usize] = OpCodeFn::new::<OpSDivHandler>();
    table[Opcode::MOD as usize] = OpCodeFn::new::<OpModHandler>();
    table[Opcode::SMOD as usize] = OpCodeFn::new::<OpSModHandler>();
    table[Opcode::ADDMOD as usize] = OpCodeFn::new::<OpAddModHandler>();
    table[Opcode::MULMOD as usize] = OpCodeFn::new::<OpMulModHandler>();
    table[Opcode::EXP as usize] = OpCodeFn::new::<OpExpHandler>();
    table[Opcode::SIGNEXTEND as usize] = OpCodeFn::new::<OpSignExtendHandler>();

    table[Opcode::LT as usize] = OpCodeFn::new::<OpLtHandler>();
    table[Opcode::GT as usize] = OpCodeFn::new::<OpGtHandler>();
    table[Opcode::SLT as usize] = OpCodeFn::new::<OpSLtHandler>();
    table[Opcode::SGT as usize] = OpCodeFn::new::<OpSGtHandler>();
    table[Opcode::EQ as usize] = OpCodeFn::new::<OpEqHandler>();
    table[Opcode::ISZERO as usize] = OpCodeFn::new::<OpIsZeroHandler>();
    table[Opcode::AND as usize] = OpCodeFn::new::<OpAndHandler>();
    table[Opcode::OR as usize] = OpCodeFn::new::<OpOrHandler>();
    table[Opcode::XOR as usize] = OpCodeFn::new::<OpXorHandler>();
    table[Opcode::NOT as usize] = OpCodeFn::new::<OpNotHandler>();
    table[Opcode::BYTE as usize] = OpCodeFn::new::<OpByteHandler>();
    table[Opcode::SHL as usize] = OpCodeFn::new::<OpShlHandler>();
    table[Opcode::SHR as usize] = OpCodeFn::new::<OpShrHandler>();
    table[Opcode::SAR as usize] = OpCodeFn::new::<OpSarHandler>();

    table[Opcode::KECCAK256 as usize] = OpCodeFn::new::<OpKeccak256Handler>();

    table[Opcode::ADDRESS as usize] = OpCodeFn::new::<OpAddressHandler>();
    table[Opcode::BALANCE as usize] = OpCodeFn::new::<OpBalanceHandler>();
    table[Opcode::ORIGIN as usize] = OpCodeFn::new::<OpOriginHandler>();
    table[Opcode::CALLER as usize] = OpCodeFn::new::<OpCallerHandler>();
    table[Opcode::CALLVALUE as usize] = OpCodeFn::new::<OpCallValueHandler>();
    table[Opcode::CALLDATALOAD as usize] = OpCodeFn::new::<OpCallDataLoadHandler>();
    table[Opcode::CALLDATASIZE as usize] = OpCodeFn::new::<OpCallDataSizeHandler>();
    table[Opcode::CALLDATACOPY as usize] = OpCodeFn::new::<OpCallDataCopyHandler>();
    table[Opcode::CODESIZE as usize] = OpCodeFn::new::<OpCodeSizeHandler>();
    table[Opcode::CODECOPY as usize] = OpCodeFn::new::<OpCodeCopyHandler>();
    table[Opcode::GASPRICE as usize] = OpCodeFn::new::<OpGasPriceHandler>();
    table[Opcode::EXTCODESIZE as usize] = OpCodeFn::new::<OpExtCodeSizeHandler>();
    table[Opcode::EXTCODECOPY as usize] = OpCodeFn::new::<OpExtCodeCopyHandler>();
    table[Opcode::RETURNDATASIZE as usize] = OpCodeFn::new::<OpReturnDataSizeHandler>();
    table[Opcode::RETURNDATACOPY as usize] = OpCodeFn::new::<OpReturnDataCopyHandler>();
    table[Opcode::EXTCODEHASH as usize] = OpCodeFn::new::<OpExtCodeHashHandler>();

    table[Opcode::BLOCKHASH as usize] = OpCodeFn::new::<OpBlockHashHandler>();
    table[Opcode::COINBASE as usize] = OpCodeFn::new::<OpCoinbaseHandler>();
    table[Opcode::TIMESTAMP as usize] = OpCodeFn::new::<OpTimestampHandler>();
    table[Opcode::NUMBER as usize] = OpCodeFn::new::<OpNumberHandler>();
    table[Opcode::PREVRANDAO as usize] = OpCodeFn::new::<OpPrevRandaoHandler>();
    table[Opcode::GASLIMIT as usize] = OpCodeFn::new::<OpGasLimitHandler>();
    table[Opcode::CHAINID as usize] = OpCodeFn::new::<OpChainIdHandler>();
    table[Opcode::SELFBALANCE as usize] = OpCodeFn::new::<OpSelfBalanceHandler>();
    table[Opcode::BASEFEE as usize] = OpCodeFn::new::<OpBaseFeeHandler>();
    table[Opcode::BLOBHASH as usize] = OpCodeFn::new::<OpBlobHashHandler>();
    table[Opcode::BLOBBASEFEE as usize] = OpCodeFn::new::<OpBlobBaseFeeHandler>();

    table[Opcode::POP as usize] = OpCodeFn::new::<OpPopHandler>();
    table[Opcode::MLOAD as usize] = OpCodeFn::new::<OpMLoadHandler>();
    table[Opcode::MSTORE as usize] = OpCodeFn::new::<OpMStoreHandler>();
    table[Opcode::MSTORE8 as usize] = OpCodeFn::new::<OpMStore8Handler>();
    table[Opcode::SLOAD as usize] = OpCodeFn::new::<OpSLoadHandler>();
    table[Opcode::SSTORE as usize] = OpCodeFn::new::<OpSStoreHandler>();
    table[Opcode::JUMP as usize] = OpCodeFn::new::<OpJumpHandler>();
    table[Opcode::JUMPI as usize] = OpCodeFn::new::<OpJumpIHandler>();
    table[Opcode::PC as usize] = OpCodeFn::new::<OpPcHandler>();
    table[Opcode::MSIZE as usize] = OpCodeFn::new::<OpMSizeHandler>();
    table[Opcode::GAS as usize] = OpCodeFn::new::<OpGasHandler>();
    table[Opcode::JUMPDEST as usize] = OpCodeFn::new::<OpJumpDestHandler>();
    table[Opcode::TLOAD as usize] = OpCodeFn::new::<OpTLoadHandler>();
    table[Opcode::TSTORE as usize] = OpCodeFn::new::<OpTStoreHandler>();
    table[Opcode::MCOPY as usize] = OpCodeFn::new::<OpMCopyHandler>();

    table[Opcode::PUSH0 as usize] = OpCodeFn::new::<OpPush0Handler>();
    table[Opcode::PUSH1 as usize] = OpCodeFn::new::<OpPushHandler<1>>();
    table[Opcode::PUSH2 as usize] = OpCodeFn::new::<OpPushHandler<2>>();
    table[Opcode::PUSH3 as usize] = OpCodeFn::new::<OpPushHandler<3>>();
    table[Opcode::PUSH4 as usize] = OpCodeFn::new::<OpPushHandler<4>>();
    table[Opcode::PUSH5 as usize] = OpCodeFn::new::<OpPushHandler<5>>();
    table[Opcode::PUSH6 as usize] = OpCodeFn::new::<OpPushHandler<6>>();
    table[Opcode::PUSH7 as usize] = OpCodeFn::new::<OpPushHandler<7>>();
    table[Opcode::PUSH8 as usize] = OpCodeFn::new::<OpPushHandler<8>>();
    table[Opcode::PUSH9 as usize] = OpCodeFn::new::<OpPushHandler<9>>();
    table[Opcode::PUSH10 as usize] = OpCodeFn::new::<OpPushHandler<10>>();
    table[Opcode::PUSH11 as usize] = OpCodeFn::new::<OpPushHandler<11>>();
    table[Opcode::PUSH12 as usize] = OpCodeFn::new::<OpPushHandler<12>>();
    table[Opcode::PUSH13 as usize] = OpCodeFn::new::<OpPushHandler<13>>();
    table[Opcode::PUSH14 as usize] = OpCodeFn::new::<OpPushHandler<14>>();
    table[Opcode::PUSH15 as usize] = OpCodeFn::new::<OpPushHandler<15>>();
    table[Opcode::PUSH16 as usize] = OpCodeFn::new::<OpPushHandler<16>>();
    table[Opcode::PUSH17 as usize] = OpCodeFn::new::<OpPushHandler<17>>();
    table[Opcode::PUSH18 as usize] = OpCodeFn::new::<OpPushHandler<18>>();
    table[Opcode::PUSH19 as usize] = OpCodeFn::new::<OpPushHandler<19>>();
    table[Opcode::PUSH20 as usize] = OpCodeFn::new::<OpPushHandler<20>>();
    table[Opcode::PUSH21 as usize] = OpCodeFn::new::<OpPushHandler<21>>();
    table[Opcode::PUSH22 as usize] = OpCodeFn::new::<OpPushHandler<22>>();
    table[Opcode::PUSH23 as usize] = OpCodeFn::new::<OpPushHandler<23>>();
    table[Opcode::PUSH24 as usize] = OpCodeFn::new::<OpPushHandler<24>>();
    table[Opcode::PUSH25 as usize] = OpCodeFn::new::<OpPushHandler<25>>();
    table[Opcode::PUSH26 as usize] = OpCodeFn::new::<OpPushHandler<26>>();
    table[Opcode::PUSH27 as usize] = OpCodeFn::new::<OpPushHandler<27>>();
    table[Opcode::PUSH28 as usize] = OpCodeFn::new::<OpPushHandler<28>>();
    table[Opcode::PUSH29 as usize] = OpCodeFn::new::<OpPushHandler<29>>();
    table[Opcode::PUSH30 as usize] = OpCodeFn::new::<OpPushHandler<30>>();
    table[Opcode::PUSH31 as usize] = OpCodeFn::new::<OpPushHandler<31>>();
    table[Opcode::PUSH32 as usize] = OpCodeFn::new::<OpPushHandler<32>>();

    table[Opcode::DUP1 as usize] = OpCodeFn::new::<OpDupHandler<0>>();
    table[Opcode::DUP2 as usize] = OpCodeFn::new::<OpDupHandler<1>>();
    table[Opcode::DUP3 as usize] = OpCodeFn::new::<OpDupHandler<2>>();
    table[Opcode::DUP4 as usize] = OpCodeFn::new::<OpDupHandler<3>>();
    table[Opcode::DUP5 as usize] = OpCodeFn::new::<OpDupHandler<4>>();
    table[Opcode::DUP6 as usize] = OpCodeFn::new::<OpDupHandler<5>>();
    table[Opcode::DUP7 as usize] = OpCodeFn::new::<OpDupHandler<6>>();
    table[Opcode::DUP8 as usize] = OpCodeFn::new::<OpDupHandler<7>>();
    table[Opcode::DUP9 as usize] = OpCodeFn::new::<OpDupHandler<8>>();
    table[Opcode::DUP10 as usize] = OpCodeFn::new::<OpDupHandler<9>>();
    table[Opcode::DUP11 as usize] = OpCodeFn::new::<OpDupHandler<10>>();
    table[Opcode::DUP12 as usize] = OpCodeFn::new::<OpDupHandler<11>>();
    table[Opcode::DUP13 as usize] = OpCodeFn::new::<OpDupHandler<12>>();
    table[Opcode::DUP14 as usize] = OpCodeFn::new::<OpDupHandler<13>>();
    table[Opcode::DUP15 as usize] = OpCodeFn::new::<OpDupHandler<14>>();
    table[Opcode::DUP16 as usize] = OpCodeFn::new::<OpDupHandler<15>>();

    table[Opcode::SWAP1 as usize] = OpCodeFn::new::<OpSwapHandler<1>>();
    table[Opcode::SWAP2 as usize] = OpCodeFn::new::<OpSwapHandler<2>>();
    table[Opcode::SWAP3 as usize] = OpCodeFn::new::<OpSwapHandler<3>>();
    table[Opcode::SWAP4 as usize] = OpCodeFn::new::<OpSwapHandler<4>>();
    table[Opcode::SWAP5 as usize] = OpCodeFn::new::<OpSwapHandler<5>>();
    table[Opcode::SWAP6 as usize] = OpCodeFn::new::<OpSwapHandler<6>>();
    table[Opcode::SWAP7 as usize] = OpCodeFn::new::<OpSwapHandler<7>>();
    table[Opcode::SWAP8 as usize] = OpCodeFn::new::<OpSwapHandler<8>>();
    table[Opcode::SWAP9 as usize] = OpCodeFn::new::<OpSwapHandler<9>>();
    table[Opcode::SWAP10 as usize] = OpCodeFn::new::<OpSwapHandler<10>>();
    table[Opcode::SWAP11 as usize] = OpCodeFn::new::<OpSwapHandler<11>>();
    table[Opcode::SWAP12 as usize] = OpCodeFn::new::<OpSwapHandler<12>>();
    table[Opcode::SWAP13 as usize] = OpCodeFn::new::<OpSwapHandler<13>>();
    table[Opcode::SWAP14 as usize] = OpCodeFn::new::<OpSwapHandler<14>>();
    table[Opcode::SWAP15 as usize] = OpCodeFn::new::<OpSwapHandler<15>>();
    table[Opcode::SWAP16 as usize] = OpCodeFn::new::<OpSwapHandler<16>>();

    table[Opcode::LOG0 as usize] = OpCodeFn::new::<OpLogHandler<0>>();
    table[Opcode::LOG1 as usize] = OpCodeFn::new::<OpLogHandler<1>>();
    table[Opcode::LOG2 as usize] = OpCodeFn::new::<OpLogHandler<2>>();
    table[Opcode::LOG3 as usize] = OpCodeFn::new::<OpLogHandler<3>>();
    table[Opcode::LOG4 as usize] = OpCodeFn::new::<OpLogHandler<4>>();

    table[Opcode::CREATE as usize] = OpCodeFn::new::<OpCreateHandler>();
    table[Opcode::CALL as usize] = OpCodeFn::new::<OpCallHandler>();
    table[Opcode::CALLCODE as usize] = OpCodeFn::new::<OpCallCodeHandler>();
    table[Opcode::RETURN as usize] = OpCodeFn::new::<OpReturnHandler>();
    table[Opcode::DELEGATECALL as usize] = OpCodeFn::new::<OpDelegateCallHandler>();
    table[Opcode::CREATE2 as usize] = OpCodeFn::new::<OpCreate2Handler>();
    table[Opcode::STATICCALL as usize] = OpCodeFn::new::<OpStaticCallHandler>();
    table[Opcode::REVERT as usize] = OpCodeFn::new::<OpRevertHandler>();
    table[Opcode::SELFDESTRUCT as usize] = OpCodeFn::new::<OpSelfDestructHandler>();

    table
};

/// Invokes one opcode's handler directly; used by the translated-block
/// runtime, which performs its own precheck per basic block.
#[inline(always)]
pub(crate) fn invoke_handler(
    op: u8,
    state: &mut ExecutionState<'_>,
) -> Result<OpcodeResult, VMError> {
    HANDLER_TABLE[op as usize].call(state)
}
