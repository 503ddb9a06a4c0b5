//! The translated program and its runtime contract.
//!
//! A translated program is a state machine over basic-block ids: entering a
//! block runs one fused precheck (base gas precharge plus both stack bound
//! checks), then the block's instructions execute without further
//! per-instruction prechecks. Dynamic jumps binary-search the sorted
//! jumpdest map for the target block id; a miss routes to the epilogue with
//! `BadJumpDestination`. The epilogue is the only place that materializes
//! `OutOfGas`: the precheck lets the gas counter go negative and the exit
//! test (at the position selected by the gas-check placement policy) only
//! branches on its sign.

use crate::{
    analysis::CodeAnalysis,
    aot::{GasCheckPlacement, TranslatorConfig},
    call_frame::ExecutionState,
    errors::{OpcodeResult, StatusCode},
    host::{ExecutionResult, Host, Message},
    interpreter::invoke_handler,
    opcodes::Opcode,
    stack::Stack,
};
use aevm_common::{constants::STACK_LIMIT, Revision, U256};
use bytes::Bytes;

/// Summary of a basic block, computed at translation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSummary {
    /// Bytecode offset of the block's first instruction.
    pub offset: u32,
    /// Sum of the base gas costs of the block's instructions.
    pub base_gas_cost: i64,
    /// Minimum stack height required to enter the block.
    pub stack_required: i32,
    /// Maximum cumulative stack growth while executing the block.
    pub stack_max_growth: i32,
}

/// One dispatch step of a translated block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Invoke a single instruction implementation.
    Invoke {
        offset: u32,
        op: u8,
        /// Decoded PUSH immediate; carried for emission.
        imm: Option<U256>,
    },
    /// Fused PUSHk + JUMP super-instruction.
    PushJump { target: U256 },
    /// Fused PUSHk + JUMPI super-instruction; pops only the condition.
    PushJumpI { target: U256 },
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub summary: BlockSummary,
    pub steps: Vec<Step>,
    /// Set when the block contains INVALID or an instruction undefined in
    /// the target revision. Such blocks get no code region; entering one
    /// exits with the recorded status.
    pub invalid: Option<StatusCode>,
}

/// Compile-time sorted map from bytecode offsets to block ids.
#[derive(Debug, Clone, Default)]
pub struct JumpdestMap {
    offsets: Vec<u32>,
    blocks: Vec<u32>,
}

impl JumpdestMap {
    pub fn new(offsets: Vec<u32>, blocks: Vec<u32>) -> Self {
        debug_assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        debug_assert_eq!(offsets.len(), blocks.len());
        Self { offsets, blocks }
    }

    /// True iff `offset` is a known jump destination.
    pub fn is_jumpdest(&self, offset: U256) -> bool {
        self.lookup(offset).is_some()
    }

    /// Block id behind a jump target, or `None` for the bad-jump handler.
    pub fn lookup(&self, offset: U256) -> Option<u32> {
        let offset = u32::try_from(offset).ok()?;
        let index = self.offsets.binary_search(&offset).ok()?;
        self.blocks.get(index).copied()
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn blocks(&self) -> &[u32] {
        &self.blocks
    }
}

/// A bytecode program translated ahead of time.
#[derive(Debug, Clone)]
pub struct TranslatedProgram {
    pub revision: Revision,
    pub blocks: Vec<BasicBlock>,
    pub jumpdest_map: JumpdestMap,
    pub config: TranslatorConfig,
}

/// Checks the block's preconditions and precharges its base gas cost.
///
/// The gas counter may go negative here; only the stack bounds produce a
/// status directly. Out-of-gas detection is deferred to the exit test.
#[inline(always)]
pub fn check_block_requirements(summary: &BlockSummary, gas_left: &mut i64, stack: &Stack) -> StatusCode {
    *gas_left -= summary.base_gas_cost;
    let height = stack.len() as i64;
    if height < summary.stack_required as i64 {
        return StatusCode::StackUnderflow;
    }
    if height + summary.stack_max_growth as i64 > STACK_LIMIT as i64 {
        return StatusCode::StackOverflow;
    }
    StatusCode::Success
}

impl TranslatedProgram {
    /// Executes the translated program. Must be given the analysis of the
    /// same code it was translated from.
    pub fn execute(
        &self,
        analysis: &CodeAnalysis,
        msg: &Message,
        host: &mut dyn Host,
    ) -> ExecutionResult {
        let mut state = ExecutionState::new(msg, self.revision, analysis, host);
        let status = self.run(&mut state);
        self.epilogue(state, status)
    }

    fn run(&self, state: &mut ExecutionState<'_>) -> StatusCode {
        let placement = self.config.gas_check_placement;
        let gas_check = !self.config.gas_check_disabled;

        let mut block_id = 0usize;
        'dispatch: loop {
            let Some(block) = self.blocks.get(block_id) else {
                // Ran off the end of the code; the implicit STOP.
                return StatusCode::Success;
            };
            if let Some(status) = block.invalid {
                return status;
            }

            let status = check_block_requirements(&block.summary, &mut state.gas_left, &state.stack);
            if (gas_check && placement == GasCheckPlacement::BlockStart && state.gas_left < 0)
                || status != StatusCode::Success
            {
                return status;
            }

            for step in &block.steps {
                match step {
                    Step::Invoke { offset, op, .. } => {
                        state.pc = *offset as usize;
                        let op = *op;

                        if op == u8::from(Opcode::JUMPDEST) {
                            if gas_check
                                && placement == GasCheckPlacement::AtJumpdest
                                && state.gas_left < 0
                            {
                                return StatusCode::Success;
                            }
                            continue;
                        }

                        if op == u8::from(Opcode::JUMP) || op == u8::from(Opcode::JUMPI) {
                            let Ok(target) = state.stack.pop1() else {
                                return StatusCode::StackUnderflow;
                            };
                            if op == u8::from(Opcode::JUMPI) {
                                let Ok(condition) = state.stack.pop1() else {
                                    return StatusCode::StackUnderflow;
                                };
                                if condition.is_zero() {
                                    continue;
                                }
                            }
                            if gas_check
                                && placement == GasCheckPlacement::BeforeJump
                                && state.gas_left < 0
                            {
                                return StatusCode::Success;
                            }
                            match self.jumpdest_map.lookup(target) {
                                Some(next) => {
                                    block_id = next as usize;
                                    continue 'dispatch;
                                }
                                None => return StatusCode::BadJumpDestination,
                            }
                        }

                        match invoke_handler(op, state) {
                            Ok(OpcodeResult::Continue { .. }) => {}
                            Ok(OpcodeResult::Halt) => return StatusCode::Success,
                            Err(err) => return StatusCode::from(&err),
                        }
                    }
                    Step::PushJump { target } => {
                        if gas_check
                            && placement == GasCheckPlacement::BeforeJump
                            && state.gas_left < 0
                        {
                            return StatusCode::Success;
                        }
                        match self.jumpdest_map.lookup(*target) {
                            Some(next) => {
                                block_id = next as usize;
                                continue 'dispatch;
                            }
                            None => return StatusCode::BadJumpDestination,
                        }
                    }
                    Step::PushJumpI { target } => {
                        let Ok(condition) = state.stack.pop1() else {
                            return StatusCode::StackUnderflow;
                        };
                        if condition.is_zero() {
                            continue;
                        }
                        if gas_check
                            && placement == GasCheckPlacement::BeforeJump
                            && state.gas_left < 0
                        {
                            return StatusCode::Success;
                        }
                        match self.jumpdest_map.lookup(*target) {
                            Some(next) => {
                                block_id = next as usize;
                                continue 'dispatch;
                            }
                            None => return StatusCode::BadJumpDestination,
                        }
                    }
                }
            }

            // Fall through to the next block (the one opened by a JUMPDEST
            // right after this block's last instruction).
            block_id += 1;
        }
    }

    /// The shared exit path: folds `gas < 0` into `OutOfGas` and builds the
    /// frame result.
    fn epilogue(&self, mut state: ExecutionState<'_>, status: StatusCode) -> ExecutionResult {
        finalize_result(&mut state, status, !self.config.gas_check_disabled)
    }
}

/// Outcome of one emitted `INVOKE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Proceed to the next step.
    Next,
    /// Route to the epilogue with this status.
    Exit(StatusCode),
}

/// Invokes one instruction inside a translated block. The block precheck has
/// already charged the base cost and validated the stack bounds.
#[inline(always)]
pub fn invoke_step(state: &mut ExecutionState<'_>, op: u8) -> StepOutcome {
    match invoke_handler(op, state) {
        Ok(OpcodeResult::Continue { .. }) => StepOutcome::Next,
        Ok(OpcodeResult::Halt) => StepOutcome::Exit(StatusCode::Success),
        Err(err) => StepOutcome::Exit(StatusCode::from(&err)),
    }
}

/// The epilogue body shared by the in-memory executor and emitted code:
/// folds `gas < 0` into `OutOfGas` (unless the gas check is disabled) and
/// builds the frame result.
pub fn finalize_result(
    state: &mut ExecutionState<'_>,
    mut status: StatusCode,
    gas_check: bool,
) -> ExecutionResult {
    if gas_check && state.gas_left < 0 {
        status = StatusCode::OutOfGas;
    }
    ExecutionResult {
        status,
        gas_left: if status.keeps_gas() {
            state.gas_left.max(0)
        } else {
            0
        },
        gas_refund: if status.is_success() { state.gas_refund } else { 0 },
        output: if status.keeps_gas() {
            std::mem::take(&mut state.output)
        } else {
            Bytes::new()
        },
        create_address: None,
    }
}

/// Opens a `BLOCK_START` region in emitted code: runs the fused block
/// precheck and exits to the epilogue when it fails (or, under the
/// block-start gas policy, when the counter went negative).
#[macro_export]
macro_rules! block_start {
    ($state:expr, $status:ident, $exit:lifetime, $summary:expr, $check_gas_here:expr) => {
        $status = $crate::aot::program::check_block_requirements(
            &$summary,
            &mut $state.gas_left,
            &$state.stack,
        );
        if ($check_gas_here && $state.gas_left < 0)
            || $status != $crate::errors::StatusCode::Success
        {
            break $exit;
        }
    };
}

/// An `INVOKE` of a non-control instruction in emitted code.
#[macro_export]
macro_rules! invoke {
    ($state:expr, $status:ident, $exit:lifetime, $op:expr, $offset:expr) => {
        $state.pc = $offset;
        match $crate::aot::program::invoke_step($state, $op) {
            $crate::aot::program::StepOutcome::Next => {}
            $crate::aot::program::StepOutcome::Exit(code) => {
                $status = code;
                break $exit;
            }
        }
    };
}

/// An `INVOKE` of JUMP or JUMPI in emitted code: pops the target (and the
/// condition), applies the before-jump gas policy and dispatches through the
/// jumpdest map or to the epilogue.
#[macro_export]
macro_rules! invoke_jump {
    ($state:expr, $status:ident, $exit:lifetime, $map:expr, $block:ident,
     conditional: $conditional:expr, check_gas: $check_gas_here:expr) => {
        let target = match $state.stack.pop1() {
            Ok(target) => target,
            Err(_) => {
                $status = $crate::errors::StatusCode::StackUnderflow;
                break $exit;
            }
        };
        let taken = if $conditional {
            match $state.stack.pop1() {
                Ok(condition) => !condition.is_zero(),
                Err(_) => {
                    $status = $crate::errors::StatusCode::StackUnderflow;
                    break $exit;
                }
            }
        } else {
            true
        };
        if taken {
            if $check_gas_here && $state.gas_left < 0 {
                break $exit;
            }
            match $map.lookup(target) {
                Some(next) => {
                    $block = next;
                    continue $exit;
                }
                None => {
                    $status = $crate::errors::StatusCode::BadJumpDestination;
                    break $exit;
                }
            }
        }
    };
}

/// A `PUSHnJUMP`/`PUSHnJUMPI` super-instruction in emitted code: the target
/// is a compile-time constant, so the push and the target pop are elided.
#[macro_export]
macro_rules! push_n_jump {
    ($state:expr, $status:ident, $exit:lifetime, $map:expr, $block:ident,
     target: $target:expr, conditional: $conditional:expr, check_gas: $check_gas_here:expr) => {
        let taken = if $conditional {
            match $state.stack.pop1() {
                Ok(condition) => !condition.is_zero(),
                Err(_) => {
                    $status = $crate::errors::StatusCode::StackUnderflow;
                    break $exit;
                }
            }
        } else {
            true
        };
        if taken {
            if $check_gas_here && $state.gas_left < 0 {
                break $exit;
            }
            match $map.lookup($crate::aot::program::jump_target($target)) {
                Some(next) => {
                    $block = next;
                    continue $exit;
                }
                None => {
                    $status = $crate::errors::StatusCode::BadJumpDestination;
                    break $exit;
                }
            }
        }
    };
}

/// Builds the jump-target word from a fused immediate in emitted code.
#[inline(always)]
pub fn jump_target(offset: u64) -> U256 {
    U256::from(offset)
}
