//! Basic-block analyzer.
//!
//! Walks the bytecode linearly: a new block starts when the previous byte
//! was a terminator or the current byte is JUMPDEST. Each block gets a
//! one-pass summary of its base gas cost and stack requirements, and
//! adjacent PUSHk + JUMP(I) pairs are detected for fusion.

use crate::{
    analysis::CodeAnalysis,
    aot::{
        program::{BasicBlock, BlockSummary, JumpdestMap, Step, TranslatedProgram},
        TranslatorConfig,
    },
    errors::StatusCode,
    instruction_table::{cost_table, instruction_info},
    opcodes::Opcode,
};
use aevm_common::{utils::u256_from_big_endian, Revision, U256};

/// One decoded instruction before block summarization.
#[derive(Debug, Clone)]
struct DecodedInstr {
    offset: u32,
    op: u8,
    imm: Option<U256>,
}

pub fn analyze_blocks(
    revision: Revision,
    analysis: &CodeAnalysis,
    config: TranslatorConfig,
) -> TranslatedProgram {
    let code = analysis.original_code();
    let costs = cost_table(revision);

    // Partition into maximal straight-line runs.
    let mut raw_blocks: Vec<Vec<DecodedInstr>> = Vec::new();
    let mut jumpdests: Vec<u32> = Vec::new();
    let mut start_new_block = true;
    let mut i = 0usize;
    while i < code.len() {
        let op = code[i];
        if op == u8::from(Opcode::JUMPDEST) {
            start_new_block = true;
            jumpdests.push(i as u32);
        }
        if start_new_block {
            raw_blocks.push(Vec::new());
            start_new_block = false;
        }

        let imm_size = Opcode::immediate_size(op);
        let imm = (imm_size > 0).then(|| {
            // A truncated trailing immediate reads as zero-padded.
            let end = (i + 1 + imm_size).min(code.len());
            let mut bytes = [0u8; 32];
            bytes[32 - imm_size..32 - imm_size + (end - i - 1)].copy_from_slice(&code[i + 1..end]);
            u256_from_big_endian(&bytes[32 - imm_size..])
        });
        // `raw_blocks` is never empty here.
        if let Some(block) = raw_blocks.last_mut() {
            block.push(DecodedInstr {
                offset: i as u32,
                op,
                imm,
            });
        }

        if Opcode::is_terminator(op) {
            start_new_block = true;
        }
        i += 1 + imm_size;
    }

    // Summarize each block and build its step list.
    let mut blocks = Vec::with_capacity(raw_blocks.len());
    for instrs in &raw_blocks {
        blocks.push(summarize_block(instrs, costs, config));
    }

    // Map each jumpdest offset to the block starting there; blocks are in
    // ascending offset order.
    let mut jumpdest_blocks = Vec::with_capacity(jumpdests.len());
    for &offset in &jumpdests {
        let block = blocks
            .binary_search_by_key(&offset, |b: &BasicBlock| b.summary.offset)
            .unwrap_or(usize::MAX) as u32;
        jumpdest_blocks.push(block);
    }

    tracing::debug!(
        blocks = blocks.len(),
        jumpdests = jumpdests.len(),
        code_len = code.len(),
        "translated bytecode"
    );

    TranslatedProgram {
        revision,
        blocks,
        jumpdest_map: JumpdestMap::new(jumpdests, jumpdest_blocks),
        config,
    }
}

fn summarize_block(
    instrs: &[DecodedInstr],
    costs: &[i16; 256],
    config: TranslatorConfig,
) -> BasicBlock {
    let mut base_gas_cost: i64 = 0;
    let mut stack_required: i32 = 0;
    let mut stack_max_growth: i32 = 0;
    let mut stack_change: i32 = 0;
    let mut invalid: Option<StatusCode> = None;

    for instr in instrs {
        let info = instruction_info(instr.op);
        let cost = costs[instr.op as usize];
        if cost < 0 && invalid.is_none() {
            invalid = Some(StatusCode::UndefinedInstruction);
        }
        if instr.op == u8::from(Opcode::INVALID) && invalid.is_none() {
            invalid = Some(StatusCode::InvalidInstruction);
        }
        base_gas_cost += cost.max(0) as i64;

        // The requirement is measured before this instruction's own delta.
        stack_required = stack_required.max(info.stack_height_required as i32 - stack_change);
        stack_change += info.stack_height_change as i32;
        stack_max_growth = stack_max_growth.max(stack_change);
    }

    // Fuse PUSHk immediately followed by JUMP or JUMPI.
    let mut steps = Vec::with_capacity(instrs.len());
    let mut i = 0;
    while i < instrs.len() {
        let instr = &instrs[i];
        let is_push = Opcode::is_push_with_immediate(instr.op);
        let next_op = instrs.get(i + 1).map(|next| next.op);
        let fused = config.fuse_push_jump
            && is_push
            && matches!(
                next_op,
                Some(op) if op == u8::from(Opcode::JUMP) || op == u8::from(Opcode::JUMPI)
            );
        if fused {
            let target = instr.imm.unwrap_or_default();
            if next_op == Some(u8::from(Opcode::JUMP)) {
                steps.push(Step::PushJump { target });
            } else {
                steps.push(Step::PushJumpI { target });
            }
            i += 2;
        } else {
            steps.push(Step::Invoke {
                offset: instr.offset,
                op: instr.op,
                imm: instr.imm,
            });
            i += 1;
        }
    }

    BasicBlock {
        summary: BlockSummary {
            offset: instrs.first().map(|instr| instr.offset).unwrap_or(0),
            base_gas_cost,
            stack_required,
            stack_max_growth,
        },
        steps,
        invalid,
    }
}
