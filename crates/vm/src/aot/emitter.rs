//! Renders a translated program as a Rust source file.
//!
//! The emitted file contains one function per compiled contract, named
//! after the keccak hash of its code. The function body follows the
//! translated-block runtime contract: a prologue, one `BLOCK_START` region
//! per valid basic block, every instruction dispatched through `INVOKE` or a
//! `PUSHnJUMP`/`PUSHnJUMPI` super-instruction, and the shared epilogue. The
//! jumpdest map is a compile-time-constant sorted array of
//! `(offset, block)` pairs.

use crate::{
    aot::{
        program::{BasicBlock, Step, TranslatedProgram},
        GasCheckPlacement,
    },
    instruction_table::instruction_info,
    opcodes::Opcode,
};
use aevm_common::{utils::keccak, Revision, U256};
use std::fmt::Write;

/// Emits the source of a single translated contract.
pub fn emit(revision: Revision, code: &[u8], program: &TranslatedProgram) -> String {
    let mut out = String::new();
    let hash = keccak(code);

    let _ = writeln!(out, "// Translated ahead of time; do not edit.");
    let _ = writeln!(out, "//   revision: {revision}");
    let _ = writeln!(out, "//   contract code: 0x{}", hex::encode(code));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "use aevm::aot::program::{{finalize_result, BlockSummary, JumpdestMap}};"
    );
    let _ = writeln!(out, "use aevm::call_frame::ExecutionState;");
    let _ = writeln!(out, "use aevm::errors::StatusCode;");
    let _ = writeln!(out, "use aevm::host::ExecutionResult;");
    let _ = writeln!(
        out,
        "use aevm::{{block_start, invoke, invoke_jump, push_n_jump}};"
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "pub fn contract_0x{:x}(state: &mut ExecutionState<'_>) -> ExecutionResult {{",
        hash
    );

    // PROLOGUE: the caller builds the execution state, which initializes the
    // gas counter from the message; status starts as success and the bad
    // jump handler is the epilogue below.
    let _ = writeln!(out, "    // PROLOGUE");
    let offsets = program.jumpdest_map.offsets();
    let blocks = program.jumpdest_map.blocks();
    let _ = writeln!(
        out,
        "    const JUMPDEST_OFFSETS: [u32; {}] = {:?};",
        offsets.len(),
        offsets
    );
    let _ = writeln!(
        out,
        "    const JUMPDEST_BLOCKS: [u32; {}] = {:?};",
        blocks.len(),
        blocks
    );
    let _ = writeln!(
        out,
        "    let jumpdest_map = JumpdestMap::new(JUMPDEST_OFFSETS.to_vec(), JUMPDEST_BLOCKS.to_vec());"
    );
    let _ = writeln!(out, "    let mut status = StatusCode::Success;");
    let _ = writeln!(out, "    let mut block: u32 = 0;");
    let _ = writeln!(out, "    'dispatch: loop {{");
    let _ = writeln!(out, "        match block {{");

    for (id, basic_block) in program.blocks.iter().enumerate() {
        emit_block(&mut out, id as u32, basic_block, program);
    }

    let _ = writeln!(out, "            _ => break 'dispatch,");
    let _ = writeln!(out, "        }}");
    let _ = writeln!(out, "        // Fall through to the next block.");
    let _ = writeln!(out, "        block += 1;");
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "    // EPILOGUE");
    let _ = writeln!(
        out,
        "    finalize_result(state, status, {})",
        !program.config.gas_check_disabled
    );
    let _ = writeln!(out, "}}");

    out
}

fn emit_block(out: &mut String, id: u32, block: &BasicBlock, program: &TranslatedProgram) {
    // Blocks containing INVALID or undefined instructions get no code
    // region; entering one exits with the recorded status.
    if let Some(status) = block.invalid {
        let _ = writeln!(
            out,
            "            // invalid block at offset {}",
            block.summary.offset
        );
        let _ = writeln!(out, "            {id} => {{");
        let _ = writeln!(out, "                status = StatusCode::{status:?};");
        let _ = writeln!(out, "                break 'dispatch;");
        let _ = writeln!(out, "            }}");
        return;
    }

    let summary = &block.summary;
    let check_gas = |placement: GasCheckPlacement| {
        !program.config.gas_check_disabled && program.config.gas_check_placement == placement
    };

    let _ = writeln!(
        out,
        "            // BLOCK_START({}, {}, {}, {})",
        summary.offset, summary.base_gas_cost, summary.stack_required, summary.stack_max_growth
    );
    let _ = writeln!(out, "            {id} => {{");
    let _ = writeln!(
        out,
        "                const BB_{}: BlockSummary = BlockSummary {{ offset: {}, base_gas_cost: {}, stack_required: {}, stack_max_growth: {} }};",
        summary.offset, summary.offset, summary.base_gas_cost, summary.stack_required, summary.stack_max_growth
    );
    let _ = writeln!(
        out,
        "                block_start!(state, status, 'dispatch, BB_{}, {});",
        summary.offset,
        check_gas(GasCheckPlacement::BlockStart)
    );

    for step in &block.steps {
        match step {
            Step::Invoke { offset, op, imm } => {
                let name = instruction_info(*op).name;
                if *op == u8::from(Opcode::JUMP) || *op == u8::from(Opcode::JUMPI) {
                    let conditional = *op == u8::from(Opcode::JUMPI);
                    let _ = writeln!(out, "                // INVOKE({name}, jumpdest_map)");
                    let _ = writeln!(
                        out,
                        "                invoke_jump!(state, status, 'dispatch, jumpdest_map, block, conditional: {conditional}, check_gas: {});",
                        check_gas(GasCheckPlacement::BeforeJump)
                    );
                } else {
                    match imm {
                        Some(imm) => {
                            let _ = writeln!(out, "                // INVOKE({name}, 0x{imm:x})");
                        }
                        None => {
                            let _ = writeln!(out, "                // INVOKE({name})");
                        }
                    }
                    let _ = writeln!(
                        out,
                        "                invoke!(state, status, 'dispatch, {:#04x}, {});",
                        op, offset
                    );
                    // The gas check at JUMPDEST policy happens right after
                    // the destination instruction itself.
                    if *op == u8::from(Opcode::JUMPDEST)
                        && check_gas(GasCheckPlacement::AtJumpdest)
                    {
                        let _ = writeln!(
                            out,
                            "                if state.gas_left < 0 {{ break 'dispatch; }}"
                        );
                    }
                }
            }
            Step::PushJump { target } => {
                let _ = writeln!(out, "                // PUSHnJUMP({})", low_u64(target));
                let _ = writeln!(
                    out,
                    "                push_n_jump!(state, status, 'dispatch, jumpdest_map, block, target: {}, conditional: false, check_gas: {});",
                    low_u64(target),
                    check_gas(GasCheckPlacement::BeforeJump)
                );
            }
            Step::PushJumpI { target } => {
                let _ = writeln!(out, "                // PUSHnJUMPI({})", low_u64(target));
                let _ = writeln!(
                    out,
                    "                push_n_jump!(state, status, 'dispatch, jumpdest_map, block, target: {}, conditional: true, check_gas: {});",
                    low_u64(target),
                    check_gas(GasCheckPlacement::BeforeJump)
                );
            }
        }
    }

    let _ = writeln!(out, "            }}");
}

/// Fused jump targets beyond the 64-bit range can never name a jumpdest;
/// saturating keeps the emitted literal a plain integer while preserving the
/// bad-jump outcome.
fn low_u64(target: &U256) -> u64 {
    u64::try_from(*target).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::CodeAnalysis, aot::Translator};

    #[test]
    fn emitted_source_has_the_required_shape() {
        // PUSH1 4 JUMP STOP JUMPDEST PUSH1 0 POP STOP
        let code = [0x60, 0x04, 0x56, 0x00, 0x5B, 0x60, 0x00, 0x50, 0x00];
        let source = Translator::default().emit_source(Revision::Cancun, &code);

        assert!(source.contains("// PROLOGUE"));
        assert!(source.contains("// EPILOGUE"));
        assert!(source.contains("const JUMPDEST_OFFSETS: [u32; 1] = [4];"));
        assert!(source.contains("// BLOCK_START(0, 11, 0, 1)"));
        assert!(source.contains("// PUSHnJUMP(4)"));
        assert!(source.contains("// BLOCK_START(4, 6, 0, 1)"));
        assert!(source.contains("// INVOKE(PUSH1, 0x0)"));
        assert!(source.contains("// INVOKE(POP)"));
        assert!(source.contains("pub fn contract_0x"));
    }

    #[test]
    fn invalid_blocks_are_not_emitted_as_regions() {
        // INVALID JUMPDEST STOP
        let code = [0xFE, 0x5B, 0x00];
        let source = Translator::default().emit_source(Revision::Cancun, &code);
        assert!(source.contains("// invalid block at offset 0"));
        assert!(!source.contains("// BLOCK_START(0,"));
        assert!(source.contains("// BLOCK_START(1, 1, 0, 0)"));
    }

    #[test]
    fn dynamic_jump_emits_map_dispatch() {
        // CALLDATALOAD-fed jump: PUSH0 CALLDATALOAD JUMP JUMPDEST STOP
        let code = [0x5F, 0x35, 0x56, 0x5B, 0x00];
        let analysis = CodeAnalysis::analyze(Revision::Cancun, &code);
        let program = Translator::default().translate(Revision::Cancun, &analysis);
        let source = emit(Revision::Cancun, &code, &program);
        assert!(source.contains("// INVOKE(JUMP, jumpdest_map)"));
        assert!(source.contains("invoke_jump!"));
    }
}
