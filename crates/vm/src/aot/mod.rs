//! Ahead-of-time translation.
//!
//! The translator parses bytecode into basic blocks, summarizes each block's
//! gas and stack requirements, fuses PUSH+JUMP(I) pairs, and produces a
//! [`program::TranslatedProgram`]: a block-id state machine honoring the
//! translated-block runtime contract (one fused precheck per block entry,
//! out-of-gas deferred to the epilogue, dynamic jumps dispatched through a
//! sorted jumpdest map). The [`emitter`] renders the same program as a Rust
//! source file with one function per contract.

pub mod analyzer;
pub mod emitter;
pub mod program;

use crate::analysis::CodeAnalysis;
use aevm_common::Revision;
use program::TranslatedProgram;

/// Where the translator places the out-of-gas exit test.
///
/// Checking only before jumps keeps straight-line code tighter; programs
/// still terminate because every loop iteration traverses a jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GasCheckPlacement {
    /// Check at each block entry (most conservative).
    BlockStart,
    /// Check only before JUMP/JUMPI (default).
    #[default]
    BeforeJump,
    /// Check at each JUMPDEST.
    AtJumpdest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// Fuse PUSHk + JUMP/JUMPI into one super-instruction.
    pub fuse_push_jump: bool,
    pub gas_check_placement: GasCheckPlacement,
    /// Disables the out-of-gas exit entirely; metering still runs. Programs
    /// may then loop forever, so this must never see untrusted code.
    pub gas_check_disabled: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            fuse_push_jump: true,
            gas_check_placement: GasCheckPlacement::default(),
            gas_check_disabled: false,
        }
    }
}

/// The ahead-of-time translator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    pub config: TranslatorConfig,
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    /// Translates analyzed code into an executable block-id state machine.
    pub fn translate(&self, revision: Revision, analysis: &CodeAnalysis) -> TranslatedProgram {
        analyzer::analyze_blocks(revision, analysis, self.config)
    }

    /// Translates and renders the program as a Rust source file.
    pub fn emit_source(&self, revision: Revision, code: &[u8]) -> String {
        let analysis = CodeAnalysis::analyze(revision, code);
        let program = self.translate(revision, &analysis);
        emitter::emit(revision, code, &program)
    }
}
