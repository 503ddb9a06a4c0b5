//! # aevm
//!
//! An execution engine for the Ethereum Virtual Machine built around two
//! interchangeable executors:
//!
//! - the **baseline interpreter** ([`interpreter`]): a tight dispatch loop
//!   with a fused per-instruction precheck, serving as the reference;
//! - the **ahead-of-time translator** ([`aot`]): partitions bytecode into
//!   basic blocks, summarizes each block's gas and stack requirements,
//!   fuses PUSH+JUMP pairs, and executes (or emits as Rust source) a
//!   block-id state machine that prechecks each block once.
//!
//! Both executors speak to the outside world exclusively through the
//! [`host::Host`] interface. The [`state`] module provides the canonical
//! journaled implementation, and [`transition`] drives a whole transaction
//! against it: validation, intrinsic cost, execution, refund capping and
//! end-of-transaction cleanup.
//!
//! ## Executing code
//!
//! ```ignore
//! use aevm::{analysis::CodeAnalysis, host::Message, interpreter};
//! use aevm_common::Revision;
//!
//! let analysis = CodeAnalysis::analyze(revision, &code);
//! let result = interpreter::execute(revision, &analysis, &msg, &mut host);
//! assert!(result.status.is_success());
//! ```

pub mod analysis;
pub mod aot;
pub mod call_frame;
pub mod errors;
pub mod gas_cost;
pub mod gas_schedule;
pub mod host;
pub mod instruction_table;
pub mod interpreter;
pub mod memory;
pub mod opcode_handlers;
pub mod opcodes;
pub mod precompiles;
pub mod stack;
pub mod state;
pub mod transition;
pub mod utils;

use analysis::CodeAnalysis;
use aot::Translator;
use host::{ExecutionResult, Host, Message};

pub use aevm_common::Revision;
pub use errors::StatusCode;
pub use state::ExecutorKind;

/// Analyzes and executes `code` with the selected executor.
///
/// This is the embedder-facing entry point; hosts executing many calls
/// against the same code should analyze once and call the executors
/// directly instead.
pub fn execute(
    revision: Revision,
    code: &[u8],
    msg: &Message,
    host: &mut dyn Host,
    executor: ExecutorKind,
) -> ExecutionResult {
    let analysis = CodeAnalysis::analyze(revision, code);
    match executor {
        ExecutorKind::Baseline => interpreter::execute(revision, &analysis, msg, host),
        ExecutorKind::Translated(config) => {
            let program = Translator::new(config).translate(revision, &analysis);
            program.execute(&analysis, msg, host)
        }
    }
}
