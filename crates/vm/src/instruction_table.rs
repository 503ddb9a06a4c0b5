//! Per-opcode metadata consumed by the dispatcher, the basic-block analyzer
//! and the translator: stack requirements, immediate sizes, the revision an
//! instruction first appears in, and the base gas cost per revision.
//!
//! Base costs live in per-revision [`CostTable`]s built incrementally, each
//! revision patching the previous one. A negative cost marks an instruction
//! that is undefined in that revision.

use crate::opcodes::Opcode;
use aevm_common::Revision;

/// Sentinel cost for instructions not defined in a revision.
pub const UNDEFINED_COST: i16 = -1;

/// Base gas cost per opcode byte; `UNDEFINED_COST` marks undefined slots.
pub type CostTable = [i16; 256];

/// Static traits of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionInfo {
    pub name: &'static str,
    /// Revision the instruction first appears in; `None` when the byte has
    /// never been assigned.
    pub since: Option<Revision>,
    /// Number of immediate bytes following the opcode.
    pub immediate_size: u8,
    /// Stack height required before execution.
    pub stack_height_required: u8,
    /// Net stack height change, in `-6..=+1`.
    pub stack_height_change: i8,
    /// True if the implementation may still fault after the dispatcher
    /// precheck (dynamic gas, memory growth, storage, calls, jumps).
    pub has_extra_error_cases: bool,
}

const UNASSIGNED: InstructionInfo = InstructionInfo {
    name: "",
    since: None,
    immediate_size: 0,
    stack_height_required: 0,
    stack_height_change: 0,
    has_extra_error_cases: false,
};

const fn info(
    name: &'static str,
    since: Revision,
    stack_height_required: u8,
    stack_height_change: i8,
    has_extra_error_cases: bool,
) -> InstructionInfo {
    InstructionInfo {
        name,
        since: Some(since),
        immediate_size: 0,
        stack_height_required,
        stack_height_change,
        has_extra_error_cases,
    }
}

/// Traits of the instruction behind the given opcode byte.
#[inline]
pub const fn instruction_info(opcode: u8) -> &'static InstructionInfo {
    #[expect(clippy::indexing_slicing)] // the table covers all byte values
    &TRAITS[opcode as usize]
}

#[allow(clippy::as_conversions, clippy::indexing_slicing)]
static TRAITS: [InstructionInfo; 256] = const {
    use Revision::*;

    let mut t = [UNASSIGNED; 256];

    t[Opcode::STOP as usize] = info("STOP", Frontier, 0, 0, false);
    t[Opcode::ADD as usize] = info("ADD", Frontier, 2, -1, false);
    t[Opcode::MUL as usize] = info("MUL", Frontier, 2, -1, false);
    t[Opcode::SUB as usize] = info("SUB", Frontier, 2, -1, false);
    t[Opcode::DIV as usize] = info("DIV", Frontier, 2, -1, false);
    t[Opcode::SDIV as usize] = info("SDIV", Frontier, 2, -1, false);
    t[Opcode::MOD as usize] = info("MOD", Frontier, 2, -1, false);
    t[Opcode::SMOD as usize] = info("SMOD", Frontier, 2, -1, false);
    t[Opcode::ADDMOD as usize] = info("ADDMOD", Frontier, 3, -2, false);
    t[Opcode::MULMOD as usize] = info("MULMOD", Frontier, 3, -2, false);
    t[Opcode::EXP as usize] = info("EXP", Frontier, 2, -1, true);
    t[Opcode::SIGNEXTEND as usize] = info("SIGNEXTEND", Frontier, 2, -1, false);

    t[Opcode::LT as usize] = info("LT", Frontier, 2, -1, false);
    t[Opcode::GT as usize] = info("GT", Frontier, 2, -1, false);
    t[Opcode::SLT as usize] = info("SLT", Frontier, 2, -1, false);
    t[Opcode::SGT as usize] = info("SGT", Frontier, 2, -1, false);
    t[Opcode::EQ as usize] = info("EQ", Frontier, 2, -1, false);
    t[Opcode::ISZERO as usize] = info("ISZERO", Frontier, 1, 0, false);
    t[Opcode::AND as usize] = info("AND", Frontier, 2, -1, false);
    t[Opcode::OR as usize] = info("OR", Frontier, 2, -1, false);
    t[Opcode::XOR as usize] = info("XOR", Frontier, 2, -1, false);
    t[Opcode::NOT as usize] = info("NOT", Frontier, 1, 0, false);
    t[Opcode::BYTE as usize] = info("BYTE", Frontier, 2, -1, false);
    t[Opcode::SHL as usize] = info("SHL", Constantinople, 2, -1, false);
    t[Opcode::SHR as usize] = info("SHR", Constantinople, 2, -1, false);
    t[Opcode::SAR as usize] = info("SAR", Constantinople, 2, -1, false);

    t[Opcode::KECCAK256 as usize] = info("KECCAK256", Frontier, 2, -1, true);

    t[Opcode::ADDRESS as usize] = info("ADDRESS", Frontier, 0, 1, false);
    t[Opcode::BALANCE as usize] = info("BALANCE", Frontier, 1, 0, true);
    t[Opcode::ORIGIN as usize] = info("ORIGIN", Frontier, 0, 1, false);
    t[Opcode::CALLER as usize] = info("CALLER", Frontier, 0, 1, false);
    t[Opcode::CALLVALUE as usize] = info("CALLVALUE", Frontier, 0, 1, false);
    t[Opcode::CALLDATALOAD as usize] = info("CALLDATALOAD", Frontier, 1, 0, false);
    t[Opcode::CALLDATASIZE as usize] = info("CALLDATASIZE", Frontier, 0, 1, false);
    t[Opcode::CALLDATACOPY as usize] = info("CALLDATACOPY", Frontier, 3, -3, true);
    t[Opcode::CODESIZE as usize] = info("CODESIZE", Frontier, 0, 1, false);
    t[Opcode::CODECOPY as usize] = info("CODECOPY", Frontier, 3, -3, true);
    t[Opcode::GASPRICE as usize] = info("GASPRICE", Frontier, 0, 1, false);
    t[Opcode::EXTCODESIZE as usize] = info("EXTCODESIZE", Frontier, 1, 0, true);
    t[Opcode::EXTCODECOPY as usize] = info("EXTCODECOPY", Frontier, 4, -4, true);
    t[Opcode::RETURNDATASIZE as usize] = info("RETURNDATASIZE", Byzantium, 0, 1, false);
    t[Opcode::RETURNDATACOPY as usize] = info("RETURNDATACOPY", Byzantium, 3, -3, true);
    t[Opcode::EXTCODEHASH as usize] = info("EXTCODEHASH", Constantinople, 1, 0, true);

    t[Opcode::BLOCKHASH as usize] = info("BLOCKHASH", Frontier, 1, 0, false);
    t[Opcode::COINBASE as usize] = info("COINBASE", Frontier, 0, 1, false);
    t[Opcode::TIMESTAMP as usize] = info("TIMESTAMP", Frontier, 0, 1, false);
    t[Opcode::NUMBER as usize] = info("NUMBER", Frontier, 0, 1, false);
    t[Opcode::PREVRANDAO as usize] = info("PREVRANDAO", Frontier, 0, 1, false);
    t[Opcode::GASLIMIT as usize] = info("GASLIMIT", Frontier, 0, 1, false);
    t[Opcode::CHAINID as usize] = info("CHAINID", Istanbul, 0, 1, false);
    t[Opcode::SELFBALANCE as usize] = info("SELFBALANCE", Istanbul, 0, 1, false);
    t[Opcode::BASEFEE as usize] = info("BASEFEE", London, 0, 1, false);
    t[Opcode::BLOBHASH as usize] = info("BLOBHASH", Cancun, 1, 0, false);
    t[Opcode::BLOBBASEFEE as usize] = info("BLOBBASEFEE", Cancun, 0, 1, false);

    t[Opcode::POP as usize] = info("POP", Frontier, 1, -1, false);
    t[Opcode::MLOAD as usize] = info("MLOAD", Frontier, 1, 0, true);
    t[Opcode::MSTORE as usize] = info("MSTORE", Frontier, 2, -2, true);
    t[Opcode::MSTORE8 as usize] = info("MSTORE8", Frontier, 2, -2, true);
    t[Opcode::SLOAD as usize] = info("SLOAD", Frontier, 1, 0, true);
    t[Opcode::SSTORE as usize] = info("SSTORE", Frontier, 2, -2, true);
    t[Opcode::JUMP as usize] = info("JUMP", Frontier, 1, -1, true);
    t[Opcode::JUMPI as usize] = info("JUMPI", Frontier, 2, -2, true);
    t[Opcode::PC as usize] = info("PC", Frontier, 0, 1, false);
    t[Opcode::MSIZE as usize] = info("MSIZE", Frontier, 0, 1, false);
    t[Opcode::GAS as usize] = info("GAS", Frontier, 0, 1, false);
    t[Opcode::JUMPDEST as usize] = info("JUMPDEST", Frontier, 0, 0, false);
    t[Opcode::TLOAD as usize] = info("TLOAD", Cancun, 1, 0, false);
    t[Opcode::TSTORE as usize] = info("TSTORE", Cancun, 2, -2, true);
    t[Opcode::MCOPY as usize] = info("MCOPY", Cancun, 3, -3, true);

    t[Opcode::PUSH0 as usize] = info("PUSH0", Shanghai, 0, 1, false);
    let mut n = 1usize;
    while n <= 32 {
        let opcode = Opcode::PUSH0 as usize + n;
        t[opcode] = InstructionInfo {
            name: PUSH_NAMES[n - 1],
            since: Some(Frontier),
            immediate_size: n as u8,
            stack_height_required: 0,
            stack_height_change: 1,
            has_extra_error_cases: false,
        };
        n += 1;
    }

    let mut n = 1usize;
    while n <= 16 {
        t[Opcode::DUP1 as usize + n - 1] = InstructionInfo {
            name: DUP_NAMES[n - 1],
            since: Some(Frontier),
            immediate_size: 0,
            stack_height_required: n as u8,
            stack_height_change: 1,
            has_extra_error_cases: false,
        };
        t[Opcode::SWAP1 as usize + n - 1] = InstructionInfo {
            name: SWAP_NAMES[n - 1],
            since: Some(Frontier),
            immediate_size: 0,
            stack_height_required: n as u8 + 1,
            stack_height_change: 0,
            has_extra_error_cases: false,
        };
        n += 1;
    }

    let mut n = 0usize;
    while n <= 4 {
        t[Opcode::LOG0 as usize + n] = InstructionInfo {
            name: LOG_NAMES[n],
            since: Some(Frontier),
            immediate_size: 0,
            stack_height_required: n as u8 + 2,
            stack_height_change: -(n as i8) - 2,
            has_extra_error_cases: true,
        };
        n += 1;
    }

    t[Opcode::CREATE as usize] = info("CREATE", Frontier, 3, -2, true);
    t[Opcode::CALL as usize] = info("CALL", Frontier, 7, -6, true);
    t[Opcode::CALLCODE as usize] = info("CALLCODE", Frontier, 7, -6, true);
    t[Opcode::RETURN as usize] = info("RETURN", Frontier, 2, -2, true);
    t[Opcode::DELEGATECALL as usize] = info("DELEGATECALL", Homestead, 6, -5, true);
    t[Opcode::CREATE2 as usize] = info("CREATE2", Constantinople, 4, -3, true);
    t[Opcode::STATICCALL as usize] = info("STATICCALL", Byzantium, 6, -5, true);
    t[Opcode::REVERT as usize] = info("REVERT", Byzantium, 2, -2, true);
    t[Opcode::INVALID as usize] = info("INVALID", Frontier, 0, 0, true);
    t[Opcode::SELFDESTRUCT as usize] = info("SELFDESTRUCT", Frontier, 1, -1, true);

    t
};

const PUSH_NAMES: [&str; 32] = [
    "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
    "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
    "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
    "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];
const DUP_NAMES: [&str; 16] = [
    "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
    "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];
const SWAP_NAMES: [&str; 16] = [
    "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
    "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];
const LOG_NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

// ============================================================================
// Cost tables
// ============================================================================

#[allow(clippy::as_conversions, clippy::indexing_slicing)]
const fn frontier_cost_table() -> CostTable {
    let mut t = [UNDEFINED_COST; 256];

    t[Opcode::STOP as usize] = 0;
    t[Opcode::ADD as usize] = 3;
    t[Opcode::MUL as usize] = 5;
    t[Opcode::SUB as usize] = 3;
    t[Opcode::DIV as usize] = 5;
    t[Opcode::SDIV as usize] = 5;
    t[Opcode::MOD as usize] = 5;
    t[Opcode::SMOD as usize] = 5;
    t[Opcode::ADDMOD as usize] = 8;
    t[Opcode::MULMOD as usize] = 8;
    t[Opcode::EXP as usize] = 10;
    t[Opcode::SIGNEXTEND as usize] = 5;
    t[Opcode::LT as usize] = 3;
    t[Opcode::GT as usize] = 3;
    t[Opcode::SLT as usize] = 3;
    t[Opcode::SGT as usize] = 3;
    t[Opcode::EQ as usize] = 3;
    t[Opcode::ISZERO as usize] = 3;
    t[Opcode::AND as usize] = 3;
    t[Opcode::OR as usize] = 3;
    t[Opcode::XOR as usize] = 3;
    t[Opcode::NOT as usize] = 3;
    t[Opcode::BYTE as usize] = 3;
    t[Opcode::KECCAK256 as usize] = 30;
    t[Opcode::ADDRESS as usize] = 2;
    t[Opcode::BALANCE as usize] = 20;
    t[Opcode::ORIGIN as usize] = 2;
    t[Opcode::CALLER as usize] = 2;
    t[Opcode::CALLVALUE as usize] = 2;
    t[Opcode::CALLDATALOAD as usize] = 3;
    t[Opcode::CALLDATASIZE as usize] = 2;
    t[Opcode::CALLDATACOPY as usize] = 3;
    t[Opcode::CODESIZE as usize] = 2;
    t[Opcode::CODECOPY as usize] = 3;
    t[Opcode::GASPRICE as usize] = 2;
    t[Opcode::EXTCODESIZE as usize] = 20;
    t[Opcode::EXTCODECOPY as usize] = 20;
    t[Opcode::BLOCKHASH as usize] = 20;
    t[Opcode::COINBASE as usize] = 2;
    t[Opcode::TIMESTAMP as usize] = 2;
    t[Opcode::NUMBER as usize] = 2;
    t[Opcode::PREVRANDAO as usize] = 2;
    t[Opcode::GASLIMIT as usize] = 2;
    t[Opcode::POP as usize] = 2;
    t[Opcode::MLOAD as usize] = 3;
    t[Opcode::MSTORE as usize] = 3;
    t[Opcode::MSTORE8 as usize] = 3;
    t[Opcode::SLOAD as usize] = 50;
    t[Opcode::SSTORE as usize] = 0;
    t[Opcode::JUMP as usize] = 8;
    t[Opcode::JUMPI as usize] = 10;
    t[Opcode::PC as usize] = 2;
    t[Opcode::MSIZE as usize] = 2;
    t[Opcode::GAS as usize] = 2;
    t[Opcode::JUMPDEST as usize] = 1;

    let mut i = Opcode::PUSH1 as usize;
    while i <= Opcode::PUSH32 as usize {
        t[i] = 3;
        i += 1;
    }
    let mut i = Opcode::DUP1 as usize;
    while i <= Opcode::SWAP16 as usize {
        t[i] = 3;
        i += 1;
    }
    let mut i = Opcode::LOG0 as usize;
    while i <= Opcode::LOG4 as usize {
        t[i] = 375;
        i += 1;
    }

    t[Opcode::CREATE as usize] = 32000;
    t[Opcode::CALL as usize] = 40;
    t[Opcode::CALLCODE as usize] = 40;
    t[Opcode::RETURN as usize] = 0;
    t[Opcode::INVALID as usize] = 0;
    t[Opcode::SELFDESTRUCT as usize] = 0;

    t
}

#[allow(clippy::as_conversions, clippy::indexing_slicing)]
const fn homestead_cost_table() -> CostTable {
    let mut t = frontier_cost_table();
    t[Opcode::DELEGATECALL as usize] = 40;
    t
}

/// [EIP-150] IO cost repricing.
#[allow(clippy::as_conversions, clippy::indexing_slicing)]
const fn tangerine_cost_table() -> CostTable {
    let mut t = homestead_cost_table();
    t[Opcode::BALANCE as usize] = 400;
    t[Opcode::EXTCODESIZE as usize] = 700;
    t[Opcode::EXTCODECOPY as usize] = 700;
    t[Opcode::SLOAD as usize] = 200;
    t[Opcode::CALL as usize] = 700;
    t[Opcode::CALLCODE as usize] = 700;
    t[Opcode::DELEGATECALL as usize] = 700;
    t[Opcode::SELFDESTRUCT as usize] = 5000;
    t
}

#[allow(clippy::as_conversions, clippy::indexing_slicing)]
const fn byzantium_cost_table() -> CostTable {
    let mut t = tangerine_cost_table();
    t[Opcode::RETURNDATASIZE as usize] = 2;
    t[Opcode::RETURNDATACOPY as usize] = 3;
    t[Opcode::STATICCALL as usize] = 700;
    t[Opcode::REVERT as usize] = 0;
    t
}

#[allow(clippy::as_conversions, clippy::indexing_slicing)]
const fn constantinople_cost_table() -> CostTable {
    let mut t = byzantium_cost_table();
    t[Opcode::SHL as usize] = 3;
    t[Opcode::SHR as usize] = 3;
    t[Opcode::SAR as usize] = 3;
    t[Opcode::EXTCODEHASH as usize] = 400;
    t[Opcode::CREATE2 as usize] = 32000;
    t
}

/// [EIP-1884] IO repricing plus the Istanbul opcodes.
#[allow(clippy::as_conversions, clippy::indexing_slicing)]
const fn istanbul_cost_table() -> CostTable {
    let mut t = constantinople_cost_table();
    t[Opcode::BALANCE as usize] = 700;
    t[Opcode::EXTCODEHASH as usize] = 700;
    t[Opcode::SLOAD as usize] = 800;
    t[Opcode::CHAINID as usize] = 2;
    t[Opcode::SELFBALANCE as usize] = 5;
    t
}

/// [EIP-2929]: account and storage base costs become the warm access cost;
/// the cold surcharge is charged dynamically.
#[allow(clippy::as_conversions, clippy::indexing_slicing)]
const fn berlin_cost_table() -> CostTable {
    let mut t = istanbul_cost_table();
    t[Opcode::BALANCE as usize] = 100;
    t[Opcode::EXTCODESIZE as usize] = 100;
    t[Opcode::EXTCODECOPY as usize] = 100;
    t[Opcode::EXTCODEHASH as usize] = 100;
    t[Opcode::SLOAD as usize] = 100;
    t[Opcode::CALL as usize] = 100;
    t[Opcode::CALLCODE as usize] = 100;
    t[Opcode::DELEGATECALL as usize] = 100;
    t[Opcode::STATICCALL as usize] = 100;
    t
}

#[allow(clippy::as_conversions, clippy::indexing_slicing)]
const fn london_cost_table() -> CostTable {
    let mut t = berlin_cost_table();
    t[Opcode::BASEFEE as usize] = 2;
    t
}

#[allow(clippy::as_conversions, clippy::indexing_slicing)]
const fn shanghai_cost_table() -> CostTable {
    let mut t = london_cost_table();
    t[Opcode::PUSH0 as usize] = 2;
    t
}

#[allow(clippy::as_conversions, clippy::indexing_slicing)]
const fn cancun_cost_table() -> CostTable {
    let mut t = shanghai_cost_table();
    t[Opcode::TLOAD as usize] = 100;
    t[Opcode::TSTORE as usize] = 100;
    t[Opcode::MCOPY as usize] = 3;
    t[Opcode::BLOBHASH as usize] = 3;
    t[Opcode::BLOBBASEFEE as usize] = 2;
    t
}

static FRONTIER_COSTS: CostTable = frontier_cost_table();
static HOMESTEAD_COSTS: CostTable = homestead_cost_table();
static TANGERINE_COSTS: CostTable = tangerine_cost_table();
static BYZANTIUM_COSTS: CostTable = byzantium_cost_table();
static CONSTANTINOPLE_COSTS: CostTable = constantinople_cost_table();
static ISTANBUL_COSTS: CostTable = istanbul_cost_table();
static BERLIN_COSTS: CostTable = berlin_cost_table();
static LONDON_COSTS: CostTable = london_cost_table();
static SHANGHAI_COSTS: CostTable = shanghai_cost_table();
static CANCUN_COSTS: CostTable = cancun_cost_table();

/// Base-cost table for the given revision.
pub const fn cost_table(revision: Revision) -> &'static CostTable {
    match revision {
        Revision::Frontier => &FRONTIER_COSTS,
        Revision::Homestead => &HOMESTEAD_COSTS,
        Revision::Tangerine | Revision::SpuriousDragon => &TANGERINE_COSTS,
        Revision::Byzantium => &BYZANTIUM_COSTS,
        Revision::Constantinople | Revision::Petersburg => &CONSTANTINOPLE_COSTS,
        Revision::Istanbul => &ISTANBUL_COSTS,
        Revision::Berlin => &BERLIN_COSTS,
        Revision::London | Revision::Paris => &LONDON_COSTS,
        Revision::Shanghai => &SHANGHAI_COSTS,
        Revision::Cancun | Revision::Prague => &CANCUN_COSTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_immediates_and_deltas() {
        let push1 = instruction_info(Opcode::PUSH1.into());
        assert_eq!(push1.immediate_size, 1);
        assert_eq!(push1.stack_height_change, 1);
        let push32 = instruction_info(Opcode::PUSH32.into());
        assert_eq!(push32.immediate_size, 32);
    }

    #[test]
    fn dup_swap_requirements() {
        assert_eq!(instruction_info(Opcode::DUP16.into()).stack_height_required, 16);
        assert_eq!(instruction_info(Opcode::DUP16.into()).stack_height_change, 1);
        assert_eq!(instruction_info(Opcode::SWAP16.into()).stack_height_required, 17);
        assert_eq!(instruction_info(Opcode::SWAP16.into()).stack_height_change, 0);
    }

    #[test]
    fn cost_tables_mark_undefined_instructions() {
        assert_eq!(cost_table(Revision::Frontier)[Opcode::SHL as usize], UNDEFINED_COST);
        assert_eq!(cost_table(Revision::Constantinople)[Opcode::SHL as usize], 3);
        assert_eq!(cost_table(Revision::London)[Opcode::PUSH0 as usize], UNDEFINED_COST);
        assert_eq!(cost_table(Revision::Shanghai)[Opcode::PUSH0 as usize], 2);
        assert_eq!(cost_table(Revision::Shanghai)[Opcode::TLOAD as usize], UNDEFINED_COST);
        assert_eq!(cost_table(Revision::Cancun)[Opcode::TLOAD as usize], 100);
        // Unassigned byte.
        assert_eq!(cost_table(Revision::Cancun)[0x0C], UNDEFINED_COST);
    }

    #[test]
    fn berlin_reprices_account_access_to_warm_cost() {
        assert_eq!(cost_table(Revision::Istanbul)[Opcode::SLOAD as usize], 800);
        assert_eq!(cost_table(Revision::Berlin)[Opcode::SLOAD as usize], 100);
        assert_eq!(cost_table(Revision::Berlin)[Opcode::CALL as usize], 100);
        assert_eq!(cost_table(Revision::Istanbul)[Opcode::CALL as usize], 700);
    }

    #[test]
    fn spurious_dragon_shares_the_tangerine_table() {
        assert_eq!(
            cost_table(Revision::SpuriousDragon)[Opcode::SLOAD as usize],
            cost_table(Revision::Tangerine)[Opcode::SLOAD as usize],
        );
    }

    #[test]
    fn invalid_is_defined_with_zero_cost() {
        assert_eq!(cost_table(Revision::Frontier)[Opcode::INVALID as usize], 0);
        assert!(instruction_info(Opcode::INVALID.into()).has_extra_error_cases);
    }
}
