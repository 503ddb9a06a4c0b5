//! Revision-aware gas schedules.
//!
//! Base per-opcode costs live in `instruction_table::cost_table`; this module
//! carries the costs that are consulted outside the dispatcher precheck:
//! storage refunds, account-access surcharges, call/create extras, calldata
//! pricing and the refund cap.

use aevm_common::Revision;

/// Gas costs and rules that vary by revision.
#[derive(Debug, Clone, Copy)]
pub struct GasSchedule {
    // Storage operations.
    pub sstore_set: u64,
    pub sstore_reset: u64,
    /// Net-metered no-op / dirty-slot cost (equals the SLOAD cost of the
    /// revision; the warm access cost from Berlin on).
    pub sstore_noop: u64,
    pub sstore_clears_refund: u64,
    /// [EIP-2200] minimum gas left to attempt an SSTORE at all.
    pub sstore_stipend_check: bool,

    // Cold/warm access ([EIP-2929]); zero before Berlin.
    pub has_access_lists: bool,
    pub cold_sload_surcharge: u64,
    pub cold_account_access_surcharge: u64,

    // Call operations.
    pub call_value_cost: u64,
    pub call_stipend: u64,
    pub call_new_account_cost: u64,
    pub has_63_64_rule: bool,

    // Self-destruct.
    pub selfdestruct_new_account_cost: u64,
    pub selfdestruct_refund: u64,

    // EXP dynamic cost per significant exponent byte.
    pub exp_byte_cost: u64,

    // Transaction intrinsic costs.
    pub calldata_zero_byte_cost: u64,
    pub calldata_nonzero_byte_cost: u64,
    pub tx_create_cost: u64,

    /// Refund cap divisor: `refund <= gas_used / max_refund_quotient`.
    pub max_refund_quotient: u64,
}

impl GasSchedule {
    pub const fn for_revision(revision: Revision) -> &'static GasSchedule {
        match revision {
            Revision::Frontier => &FRONTIER_SCHEDULE,
            Revision::Homestead => &HOMESTEAD_SCHEDULE,
            Revision::Tangerine => &TANGERINE_SCHEDULE,
            Revision::SpuriousDragon | Revision::Byzantium | Revision::Petersburg => {
                &SPURIOUS_DRAGON_SCHEDULE
            }
            Revision::Constantinople => &CONSTANTINOPLE_SCHEDULE,
            Revision::Istanbul => &ISTANBUL_SCHEDULE,
            Revision::Berlin => &BERLIN_SCHEDULE,
            _ => &LONDON_SCHEDULE,
        }
    }
}

/// Original gas rules, before any repricing.
pub static FRONTIER_SCHEDULE: GasSchedule = GasSchedule {
    sstore_set: 20000,
    sstore_reset: 5000,
    sstore_noop: 5000,
    sstore_clears_refund: 15000,
    sstore_stipend_check: false,

    has_access_lists: false,
    cold_sload_surcharge: 0,
    cold_account_access_surcharge: 0,

    call_value_cost: 9000,
    call_stipend: 2300,
    call_new_account_cost: 25000,
    has_63_64_rule: false,

    selfdestruct_new_account_cost: 0,
    selfdestruct_refund: 24000,

    exp_byte_cost: 10,

    calldata_zero_byte_cost: 4,
    calldata_nonzero_byte_cost: 68,
    // Contract-creating transactions cost the plain call cost until
    // Homestead.
    tx_create_cost: 21000,

    max_refund_quotient: 2,
};

pub static HOMESTEAD_SCHEDULE: GasSchedule = GasSchedule {
    tx_create_cost: 53000,
    ..FRONTIER_SCHEDULE
};

/// [EIP-150]: 63/64 rule and self-destruct new-account cost.
pub static TANGERINE_SCHEDULE: GasSchedule = GasSchedule {
    has_63_64_rule: true,
    selfdestruct_new_account_cost: 25000,
    ..HOMESTEAD_SCHEDULE
};

/// [EIP-160]: EXP repricing.
pub static SPURIOUS_DRAGON_SCHEDULE: GasSchedule = GasSchedule {
    exp_byte_cost: 50,
    ..TANGERINE_SCHEDULE
};

/// [EIP-1283] net gas metering (reverted in Petersburg).
pub static CONSTANTINOPLE_SCHEDULE: GasSchedule = GasSchedule {
    sstore_noop: 200,
    ..SPURIOUS_DRAGON_SCHEDULE
};

/// [EIP-2028] calldata repricing, [EIP-2200] net metering with stipend.
pub static ISTANBUL_SCHEDULE: GasSchedule = GasSchedule {
    sstore_noop: 800,
    sstore_stipend_check: true,
    calldata_nonzero_byte_cost: 16,
    ..SPURIOUS_DRAGON_SCHEDULE
};

/// [EIP-2929] cold/warm access.
pub static BERLIN_SCHEDULE: GasSchedule = GasSchedule {
    sstore_reset: 2900,
    sstore_noop: 100,
    has_access_lists: true,
    cold_sload_surcharge: 2000,
    cold_account_access_surcharge: 2500,
    ..ISTANBUL_SCHEDULE
};

/// [EIP-3529] refund reductions.
pub static LONDON_SCHEDULE: GasSchedule = GasSchedule {
    sstore_clears_refund: 4800,
    selfdestruct_refund: 0,
    max_refund_quotient: 5,
    ..BERLIN_SCHEDULE
};

/// Full cold cost of one storage slot access ([EIP-2929]).
pub const COLD_SLOAD_COST: u64 = 2100;
/// Full cold cost of one account access ([EIP-2929]).
pub const COLD_ACCOUNT_ACCESS_COST: u64 = 2600;
/// Warm access cost ([EIP-2929]); the Berlin+ base cost of the account
/// access instructions.
pub const WARM_STORAGE_READ_COST: u64 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refund_quotient_changes_at_london() {
        assert_eq!(GasSchedule::for_revision(Revision::Berlin).max_refund_quotient, 2);
        assert_eq!(GasSchedule::for_revision(Revision::London).max_refund_quotient, 5);
        assert_eq!(GasSchedule::for_revision(Revision::Cancun).max_refund_quotient, 5);
    }

    #[test]
    fn exp_byte_cost_changes_at_spurious_dragon() {
        assert_eq!(GasSchedule::for_revision(Revision::Tangerine).exp_byte_cost, 10);
        assert_eq!(GasSchedule::for_revision(Revision::SpuriousDragon).exp_byte_cost, 50);
    }

    #[test]
    fn berlin_enables_access_lists() {
        let berlin = GasSchedule::for_revision(Revision::Berlin);
        assert!(berlin.has_access_lists);
        assert_eq!(berlin.cold_sload_surcharge, COLD_SLOAD_COST - WARM_STORAGE_READ_COST);
        assert_eq!(
            berlin.cold_account_access_surcharge,
            COLD_ACCOUNT_ACCESS_COST - WARM_STORAGE_READ_COST
        );
        assert!(!GasSchedule::for_revision(Revision::Istanbul).has_access_lists);
    }

    #[test]
    fn london_reduces_refunds() {
        assert_eq!(GasSchedule::for_revision(Revision::Berlin).sstore_clears_refund, 15000);
        assert_eq!(GasSchedule::for_revision(Revision::London).sstore_clears_refund, 4800);
        assert_eq!(GasSchedule::for_revision(Revision::Berlin).selfdestruct_refund, 24000);
        assert_eq!(GasSchedule::for_revision(Revision::London).selfdestruct_refund, 0);
    }

    #[test]
    fn create_tx_cost_from_homestead() {
        assert_eq!(GasSchedule::for_revision(Revision::Frontier).tx_create_cost, 21000);
        assert_eq!(GasSchedule::for_revision(Revision::Homestead).tx_create_cost, 53000);
    }
}
