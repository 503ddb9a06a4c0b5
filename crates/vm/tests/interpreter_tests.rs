//! Baseline interpreter behaviour: instruction semantics, gas accounting,
//! the jump model and the frame error plane.

mod common;

use aevm::{errors::StatusCode, state::ExecutorKind, Revision};
use aevm_common::U256;
use common::run_frame;

fn run(code: &[u8], calldata: &[u8], gas: i64) -> aevm::host::ExecutionResult {
    run_frame(Revision::Cancun, code, calldata, gas, ExecutorKind::Baseline).0
}

/// 32-byte big-endian word with a 64-bit value in the last 8 bytes.
fn calldata_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

#[test]
fn add_and_return() {
    // PUSH1 2 PUSH1 3 ADD PUSH0 MSTORE PUSH1 32 PUSH0 RETURN
    let code = hex::decode("60026003015f5260205ff3").unwrap();
    let result = run(&code, &[], 100_000);
    assert_eq!(result.status, StatusCode::Success);
    assert_eq!(U256::from_big_endian(&result.output), U256::from(5));
    // 3 + 3 + 3 (arith) + 2 (PUSH0) + 3 + 3 (MSTORE + one word of memory)
    // + 3 + 2 + 0 (RETURN operands; memory already paid).
    assert_eq!(result.gas_left, 100_000 - 22);
}

#[test]
fn stop_consumes_nothing() {
    let result = run(&[0x00], &[], 42);
    assert_eq!(result.status, StatusCode::Success);
    assert_eq!(result.gas_left, 42);
    assert!(result.output.is_empty());
}

#[test]
fn empty_code_is_an_implicit_stop() {
    let result = run(&[], &[], 42);
    assert_eq!(result.status, StatusCode::Success);
    assert_eq!(result.gas_left, 42);
}

#[test]
fn out_of_gas_zeroes_gas_left() {
    // PUSH1 1 PUSH1 2 ADD STOP, but only 5 gas.
    let code = hex::decode("6001600201 00".replace(' ', "")).unwrap();
    let result = run(&code, &[], 5);
    assert_eq!(result.status, StatusCode::OutOfGas);
    assert_eq!(result.gas_left, 0);
}

#[test]
fn stack_underflow() {
    let result = run(&[0x01], &[], 100);
    assert_eq!(result.status, StatusCode::StackUnderflow);
    assert_eq!(result.gas_left, 0);
}

#[test]
fn undefined_instruction() {
    let result = run(&[0x0C], &[], 100);
    assert_eq!(result.status, StatusCode::UndefinedInstruction);
}

#[test]
fn invalid_instruction() {
    let result = run(&[0xFE], &[], 100);
    assert_eq!(result.status, StatusCode::InvalidInstruction);
}

#[test]
fn push0_requires_shanghai() {
    let (result, _) = run_frame(Revision::London, &[0x5F, 0x00], &[], 100, ExecutorKind::Baseline);
    assert_eq!(result.status, StatusCode::UndefinedInstruction);
    let (result, _) =
        run_frame(Revision::Shanghai, &[0x5F, 0x00], &[], 100, ExecutorKind::Baseline);
    assert_eq!(result.status, StatusCode::Success);
}

#[test]
fn jump_to_valid_destination() {
    // PUSH1 4 JUMP INVALID JUMPDEST STOP
    let code = hex::decode("600456fe5b00").unwrap();
    let result = run(&code, &[], 100);
    assert_eq!(result.status, StatusCode::Success);
    // PUSH(3) + JUMP(8) + JUMPDEST(1).
    assert_eq!(result.gas_left, 100 - 12);
}

#[test]
fn jump_into_push_data_is_bad() {
    // PUSH1 4 JUMP PUSH2 0x5B00 STOP: offset 4 is a 0x5B byte, but it sits
    // inside the PUSH2 immediate and must not be accepted.
    let code = hex::decode("600456615b0000").unwrap();
    let result = run(&code, &[], 100);
    assert_eq!(result.status, StatusCode::BadJumpDestination);
    assert_eq!(result.gas_left, 0);
}

#[test]
fn jumpi_falls_through_on_zero() {
    // PUSH1 0 (condition) PUSH1 6 (target) JUMPI STOP JUMPDEST INVALID
    let code = hex::decode("6000600657005bfe").unwrap();
    let result = run(&code, &[], 100);
    assert_eq!(result.status, StatusCode::Success);
}

#[test]
fn revert_keeps_gas_and_output() {
    // PUSH1 0xAA PUSH0 MSTORE8 PUSH1 1 PUSH0 REVERT
    let code = hex::decode("60aa5f5360015ffd").unwrap();
    let result = run(&code, &[], 100_000);
    assert_eq!(result.status, StatusCode::Revert);
    assert_eq!(result.output.as_ref(), &[0xAA]);
    assert!(result.gas_left > 0);
}

#[test]
fn calldataload_zero_pads() {
    // PUSH1 16 CALLDATALOAD PUSH0 MSTORE PUSH1 32 PUSH0 RETURN
    let code = hex::decode("6010355f5260205ff3").unwrap();
    let result = run(&code, &calldata_word(0xAABB), 100_000);
    assert_eq!(result.status, StatusCode::Success);
    // Reading at offset 16 shifts the tail into the high half, zero-padded.
    let expected = U256::from(0xAABBu64) << 128;
    assert_eq!(U256::from_big_endian(&result.output), expected);
}

#[test]
fn memory_expansion_is_quadratically_priced() {
    // MSTORE at offset 0 then at a large offset; the big write must charge
    // the cost difference.
    // PUSH1 1 PUSH1 0 MSTORE PUSH1 1 PUSH2 0x2000 MSTORE STOP
    let code = hex::decode("6001600052600161200052 00".replace(' ', "")).unwrap();
    let result = run(&code, &[], 1_000_000);
    assert_eq!(result.status, StatusCode::Success);
    let words: u64 = (0x2000 + 32) / 32;
    let memory_cost = 3 * words + words * words / 512;
    // 4 pushes, 2 MSTOREs.
    assert_eq!(result.gas_left, 1_000_000 - (4 * 3 + 2 * 3 + memory_cost) as i64);
}

#[test]
fn keccak256_of_memory() {
    // PUSH0 PUSH0 KECCAK256 PUSH0 MSTORE PUSH1 32 PUSH0 RETURN
    let code = hex::decode("5f5f205f5260205ff3").unwrap();
    let result = run(&code, &[], 100_000);
    assert_eq!(result.status, StatusCode::Success);
    assert_eq!(
        hex::encode(&result.output),
        "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );
}

#[test]
fn signed_division_semantics() {
    // PUSH1 2 PUSH0 SUB (-2) PUSH1 8 PUSH0 SUB (-8) SDIV => 4
    // then MSTORE + RETURN.
    let code = hex::decode("60025f0360085f03055f5260205ff3").unwrap();
    let result = run(&code, &[], 100_000);
    assert_eq!(result.status, StatusCode::Success);
    assert_eq!(U256::from_big_endian(&result.output), U256::from(4));
}

#[test]
fn exp_charges_per_exponent_byte() {
    // PUSH2 0x0100 PUSH1 2 EXP STOP: exponent 0x100 has two bytes.
    let code = hex::decode("61010060020a00").unwrap();
    let result = run(&code, &[], 100_000);
    assert_eq!(result.status, StatusCode::Success);
    // PUSH2(3) + PUSH1(3) + EXP(10 + 2*50).
    assert_eq!(result.gas_left, 100_000 - (3 + 3 + 10 + 100));
}

#[test]
fn static_mode_forbids_state_mutation() {
    // The outer call (with calldata) STATICCALLs the contract itself with
    // empty calldata; the inner frame falls through to an SSTORE, which is
    // forbidden in static mode.
    //
    //   CALLDATASIZE PUSH1 0x09 JUMPI     ; outer jumps to the static call
    //   PUSH1 1 PUSH0 SSTORE STOP         ; inner attempts the write
    //   JUMPDEST PUSH0 PUSH0 PUSH0 PUSH0 ADDRESS GAS STATICCALL STOP
    let code = hex::decode("3660095760015f55005b5f5f5f5f305afa00").unwrap();
    let (result, state) = run_frame(
        Revision::Cancun,
        &code,
        &[0x01],
        1_000_000,
        ExecutorKind::Baseline,
    );
    // The outer frame succeeds; the inner static frame failed and its write
    // was rolled back.
    assert_eq!(result.status, StatusCode::Success);
    let contract = state.find(&common::contract_address()).unwrap();
    assert!(contract
        .storage
        .get(&U256::zero())
        .is_none_or(|slot| slot.current.is_zero()));
}

#[test]
fn fibonacci_loop_gas_matches_block_sums() {
    // Seed scenario: iterative Fibonacci with a dynamic loop.
    let code =
        hex::decode("5f35600060015b8215601b578181019150909160019003916006565b91505000").unwrap();
    let result = run(&code, &calldata_word(10), 1_000_000);
    assert_eq!(result.status, StatusCode::Success);
    assert!(result.output.is_empty());

    // The gas used must equal the analyzer-computed block sum over the
    // executed blocks: entry once, loop head 11 times (counter 10..=0),
    // loop body 10 times, exit once.
    let analysis = aevm::analysis::CodeAnalysis::analyze(Revision::Cancun, &code);
    let program = aevm::aot::Translator::default().translate(Revision::Cancun, &analysis);
    let sums: Vec<i64> = program
        .blocks
        .iter()
        .map(|block| block.summary.base_gas_cost)
        .collect();
    assert_eq!(sums.len(), 4);
    let expected = sums[0] + 11 * sums[1] + 10 * sums[2] + sums[3];
    assert_eq!(1_000_000 - result.gas_left, expected);
}

#[test]
fn sstore_stipend_rule() {
    // PUSH1 1 PUSH1 0 SSTORE with gas only slightly above the stipend: the
    // write is forbidden when gas_left <= 2300 at the SSTORE.
    let code = hex::decode("600160005500").unwrap();
    // 6 gas for the pushes, leaving exactly 2300: forbidden.
    let result = run(&code, &[], 2306);
    assert_eq!(result.status, StatusCode::OutOfGas);
}
