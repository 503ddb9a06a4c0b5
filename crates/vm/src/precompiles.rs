//! Precompiled contracts.
//!
//! The address range is revision-dependent: four contracts at Frontier,
//! eight from Byzantium, nine from Istanbul, ten from Cancun. The hash and
//! arithmetic precompiles are implemented here; the elliptic-curve and KZG
//! entries are cryptographic internals outside this engine's scope and
//! report `PrecompileFailure`.

use crate::{
    errors::StatusCode,
    gas_cost::{
        precompile_words, IDENTITY_STATIC_COST, IDENTITY_WORD_COST, MODEXP_MIN_COST,
        RIPEMD_160_STATIC_COST, RIPEMD_160_WORD_COST, SHA2_256_STATIC_COST, SHA2_256_WORD_COST,
    },
    host::ExecutionResult,
};
use aevm_common::{Address, Revision, U256};
use bytes::Bytes;
use malachite::Natural;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

const ECRECOVER_ADDRESS: u8 = 0x01;
const SHA2_256_ADDRESS: u8 = 0x02;
const RIPEMD_160_ADDRESS: u8 = 0x03;
const IDENTITY_ADDRESS: u8 = 0x04;
const MODEXP_ADDRESS: u8 = 0x05;
const POINT_EVALUATION_ADDRESS: u8 = 0x0a;

/// True iff the address names a precompiled contract in this revision.
pub fn is_precompile(address: Address, revision: Revision) -> bool {
    let bytes = address.as_bytes();
    if bytes[..19].iter().any(|byte| *byte != 0) {
        return false;
    }
    let last = bytes[19];
    let count = if revision >= Revision::Cancun {
        POINT_EVALUATION_ADDRESS
    } else if revision >= Revision::Istanbul {
        0x09
    } else if revision >= Revision::Byzantium {
        0x08
    } else {
        IDENTITY_ADDRESS
    };
    (ECRECOVER_ADDRESS..=count).contains(&last)
}

/// Runs a precompile with the given gas budget.
pub fn execute(address: Address, input: &[u8], gas: i64, revision: Revision) -> ExecutionResult {
    match address.as_bytes()[19] {
        SHA2_256_ADDRESS => word_priced(gas, input, SHA2_256_STATIC_COST, SHA2_256_WORD_COST, |input| {
            Bytes::copy_from_slice(&Sha256::digest(input))
        }),
        RIPEMD_160_ADDRESS => {
            word_priced(gas, input, RIPEMD_160_STATIC_COST, RIPEMD_160_WORD_COST, |input| {
                let mut output = [0u8; 32];
                output[12..].copy_from_slice(&Ripemd160::digest(input));
                Bytes::copy_from_slice(&output)
            })
        }
        IDENTITY_ADDRESS => {
            word_priced(gas, input, IDENTITY_STATIC_COST, IDENTITY_WORD_COST, |input| {
                Bytes::copy_from_slice(input)
            })
        }
        MODEXP_ADDRESS => modexp(input, gas, revision),
        // The remaining entries are external collaborators.
        _ => ExecutionResult::failure(StatusCode::PrecompileFailure),
    }
}

fn word_priced(
    gas: i64,
    input: &[u8],
    static_cost: u64,
    word_cost: u64,
    run: impl FnOnce(&[u8]) -> Bytes,
) -> ExecutionResult {
    let Ok(cost) = precompile_words(static_cost, word_cost, input.len()) else {
        return ExecutionResult::failure(StatusCode::OutOfGas);
    };
    charge_then(gas, cost, || run(input))
}

fn charge_then(gas: i64, cost: u64, run: impl FnOnce() -> Bytes) -> ExecutionResult {
    let Ok(cost) = i64::try_from(cost) else {
        return ExecutionResult::failure(StatusCode::OutOfGas);
    };
    if cost > gas {
        return ExecutionResult::failure(StatusCode::OutOfGas);
    }
    ExecutionResult {
        status: StatusCode::Success,
        gas_left: gas - cost,
        gas_refund: 0,
        output: run(),
        create_address: None,
    }
}

// ============================================================================
// MODEXP ([EIP-198], repriced by [EIP-2565])
// ============================================================================

fn modexp(input: &[u8], gas: i64, revision: Revision) -> ExecutionResult {
    let base_len = read_length(input, 0);
    let exp_len = read_length(input, 32);
    let mod_len = read_length(input, 64);

    let (Ok(base_len), Ok(exp_len), Ok(mod_len)) = (
        usize::try_from(base_len),
        usize::try_from(exp_len),
        usize::try_from(mod_len),
    ) else {
        // Unrepresentable lengths can never be paid for.
        return ExecutionResult::failure(StatusCode::OutOfGas);
    };

    let payload = input.get(96..).unwrap_or_default();

    // The head of the exponent drives the iteration count; gas is settled
    // before any of the (possibly huge) operands are materialized.
    let head_len = exp_len.min(32);
    let head = right_padded(payload, base_len, head_len);
    let mut head_word = [0u8; 32];
    head_word[32 - head_len..].copy_from_slice(&head);
    let exp_head = U256::from_big_endian(&head_word);

    let Some(cost) = modexp_gas(base_len, exp_len, mod_len, exp_head, revision) else {
        return ExecutionResult::failure(StatusCode::OutOfGas);
    };

    charge_then(gas, cost, || {
        if mod_len == 0 {
            return Bytes::new();
        }
        let base_bytes = right_padded(payload, 0, base_len);
        let exp_bytes = right_padded(payload, base_len, exp_len);
        let mod_bytes = right_padded(payload, base_len + exp_len, mod_len);
        let base = natural_from_bytes(&base_bytes);
        let modulus = natural_from_bytes(&mod_bytes);
        let result = mod_pow(base, &exp_bytes, &modulus);
        Bytes::from(natural_to_bytes(&result, mod_len))
    })
}

fn read_length(input: &[u8], offset: usize) -> U256 {
    let mut word = [0u8; 32];
    if let Some(slice) = input.get(offset..) {
        let n = slice.len().min(32);
        word[..n].copy_from_slice(&slice[..n]);
    }
    U256::from_big_endian(&word)
}

fn right_padded(payload: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if offset < payload.len() {
        let n = len.min(payload.len() - offset);
        out[..n].copy_from_slice(&payload[offset..offset + n]);
    }
    out
}

fn modexp_gas(
    base_len: usize,
    exp_len: usize,
    mod_len: usize,
    exp_head: U256,
    revision: Revision,
) -> Option<u64> {
    let max_len = base_len.max(mod_len) as u64;

    // Multiplication complexity: quadratic in words from Berlin ([EIP-2565]),
    // the original piecewise formula before.
    let complexity = if revision >= Revision::Berlin {
        let words = max_len.div_ceil(8);
        words.checked_mul(words)?
    } else if max_len <= 64 {
        max_len.checked_mul(max_len)?
    } else if max_len <= 1024 {
        (max_len.checked_mul(max_len)? / 4)
            .checked_add(96u64.checked_mul(max_len)?)?
            .checked_sub(3072)?
    } else {
        (max_len.checked_mul(max_len)? / 16)
            .checked_add(480u64.checked_mul(max_len)?)?
            .checked_sub(199680)?
    };

    let head_bits = exp_head.bits() as u64;
    let iterations = if exp_len <= 32 {
        head_bits.saturating_sub(1)
    } else {
        (8 * (exp_len as u64 - 32)).checked_add(head_bits.max(1) - 1)?
    }
    .max(1);

    let quotient = if revision >= Revision::Berlin { 3 } else { 20 };
    let dynamic = complexity.checked_mul(iterations)? / quotient;

    // [EIP-2565] introduced the floor cost; there was none before.
    Some(if revision >= Revision::Berlin {
        MODEXP_MIN_COST.max(dynamic)
    } else {
        dynamic
    })
}

fn natural_from_bytes(bytes: &[u8]) -> Natural {
    let mut value = Natural::from(0u32);
    for byte in bytes {
        value = value * Natural::from(256u32) + Natural::from(*byte);
    }
    value
}

fn natural_to_bytes(value: &Natural, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let mut value = value.clone();
    let divisor = Natural::from(256u32);
    for slot in out.iter_mut().rev() {
        if value == Natural::from(0u32) {
            break;
        }
        let rem = &value % &divisor;
        *slot = u32::try_from(&rem).unwrap_or_default() as u8;
        value = value / &divisor;
    }
    out
}

/// Square-and-multiply over the big-endian exponent bytes.
fn mod_pow(base: Natural, exp_bytes: &[u8], modulus: &Natural) -> Natural {
    if *modulus == Natural::from(0u32) || *modulus == Natural::from(1u32) {
        return Natural::from(0u32);
    }
    let base = base % modulus;
    let mut result = Natural::from(1u32);
    for byte in exp_bytes {
        for bit in (0..8).rev() {
            result = &result * &result % modulus;
            if (byte >> bit) & 1 == 1 {
                result = result * &base % modulus;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn precompile_range_by_revision() {
        assert!(is_precompile(addr(1), Revision::Frontier));
        assert!(is_precompile(addr(4), Revision::Frontier));
        assert!(!is_precompile(addr(5), Revision::Frontier));
        assert!(is_precompile(addr(8), Revision::Byzantium));
        assert!(!is_precompile(addr(9), Revision::Byzantium));
        assert!(is_precompile(addr(9), Revision::Istanbul));
        assert!(is_precompile(addr(10), Revision::Cancun));
        assert!(!is_precompile(addr(0), Revision::Cancun));
        assert!(!is_precompile(addr(11), Revision::Cancun));
        // High bytes must be zero.
        let mut bytes = [0u8; 20];
        bytes[0] = 1;
        bytes[19] = 1;
        assert!(!is_precompile(Address::from_slice(&bytes), Revision::Cancun));
    }

    #[test]
    fn identity_copies_input() {
        let result = execute(addr(4), b"hello", 100, Revision::Cancun);
        assert!(result.is_success());
        assert_eq!(result.output.as_ref(), b"hello");
        // 15 static + 3 for one word.
        assert_eq!(result.gas_left, 100 - 18);
    }

    #[test]
    fn sha256_known_digest() {
        let result = execute(addr(2), b"", 100, Revision::Cancun);
        assert!(result.is_success());
        assert_eq!(
            hex::encode(&result.output),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(result.gas_left, 100 - 60);
    }

    #[test]
    fn ripemd160_is_left_padded() {
        let result = execute(addr(3), b"", 1000, Revision::Cancun);
        assert!(result.is_success());
        assert_eq!(result.output.len(), 32);
        assert_eq!(&result.output[..12], &[0u8; 12]);
        assert_eq!(
            hex::encode(&result.output[12..]),
            "9c1185a5c5e9fc54612808977ee8f548b2258d31"
        );
    }

    #[test]
    fn insufficient_gas_fails() {
        let result = execute(addr(4), b"hello", 17, Revision::Cancun);
        assert_eq!(result.status, StatusCode::OutOfGas);
        assert_eq!(result.gas_left, 0);
    }

    #[test]
    fn unimplemented_precompile_reports_failure() {
        let result = execute(addr(1), &[0u8; 128], 10000, Revision::Cancun);
        assert_eq!(result.status, StatusCode::PrecompileFailure);
    }

    #[test]
    fn modexp_small_case() {
        // 3 ** 5 % 7 == 5, all lengths 1.
        let mut input = vec![0u8; 96];
        input[31] = 1;
        input[63] = 1;
        input[95] = 1;
        input.extend_from_slice(&[3, 5, 7]);
        let result = execute(addr(5), &input, 100_000, Revision::Cancun);
        assert!(result.is_success());
        assert_eq!(result.output.as_ref(), &[5]);
        // Berlin floor cost applies.
        assert_eq!(result.gas_left, 100_000 - 200);
    }

    #[test]
    fn modexp_zero_modulus_yields_zeroes() {
        let mut input = vec![0u8; 96];
        input[31] = 1;
        input[63] = 1;
        input[95] = 2;
        input.extend_from_slice(&[3, 5]);
        let result = execute(addr(5), &input, 100_000, Revision::Cancun);
        assert!(result.is_success());
        assert_eq!(result.output.as_ref(), &[0, 0]);
    }
}
