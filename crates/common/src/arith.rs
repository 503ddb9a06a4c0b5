//! 256-bit word arithmetic.
//!
//! The unsigned substrate is `ethereum_types::U256`; this module adds the
//! signed reinterpretation and the modular/shift/byte operations the
//! instruction set needs. Division and modulo by zero yield zero, matching
//! the instruction semantics rather than panicking.

use ethereum_types::{U256, U512};
use std::cmp::Ordering;

/// Two's complement negation.
#[inline]
pub fn twos_complement(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

/// True iff the word is negative under the signed-256 reinterpretation.
#[inline]
pub fn is_negative(value: U256) -> bool {
    value.bit(255)
}

/// Signed division. Division by zero yields zero; `INT_MIN / -1 = INT_MIN`.
pub fn sdiv(mut lhs: U256, mut rhs: U256) -> U256 {
    let mut negative = false;
    if is_negative(lhs) {
        lhs = twos_complement(lhs);
        negative = !negative;
    }
    if is_negative(rhs) {
        rhs = twos_complement(rhs);
        negative = !negative;
    }

    match lhs.checked_div(rhs) {
        Some(quotient) if negative => twos_complement(quotient),
        Some(quotient) => quotient,
        None => U256::zero(),
    }
}

/// Signed remainder. The result takes the sign of the dividend; modulo by
/// zero yields zero.
pub fn smod(mut lhs: U256, mut rhs: U256) -> U256 {
    let negative = is_negative(lhs);
    if negative {
        lhs = twos_complement(lhs);
    }
    if is_negative(rhs) {
        rhs = twos_complement(rhs);
    }

    match lhs.checked_rem(rhs) {
        Some(rem) if negative => twos_complement(rem),
        Some(rem) => rem,
        None => U256::zero(),
    }
}

/// `(lhs + rhs) % modulus` computed in 257 bits. Modulo zero yields zero.
pub fn addmod(lhs: U256, rhs: U256, modulus: U256) -> U256 {
    if modulus.is_zero() {
        return U256::zero();
    }
    let sum = U512::from(lhs).overflowing_add(U512::from(rhs)).0;
    let rem = sum % U512::from(modulus);
    U256([rem.0[0], rem.0[1], rem.0[2], rem.0[3]])
}

/// `(lhs * rhs) % modulus` computed in 512 bits. Modulo zero yields zero.
pub fn mulmod(lhs: U256, rhs: U256, modulus: U256) -> U256 {
    if modulus.is_zero() {
        return U256::zero();
    }
    let product = lhs.full_mul(rhs);
    let rem = product % U512::from(modulus);
    U256([rem.0[0], rem.0[1], rem.0[2], rem.0[3]])
}

/// Exponentiation by squaring with wrap-around on overflow.
#[inline]
pub fn exp(base: U256, exponent: U256) -> U256 {
    base.overflowing_pow(exponent).0
}

/// Logical left shift. Shift amounts of 256 or more yield zero.
pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::zero()
    } else {
        value << shift.low_u64() as usize
    }
}

/// Logical right shift. Shift amounts of 256 or more yield zero.
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::zero()
    } else {
        value >> shift.low_u64() as usize
    }
}

/// Arithmetic (sign-extending) right shift.
pub fn sar(shift: U256, value: U256) -> U256 {
    let negative = is_negative(value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }
    let shift = shift.low_u64() as usize;
    let shifted = value >> shift;
    if negative && shift > 0 {
        // Fill the vacated high bits with ones.
        shifted | (U256::MAX << (256 - shift))
    } else {
        shifted
    }
}

/// `BYTE` semantics: byte `index` of the word counted from the most
/// significant end, or zero for `index >= 32`.
pub fn byte(index: U256, value: U256) -> U256 {
    match usize::try_from(index) {
        // U256::byte() counts from the least significant end.
        Ok(i) if i < 32 => U256::from(value.byte(31 - i)),
        _ => U256::zero(),
    }
}

/// `SIGNEXTEND` semantics: sign-extend `value` from byte `index` (counted
/// from the least significant end). An index of 31 or more is the identity.
pub fn signextend(index: U256, mut value: U256) -> U256 {
    match usize::try_from(index) {
        Ok(i) if i < 31 => {
            if value.bit(8 * i + 7) {
                value |= U256::MAX << (8 * (i + 1));
            } else {
                value &= (U256::one() << (8 * (i + 1))) - 1;
            }
            value
        }
        _ => value,
    }
}

/// Signed less-than.
pub fn slt(lhs: U256, rhs: U256) -> bool {
    scmp(lhs, rhs) == Ordering::Less
}

/// Signed greater-than.
pub fn sgt(lhs: U256, rhs: U256) -> bool {
    scmp(lhs, rhs) == Ordering::Greater
}

fn scmp(lhs: U256, rhs: U256) -> Ordering {
    match (is_negative(lhs), is_negative(rhs)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => lhs.cmp(&rhs),
    }
}

/// Number of bytes needed to represent the value; zero for zero.
#[inline]
pub fn count_significant_bytes(value: U256) -> u64 {
    (value.bits() as u64 + 7) / 8
}
