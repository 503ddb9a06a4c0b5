use crate::Address;
use ethereum_types::{H256, U256};

/// keccak256 of an arbitrary byte string.
#[inline]
pub fn keccak<T: AsRef<[u8]>>(data: T) -> H256 {
    keccak_hash::keccak(data)
}

/// Loads a big-endian word from a slice of at most 32 bytes, left-padding
/// with zeros.
#[inline]
pub fn u256_from_big_endian(slice: &[u8]) -> U256 {
    debug_assert!(slice.len() <= 32);
    U256::from_big_endian(slice)
}

#[inline]
pub fn u256_to_h256(value: U256) -> H256 {
    H256(value.to_big_endian())
}

#[inline]
pub fn h256_to_u256(value: H256) -> U256 {
    U256::from_big_endian(value.as_bytes())
}

/// Interprets the low 20 bytes of a word as an address.
#[inline]
pub fn word_to_address(word: U256) -> Address {
    let bytes = word.to_big_endian();
    Address::from_slice(&bytes[12..])
}

#[inline]
pub fn address_to_word(address: Address) -> U256 {
    U256::from_big_endian(address.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_is_the_empty_code_hash() {
        assert_eq!(keccak([]), crate::constants::EMPTY_CODE_HASH);
    }

    #[test]
    fn word_address_round_trip() {
        let addr = Address::from_low_u64_be(0xdeadbeef);
        assert_eq!(word_to_address(address_to_word(addr)), addr);
        // High 12 bytes are discarded.
        let word = address_to_word(addr) | (U256::one() << 200);
        assert_eq!(word_to_address(word), addr);
    }
}
