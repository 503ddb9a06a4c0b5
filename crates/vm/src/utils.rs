use crate::errors::{ExceptionalHalt, VMError};
use aevm_common::{utils::keccak, Address, H256, U256};

/// Converts a stack word to a `usize`, failing with out-of-gas: a buffer
/// offset or size that large can never be paid for.
#[inline]
pub fn u256_to_usize(value: U256) -> Result<usize, VMError> {
    usize::try_from(value).map_err(|_| ExceptionalHalt::OutOfGas.into())
}

/// Converts a (size, offset) stack pair. When the size is zero the offset is
/// irrelevant and not validated, matching the no-op memory access rule.
#[inline]
pub fn size_offset_to_usize(size: U256, offset: U256) -> Result<(usize, usize), VMError> {
    let size = u256_to_usize(size)?;
    if size == 0 {
        return Ok((0, 0));
    }
    Ok((size, u256_to_usize(offset)?))
}

/// Address of a contract created with CREATE: the low 20 bytes of
/// `keccak(rlp([sender, nonce]))`.
pub fn calculate_create_address(sender: Address, nonce: u64) -> Address {
    // rlp([20-byte string, scalar]); the payload always fits a short list.
    let mut payload = Vec::with_capacity(32);
    payload.push(0x80 + 20);
    payload.extend_from_slice(sender.as_bytes());
    if nonce == 0 {
        payload.push(0x80);
    } else if nonce < 0x80 {
        payload.push(nonce as u8);
    } else {
        let bytes = nonce.to_be_bytes();
        let skip = bytes.iter().take_while(|byte| **byte == 0).count();
        payload.push(0x80 + (8 - skip) as u8);
        payload.extend_from_slice(&bytes[skip..]);
    }

    let mut encoded = Vec::with_capacity(payload.len() + 1);
    encoded.push(0xc0 + payload.len() as u8);
    encoded.extend_from_slice(&payload);

    let hash = keccak(&encoded);
    Address::from_slice(&hash.as_bytes()[12..])
}

/// Address of a contract created with CREATE2: the low 20 bytes of
/// `keccak(0xff ++ sender ++ salt ++ keccak(initcode))`.
pub fn calculate_create2_address(sender: Address, initcode_hash: H256, salt: H256) -> Address {
    let mut buffer = [0u8; 85];
    buffer[0] = 0xff;
    buffer[1..21].copy_from_slice(sender.as_bytes());
    buffer[21..53].copy_from_slice(salt.as_bytes());
    buffer[53..85].copy_from_slice(initcode_hash.as_bytes());

    let hash = keccak(buffer);
    Address::from_slice(&hash.as_bytes()[12..])
}
