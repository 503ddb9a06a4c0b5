use ethereum_types::{H256, U256};

pub const WORD_SIZE_IN_BYTES_USIZE: usize = 32;
pub const WORD_SIZE_IN_BYTES_U64: u64 = 32;

/// Operand stack capacity, in words.
pub const STACK_LIMIT: usize = 1024;

/// Maximum nesting depth of message calls.
pub const MAX_CALL_DEPTH: u32 = 1024;

/// keccak256 of the empty byte string.
pub const EMPTY_CODE_HASH: H256 = H256([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

pub const MEMORY_EXPANSION_QUOTIENT: usize = 512;

/// [EIP-170] deployed code size cap, from Spurious Dragon.
pub const MAX_CODE_SIZE: usize = 0x6000;

/// [EIP-3860] initcode size cap, from Shanghai.
pub const MAX_INITCODE_SIZE: usize = 2 * MAX_CODE_SIZE;

/// [EIP-3541] deployed code must not start with this byte, from London.
pub const INVALID_CONTRACT_PREFIX: u8 = 0xef;

/// How far back BLOCKHASH can reach.
pub const LAST_AVAILABLE_BLOCK_LIMIT: u64 = 256;

// Blob constants ([EIP-4844]).
pub const GAS_PER_BLOB: u64 = 131072;
pub const MAX_BLOB_HASHES_PER_TX: usize = 6;
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;
pub const BLOB_BASE_FEE_UPDATE_FRACTION: u64 = 3338477;
pub const MIN_BLOB_GAS_PRICE: u64 = 1;
pub const TARGET_BLOB_GAS_PER_BLOCK: u64 = 393216;
pub const MAX_BLOB_GAS_PER_BLOCK: u64 = 786432;

pub const SUCCESS_WORD: U256 = U256([1, 0, 0, 0]);
pub const FAIL_WORD: U256 = U256([0, 0, 0, 0]);
