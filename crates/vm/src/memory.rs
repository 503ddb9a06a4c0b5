//! Per-frame scratch memory: byte-addressable, grow-only, quadratically
//! priced. The logical size is always a multiple of 32; capacity grows in
//! 4 KiB pages so repeated small expansions don't reallocate.

use crate::errors::{ExceptionalHalt, InternalError, VMError};
use aevm_common::{
    constants::{MEMORY_EXPANSION_QUOTIENT, WORD_SIZE_IN_BYTES_USIZE},
    utils::u256_from_big_endian,
    U256,
};
use ExceptionalHalt::OutOfGas;

const PAGE_SIZE: usize = 4096;

#[derive(Debug, Clone, Default)]
pub struct Memory {
    buffer: Vec<u8>,
    len: usize,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(PAGE_SIZE),
            len: 0,
        }
    }

    /// Logical size in bytes; always a multiple of 32.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Grows the logical size to `new_size` (already rounded up to a word
    /// boundary by [`calculate_memory_size`]). The expansion cost must have
    /// been charged by the caller. Shrinking never happens.
    pub fn resize(&mut self, new_size: usize) {
        debug_assert!(new_size % WORD_SIZE_IN_BYTES_USIZE == 0);
        if new_size <= self.len {
            return;
        }
        let capacity = new_size
            .checked_next_multiple_of(PAGE_SIZE)
            .unwrap_or(new_size);
        if self.buffer.len() < capacity {
            self.buffer.resize(capacity, 0);
        }
        self.len = new_size;
    }

    pub fn load_range(&mut self, offset: usize, size: usize) -> Result<Vec<u8>, VMError> {
        if size == 0 {
            return Ok(Vec::new());
        }
        let end = offset.checked_add(size).ok_or(OutOfGas)?;
        self.resize(word_aligned(end)?);
        Ok(self
            .buffer
            .get(offset..end)
            .ok_or(InternalError::Slicing)?
            .to_vec())
    }

    pub fn load_word(&mut self, offset: usize) -> Result<U256, VMError> {
        let end = offset
            .checked_add(WORD_SIZE_IN_BYTES_USIZE)
            .ok_or(OutOfGas)?;
        self.resize(word_aligned(end)?);
        Ok(u256_from_big_endian(
            self.buffer.get(offset..end).ok_or(InternalError::Slicing)?,
        ))
    }

    pub fn store_data(&mut self, offset: usize, data: &[u8]) -> Result<(), VMError> {
        if data.is_empty() {
            return Ok(());
        }
        let end = offset.checked_add(data.len()).ok_or(OutOfGas)?;
        self.resize(word_aligned(end)?);
        self.buffer
            .get_mut(offset..end)
            .ok_or(InternalError::Slicing)?
            .copy_from_slice(data);
        Ok(())
    }

    pub fn store_word(&mut self, offset: usize, word: U256) -> Result<(), VMError> {
        self.store_data(offset, &word.to_big_endian())
    }

    pub fn copy_within(
        &mut self,
        src_offset: usize,
        dst_offset: usize,
        size: usize,
    ) -> Result<(), VMError> {
        if size == 0 {
            return Ok(());
        }
        let src_end = src_offset.checked_add(size).ok_or(OutOfGas)?;
        let dst_end = dst_offset.checked_add(size).ok_or(OutOfGas)?;
        self.resize(word_aligned(src_end.max(dst_end))?);
        if src_end > self.buffer.len() || dst_end > self.buffer.len() {
            return Err(InternalError::Slicing.into());
        }
        self.buffer.copy_within(src_offset..src_end, dst_offset);
        Ok(())
    }
}

fn word_aligned(size: usize) -> Result<usize, VMError> {
    size.checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE)
        .ok_or(OutOfGas.into())
}

/// New logical memory size needed to touch `[offset, offset + size)`,
/// rounded up to a word boundary. A zero size never grows memory; offsets
/// beyond the 32-bit range are rejected.
pub fn calculate_memory_size(offset: usize, size: usize) -> Result<usize, VMError> {
    if size == 0 {
        return Ok(0);
    }
    if offset > u32::MAX as usize {
        return Err(OutOfGas.into());
    }
    offset
        .checked_add(size)
        .and_then(|end| end.checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE))
        .ok_or(OutOfGas.into())
}

/// Cost of growing memory from `current_size` to `new_size`: the difference
/// between the two total costs `3·w + w²/512`.
pub fn expansion_cost(new_size: usize, current_size: usize) -> Result<u64, VMError> {
    if new_size <= current_size {
        return Ok(0);
    }
    total_cost(new_size)?
        .checked_sub(total_cost(current_size)?)
        .ok_or(InternalError::Underflow.into())
}

fn total_cost(size: usize) -> Result<u64, VMError> {
    let words = size
        .checked_add(WORD_SIZE_IN_BYTES_USIZE - 1)
        .ok_or(OutOfGas)?
        / WORD_SIZE_IN_BYTES_USIZE;
    let cost = words
        .checked_pow(2)
        .ok_or(OutOfGas)?
        .checked_div(MEMORY_EXPANSION_QUOTIENT)
        .ok_or(OutOfGas)?
        .checked_add(3usize.checked_mul(words).ok_or(OutOfGas)?)
        .ok_or(OutOfGas)?;
    cost.try_into().map_err(|_| OutOfGas.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_pricing() {
        // One word: 3 gas. 32 words (1 KiB): 3*32 + 32*32/512 = 98.
        assert_eq!(expansion_cost(32, 0).unwrap(), 3);
        assert_eq!(expansion_cost(1024, 0).unwrap(), 98);
        // Only the delta is charged.
        assert_eq!(
            expansion_cost(1024, 32).unwrap(),
            expansion_cost(1024, 0).unwrap() - 3
        );
        assert_eq!(expansion_cost(32, 1024).unwrap(), 0);
    }

    #[test]
    fn memory_size_rounds_to_words() {
        assert_eq!(calculate_memory_size(0, 1).unwrap(), 32);
        assert_eq!(calculate_memory_size(32, 32).unwrap(), 64);
        assert_eq!(calculate_memory_size(33, 1).unwrap(), 64);
        assert!(calculate_memory_size(u32::MAX as usize + 1, 1).is_err());
        assert_eq!(calculate_memory_size(usize::MAX, 0).unwrap(), 0);
    }

    #[test]
    fn zero_filled_growth() {
        let mut memory = Memory::new();
        memory.resize(64);
        assert_eq!(memory.len(), 64);
        assert_eq!(memory.load_range(0, 64).unwrap(), vec![0; 64]);
    }

    #[test]
    fn word_round_trip() {
        let mut memory = Memory::new();
        let word = U256::from(0xdeadbeefu64);
        memory.store_word(0, word).unwrap();
        assert_eq!(memory.load_word(0).unwrap(), word);
        // Big-endian layout: low byte at offset 31.
        assert_eq!(memory.load_range(31, 1).unwrap(), vec![0xef]);
    }

    #[test]
    fn copy_within_overlapping() {
        let mut memory = Memory::new();
        memory.store_data(0, &[1, 2, 3, 4]).unwrap();
        memory.copy_within(0, 2, 4).unwrap();
        assert_eq!(memory.load_range(0, 6).unwrap(), vec![1, 2, 1, 2, 3, 4]);
    }

    #[test]
    fn grow_only() {
        let mut memory = Memory::new();
        memory.resize(96);
        memory.resize(32);
        assert_eq!(memory.len(), 96);
    }
}
