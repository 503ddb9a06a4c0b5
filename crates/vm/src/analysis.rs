//! Code analysis: performed once per bytecode, read-only during execution.
//!
//! The analysis pads the code with trailing STOP bytes so the dispatch loop
//! always finds a terminator (32 bytes for a truncated PUSH32 immediate plus
//! one more for the terminator itself), and computes the jumpdest bitmap:
//! one bit per code offset, set iff the byte is JUMPDEST and not inside PUSH
//! immediate data.
//!
//! Code in the extended container format is recognized by its magic bytes
//! and unwrapped to its code sections; anything unrecognized is legacy.

use crate::opcodes::Opcode;
use aevm_common::Revision;
use bytes::Bytes;

/// STOP padding appended to the executable code.
pub const CODE_PADDING: usize = 33;

/// Magic prefix of the extended code container.
pub const CONTAINER_MAGIC: [u8; 2] = [0xEF, 0x00];

#[derive(Debug, Clone)]
pub struct CodeAnalysis {
    /// Executable code followed by `CODE_PADDING` STOP bytes.
    padded_code: Bytes,
    /// Length of the executable code without padding.
    code_len: usize,
    jumpdest_bitmap: Bitmap,
    /// Parsed container header when the code uses the extended format.
    pub container: Option<ContainerHeader>,
}

impl CodeAnalysis {
    /// Analyzes `code` for the given revision, choosing the legacy or the
    /// extended-container path based on the magic bytes.
    pub fn analyze(revision: Revision, code: &[u8]) -> Self {
        if revision >= Revision::Prague {
            if let Some(header) = ContainerHeader::parse(code) {
                let executable = header.executable_code(code);
                return Self::analyze_legacy_with(executable, Some(header));
            }
        }
        Self::analyze_legacy_with(code, None)
    }

    fn analyze_legacy_with(code: &[u8], container: Option<ContainerHeader>) -> Self {
        let mut padded = Vec::with_capacity(code.len() + CODE_PADDING);
        padded.extend_from_slice(code);
        padded.resize(code.len() + CODE_PADDING, Opcode::STOP.into());

        Self {
            padded_code: Bytes::from(padded),
            code_len: code.len(),
            jumpdest_bitmap: analyze_jumpdests(code),
            container,
        }
    }

    /// Executable code including the STOP padding.
    #[inline]
    pub fn padded_code(&self) -> &[u8] {
        &self.padded_code
    }

    /// Executable code without padding.
    #[inline]
    pub fn original_code(&self) -> &[u8] {
        &self.padded_code[..self.code_len]
    }

    #[inline]
    pub fn code_len(&self) -> usize {
        self.code_len
    }

    /// True iff `offset` is a legal dynamic-jump target.
    #[inline]
    pub fn is_jumpdest(&self, offset: usize) -> bool {
        self.jumpdest_bitmap.get(offset)
    }
}

fn analyze_jumpdests(code: &[u8]) -> Bitmap {
    let mut map = Bitmap::new(code.len());
    let mut i = 0;
    while i < code.len() {
        let op = code[i];
        if op == u8::from(Opcode::JUMPDEST) {
            map.set(i);
        }
        i += 1 + Opcode::immediate_size(op);
    }
    map
}

/// One bit per code offset.
#[derive(Debug, Clone, Default)]
struct Bitmap {
    words: Vec<u64>,
}

impl Bitmap {
    fn new(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(64)],
        }
    }

    fn set(&mut self, bit: usize) {
        self.words[bit / 64] |= 1 << (bit % 64);
    }

    fn get(&self, bit: usize) -> bool {
        self.words
            .get(bit / 64)
            .is_some_and(|word| word & (1 << (bit % 64)) != 0)
    }
}

/// Header of the extended code container.
///
/// Layout: magic (2), version (1), then a section table of `(kind, size)`
/// entries (kind 1: type metadata, kind 2: code sections with a leading
/// count, kind 3: data), closed by a zero terminator, followed by the
/// section contents in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u8,
    /// `(offset, size)` of each code section within the container.
    pub code_sections: Vec<(usize, usize)>,
    /// `(offset, size)` of the data section within the container.
    pub data_section: (usize, usize),
}

impl ContainerHeader {
    const KIND_TYPES: u8 = 0x01;
    const KIND_CODE: u8 = 0x02;
    const KIND_DATA: u8 = 0x03;
    const KIND_TERMINATOR: u8 = 0x00;

    /// Parses the header, returning `None` for anything that is not a valid
    /// container: such code must be treated as legacy.
    pub fn parse(container: &[u8]) -> Option<Self> {
        let mut cursor = Cursor::new(container);
        if cursor.take(2)? != CONTAINER_MAGIC {
            return None;
        }
        let version = cursor.byte()?;
        if version != 1 {
            return None;
        }

        let mut types_size = 0usize;
        let mut code_sizes: Vec<usize> = Vec::new();
        let mut data_size = 0usize;
        loop {
            match cursor.byte()? {
                Self::KIND_TERMINATOR => break,
                Self::KIND_TYPES => types_size = cursor.u16()?,
                Self::KIND_CODE => {
                    let count = cursor.u16()?;
                    if count == 0 {
                        return None;
                    }
                    for _ in 0..count {
                        code_sizes.push(cursor.u16()?);
                    }
                }
                Self::KIND_DATA => data_size = cursor.u16()?,
                _ => return None,
            }
        }
        if code_sizes.is_empty() {
            return None;
        }

        // Section contents follow the header in table order.
        let mut offset = cursor.position() + types_size;
        let mut code_sections = Vec::with_capacity(code_sizes.len());
        for size in code_sizes {
            code_sections.push((offset, size));
            offset += size;
        }
        let data_section = (offset, data_size);
        if offset + data_size > container.len() {
            return None;
        }

        Some(Self {
            version,
            code_sections,
            data_section,
        })
    }

    /// The contiguous range covering every code section.
    pub fn executable_code<'c>(&self, container: &'c [u8]) -> &'c [u8] {
        let start = self.code_sections[0].0;
        let (last_offset, last_size) = self.code_sections[self.code_sections.len() - 1];
        &container[start..last_offset + last_size]
    }

    pub fn data<'c>(&self, container: &'c [u8]) -> &'c [u8] {
        let (offset, size) = self.data_section;
        &container[offset..offset + size]
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn byte(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let slice = self.bytes.get(self.pos..self.pos + n)?;
        self.pos += n;
        Some(slice)
    }

    fn u16(&mut self) -> Option<usize> {
        let bytes = self.take(2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]) as usize)
    }
}
