use crate::memory::{BytePointer, Memory, MemoryError, read_u32_volatile};
use crate::util::{READ_WIDTH, Size};
use log::debug;

/// Buffer holding the probed word.
///
/// Only the word at `offset` is ever read. The remaining bytes exist so that the
/// probe region is as large as the eviction region.
#[derive(Debug)]
pub struct ProbeBuffer {
    memory: Memory,
    offset: usize,
    target: *const u8,
}

impl ProbeBuffer {
    /// Maps a probe buffer of `len` bytes and targets the word at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer cannot be mapped.
    ///
    /// # Panics
    ///
    /// Panics if the probed word does not fit into the buffer.
    pub fn new(len: usize, offset: usize) -> Result<Self, MemoryError> {
        assert!(
            offset
                .checked_add(READ_WIDTH)
                .is_some_and(|end| end <= len),
            "probe offset {} does not fit into {} bytes",
            offset,
            len
        );
        let memory = Memory::mmap(len)?;
        let target = memory.addr(offset) as *const u8;
        debug!(
            "Probe buffer: {} probing {:p} (offset {})",
            Size::from_bytes(len),
            target,
            offset
        );
        Ok(ProbeBuffer {
            memory,
            offset,
            target,
        })
    }

    /// Reads the probed word once.
    #[inline(always)]
    pub fn probe(&self) -> u32 {
        // offset + READ_WIDTH <= len, checked in new
        unsafe { read_u32_volatile(self.target) }
    }

    /// Address of the probed word.
    pub fn target(&self) -> *const u8 {
        self.target
    }

    /// Offset of the probed word.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Always false, the buffer is never empty.
    pub fn is_empty(&self) -> bool {
        self.memory.len() == 0
    }
}
