use super::{BytePointer, MemoryError};
use crate::util::{FILL_BYTE, Size, mmap, munmap};
use log::debug;

/// A managed memory region.
///
/// Owns an anonymous mapping of `len` bytes. Every page is populated and written
/// before the region is handed out. The mapping is released when the block is dropped.
#[derive(Debug)]
pub struct Memory {
    ptr: *mut u8,
    len: usize,
}

unsafe impl Send for Memory {}

impl Memory {
    /// Allocates memory using mmap.
    ///
    /// Creates a private anonymous mapping of the specified size with
    /// read/write permissions, filled with [`FILL_BYTE`].
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ZeroSizeLayout`] for `size == 0` and
    /// [`MemoryError::Mmap`] if the kernel refuses the mapping.
    pub fn mmap(size: usize) -> Result<Self, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizeLayout);
        }
        let ptr = mmap(size, FILL_BYTE)?;
        debug!("Allocated {} at {:p}", Size::from_bytes(size), ptr);
        Ok(Memory { ptr, len: size })
    }
}

impl Drop for Memory {
    fn drop(&mut self) {
        unsafe { munmap(self.ptr, self.len) };
    }
}

impl BytePointer for Memory {
    fn addr(&self, offset: usize) -> *mut u8 {
        assert!(
            offset < self.len,
            "Memory::addr failed. Offset {} >= {}",
            offset,
            self.len
        );
        unsafe { self.ptr.byte_add(offset) }
    }
    fn ptr(&self) -> *mut u8 {
        self.ptr
    }
    fn len(&self) -> usize {
        self.len
    }
}
