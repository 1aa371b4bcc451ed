//! The `memory` module provides the buffers the prober reads from.
//!
//! The `memory` module provides the following abstractions:
//! - `Memory`: An anonymous, pre-faulted memory mapping that is unmapped on drop.
//! - `BytePointer`: A trait for accessing memory as a byte pointer.
//! - `read_u32_volatile`: A load that the compiler can neither elide nor merge.
mod memblock;

pub use self::memblock::Memory;

use crate::util::READ_WIDTH;

/// Errors that can occur during memory operations.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Attempted to map a zero-size region
    #[error("Zero size layout")]
    ZeroSizeLayout,
    /// The kernel refused the mapping
    #[error("mmap failed: {0}")]
    Mmap(#[from] std::io::Error),
}

/// Trait for accessing memory as a byte pointer.
///
/// Provides low-level access to memory regions with byte-level addressing.
#[allow(clippy::len_without_is_empty)]
pub trait BytePointer {
    /// Returns a mutable pointer to the byte at the given offset.
    ///
    /// # Safety
    ///
    /// The returned pointer is valid only while the memory region exists.
    /// Dereferencing requires unsafe code.
    fn addr(&self, offset: usize) -> *mut u8;

    /// Returns a mutable pointer to the start of the memory region.
    fn ptr(&self) -> *mut u8;

    /// Returns the total length of the memory region in bytes.
    fn len(&self) -> usize;
}

/// Reads [`READ_WIDTH`] bytes at `ptr` and decodes them as a big-endian `u32`.
///
/// The load is volatile, so it is neither removed nor merged with neighbouring loads.
/// No alignment is required.
///
/// # Safety
///
/// `ptr..ptr + READ_WIDTH` must be readable.
#[inline(always)]
pub unsafe fn read_u32_volatile(ptr: *const u8) -> u32 {
    let bytes = unsafe { std::ptr::read_volatile(ptr as *const [u8; READ_WIDTH]) };
    u32::from_be_bytes(bytes)
}
