use std::hint::black_box;

use crate::memory::{BytePointer, Memory, MemoryError, read_u32_volatile};
use crate::util::{READ_WIDTH, SWEEP_TAIL_DIVISOR, Size};
use log::debug;

/// Buffer that displaces the probe line from the cache hierarchy.
///
/// A sweep reads one 32-bit word every `stride` bytes, in ascending order, over the
/// first `len - len / 1024` bytes of the buffer.
#[derive(Debug)]
pub struct EvictionBuffer {
    memory: Memory,
    stride: usize,
    reads: usize,
}

impl EvictionBuffer {
    /// Maps an eviction buffer of `len` bytes swept with the given stride.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer cannot be mapped.
    ///
    /// # Panics
    ///
    /// Panics if `stride` is zero.
    pub fn new(len: usize, stride: usize) -> Result<Self, MemoryError> {
        assert!(stride > 0, "eviction stride must be greater than 0");
        let memory = Memory::mmap(len)?;
        let reads = Self::sweep_reads(len, stride);
        debug!(
            "Eviction buffer: {} swept every {} bytes ({} reads)",
            Size::from_bytes(len),
            stride,
            reads
        );
        Ok(EvictionBuffer {
            memory,
            stride,
            reads,
        })
    }

    /// Number of reads one sweep performs over a buffer of `len` bytes.
    ///
    /// Floor division keeps every read inside the sweep extent, and the result is
    /// further bounded so that the last [`READ_WIDTH`]-byte read ends inside the buffer.
    ///
    /// ```
    /// use l3probe_core::EvictionBuffer;
    ///
    /// assert_eq!(EvictionBuffer::sweep_reads(8192 * 1024, 64), 8192 * 1023 / 64);
    /// assert_eq!(EvictionBuffer::sweep_reads(3, 1), 0);
    /// ```
    pub const fn sweep_reads(len: usize, stride: usize) -> usize {
        if stride == 0 || len < READ_WIDTH {
            return 0;
        }
        let extent = len - len / SWEEP_TAIL_DIVISOR;
        let in_extent = extent / stride;
        let in_bounds = (len - READ_WIDTH) / stride + 1;
        if in_extent < in_bounds {
            in_extent
        } else {
            in_bounds
        }
    }

    /// Reads every stride of the sweep extent once.
    ///
    /// Returns the wrapping sum of all words read.
    #[inline(never)]
    pub fn sweep(&self) -> u32 {
        let base = self.memory.ptr() as *const u8;
        let mut sink = 0u32;
        for i in 0..self.reads {
            // i * stride + READ_WIDTH <= len, see sweep_reads
            let word = unsafe { read_u32_volatile(base.add(i * self.stride)) };
            sink = sink.wrapping_add(word);
        }
        black_box(sink)
    }

    /// Reads per sweep.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Sweep stride in bytes.
    pub fn stride(&self) -> usize {
        self.stride
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
