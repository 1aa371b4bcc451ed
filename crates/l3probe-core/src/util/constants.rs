use super::Size;

/// Page shift value (12 bits) for 4KB pages
pub const PAGE_SHIFT: usize = 12;
/// Standard page size (4096 bytes)
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

/// Cache line size (64 bytes) for x86_64
pub const CL_SIZE: usize = 64;

/// Width of a single eviction or probe read in bytes
pub const READ_WIDTH: usize = 4;

/// The eviction sweep leaves out the last `len / SWEEP_TAIL_DIVISOR` bytes of the buffer
pub const SWEEP_TAIL_DIVISOR: usize = 1024;

/// Byte written to every page of a freshly mapped buffer
pub const FILL_BYTE: u8 = 0x11;

/// Default number of measurement rounds
pub const DEFAULT_ROUNDS: u64 = 1000;
/// Default size of both the eviction and the probe buffer (8 MB)
pub const DEFAULT_BUFFER_SIZE: usize = Size::KB(8192).bytes();
/// Default stride of the eviction sweep
pub const DEFAULT_STRIDE: usize = CL_SIZE;
/// Default offset of the probed value inside the probe buffer
pub const DEFAULT_PROBE_OFFSET: usize = 4;
