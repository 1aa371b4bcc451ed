use std::ptr::null_mut;

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_POPULATE, MAP_PRIVATE, PROT_READ, PROT_WRITE};
use log::trace;

/// Maps `len` bytes of anonymous private memory and fills it with `fill`.
///
/// Every page is written once so that it is backed by its own physical frame.
/// Untouched anonymous pages all map to the kernel's shared zero page.
///
/// # Errors
///
/// Returns the OS error if `mmap` fails.
pub fn mmap(len: usize, fill: u8) -> std::io::Result<*mut u8> {
    let v = unsafe {
        libc::mmap(
            null_mut(),
            len,
            PROT_READ | PROT_WRITE,
            MAP_PRIVATE | MAP_ANONYMOUS | MAP_POPULATE,
            -1,
            0,
        )
    };
    if v == MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    unsafe { libc::memset(v, fill as libc::c_int, len) };
    trace!("mapped {} bytes at {:p}", len, v);
    Ok(v as *mut u8)
}

/// Unmap memory
///
/// # Safety
/// * `addr` must be a valid pointer to a memory region previously allocated by [`mmap`]
/// * `len` must be less than or equal the length as the memory region previously allocated by [`mmap`]
pub unsafe fn munmap<P>(addr: *mut P, len: usize) {
    let r = unsafe { libc::munmap(addr as *mut libc::c_void, len) };
    assert_eq!(
        r,
        0,
        "munmap({:x}, {}): {}",
        addr as usize,
        len,
        std::io::Error::last_os_error()
    );
}
