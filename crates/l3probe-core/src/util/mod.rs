//! Utility functions and types used throughout l3probe.
//!
//! This module provides various helper types and functions including:
//! - [`Size`] - Memory size representation
//! - Constants for memory operations ([`PAGE_SIZE`], [`CL_SIZE`], etc.) and run defaults
//! - Anonymous memory mapping helpers ([`mmap`], [`munmap`])
//! - Progress reporting utilities ([`NamedProgress`])

mod alloc_util;
mod constants;
mod named_progress;
mod size;

pub use self::alloc_util::*;
pub use self::constants::*;
pub use self::named_progress::NamedProgress;
pub use self::size::Size;
