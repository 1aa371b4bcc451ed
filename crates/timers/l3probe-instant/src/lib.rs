//! Portable timer for l3probe.
//!
//! This crate provides a timer built on [`std::time::Instant`]. It works on every platform
//! the standard library supports, at the resolution of the platform's monotonic clock
//! (`CLOCK_MONOTONIC` on Linux).
//!
//! Implements the [`l3probe_core::timer::DurationTimer`] trait.

#![warn(missing_docs)]

mod instant;

pub use instant::InstantTimer;
