//! # l3probe Core
//!
//! `l3probe-core` is the foundational library of l3probe, a micro-benchmark that makes
//! cache-timing side effects visible. It evicts a single word from the cache hierarchy by
//! sweeping a large buffer, then times consecutive reads of that word.
//!
//! ## Architecture Overview
//!
//! - [`timer::DurationTimer`] - Defines the interface for monotonic high-resolution timers.
//!   Implementations live in the timer crates (`l3probe-instant`, `l3probe-tsc`).
//!
//! - [`CacheProber`] - Owns the buffers and a timer and runs the measurement rounds.
//!
//! - [`EvictionBuffer`] and [`ProbeBuffer`] - The two memory regions the prober reads.
//!
//! - [`memory`] module - Anonymous memory mappings and non-elidable reads.
//!
//! - [`util`] module - [`util::Size`], constants and progress helpers.
//!
//! ## Platform Support
//!
//! Buffers are mapped with `mmap(MAP_POPULATE)`, which requires Linux.

#![warn(missing_docs)]

mod config;
mod eviction;
pub mod memory;
mod probe;
mod prober;
mod results;
pub mod timer;
pub mod util;

pub use config::{ConfigError, ProbeConfig};
pub use eviction::EvictionBuffer;
pub use probe::ProbeBuffer;
pub use prober::{CacheProber, CacheProberBuilder, Error};
pub use results::{AccessCounters, ControlDeviation, ExperimentData, ProbeResult, RoundTimings};
