//! Time stamp counter timer for l3probe.
//!
//! This crate reads the x86_64 time stamp counter with `rdtscp`, fenced by `mfence`
//! before and `lfence` after, so that a timed load can neither start before the
//! start timestamp nor finish after the end timestamp. The tick period is calibrated
//! against the monotonic clock when the timer is constructed.
//!
//! Implements the [`l3probe_core::timer::DurationTimer`] trait.
//!
//! # Platform Support
//!
//! x86_64 only. On other architectures [`TscTimer::new`] returns
//! [`TimerError::Unsupported`](l3probe_core::timer::TimerError::Unsupported).

#![warn(missing_docs)]

mod tsc;

pub use tsc::TscTimer;
