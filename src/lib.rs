//! # l3probe
//!
//! l3probe is a micro-benchmark that demonstrates cache-timing side effects. It evicts a
//! probe word from the cache hierarchy by sweeping a large buffer, then times two
//! consecutive reads of that word and expects the first one to be slower. Two control
//! reads in the opposite order validate that the difference is not an artifact of the
//! measurement order.
//!
//! ## Quickstart guide
//!
//! ```sh
//! cargo run --release --bin=probe -- --rounds 1000 --timer tsc
//! ```
//!
//! ## Modules
//!
//! - `memory`: Anonymous memory mappings and volatile reads.
//! - `timer`: The `DurationTimer` trait and the `Stopwatch`.
//! - `util`: Sizes, constants and progress helpers.
//!
//! ## Features
//!
//! - `instant` (default): re-export the portable `Instant` timer as [`instant`].
//! - `tsc`: re-export the x86_64 time stamp counter timer as [`tsc`].

pub use l3probe_core::*;

#[cfg(feature = "instant")]
pub use l3probe_instant as instant;
#[cfg(feature = "tsc")]
pub use l3probe_tsc as tsc;
