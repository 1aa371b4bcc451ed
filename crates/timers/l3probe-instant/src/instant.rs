use l3probe_core::timer::DurationTimer;
use log::debug;
use std::sync::atomic::{Ordering, fence};
use std::time::Instant;

/// Monotonic timer counting nanoseconds since its construction.
pub struct InstantTimer {
    origin: Instant,
}

impl InstantTimer {
    /// Creates a new timer. Ticks start at zero.
    pub fn new() -> Self {
        debug!("Using Instant timer");
        InstantTimer {
            origin: Instant::now(),
        }
    }
}

impl Default for InstantTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationTimer for InstantTimer {
    fn name(&self) -> &'static str {
        "instant"
    }

    #[inline(always)]
    fn now(&self) -> u64 {
        fence(Ordering::SeqCst);
        let t = self.origin.elapsed().as_nanos() as u64;
        fence(Ordering::SeqCst);
        t
    }

    fn tick_nanos(&self) -> f64 {
        1.0
    }
}
