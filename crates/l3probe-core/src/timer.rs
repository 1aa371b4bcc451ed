//! Duration measurement.
//!
//! This module defines the [`DurationTimer`] trait that all timer implementations must implement
//! and the [`Stopwatch`] used by the prober to time single memory reads.

use thiserror::Error;

/// Errors that can occur while constructing a timer.
#[derive(Debug, Error)]
pub enum TimerError {
    /// The timer cannot be used on this platform or CPU.
    #[error("Timer not supported: {0}")]
    Unsupported(&'static str),
    /// The tick period could not be determined.
    #[error("Timer calibration failed: {0}")]
    Calibration(String),
}

/// Trait for monotonic, high-resolution timers.
///
/// A timer hands out raw tick values. Ticks are converted to nanoseconds with
/// [`tick_nanos()`](DurationTimer::tick_nanos), so implementations are free to count
/// cycles, nanoseconds, or anything else that increases monotonically.
///
/// # Required Methods
///
/// Implementors must provide:
/// * [`name()`](DurationTimer::name) - Identifies the timer in reports
/// * [`now()`](DurationTimer::now) - Reads the current tick value
/// * [`tick_nanos()`](DurationTimer::tick_nanos) - Length of one tick in nanoseconds
///
/// # Examples
///
/// See the timer implementations in `l3probe-instant` and `l3probe-tsc`.
pub trait DurationTimer {
    /// Short name of the timer, e.g. `"tsc"`.
    fn name(&self) -> &'static str;

    /// Reads the current tick value.
    ///
    /// Implementations must order the read against surrounding memory accesses,
    /// i.e. loads issued before `now()` complete before the tick is taken and loads
    /// issued after `now()` do not start before it.
    fn now(&self) -> u64;

    /// Length of one tick in nanoseconds.
    fn tick_nanos(&self) -> f64;
}

/// A running measurement started from a [`DurationTimer`].
///
/// # Examples
///
/// ```
/// use l3probe_core::timer::{DurationTimer, Stopwatch};
///
/// struct Fixed;
/// impl DurationTimer for Fixed {
///     fn name(&self) -> &'static str { "fixed" }
///     fn now(&self) -> u64 { 42 }
///     fn tick_nanos(&self) -> f64 { 1.0 }
/// }
///
/// let watch = Stopwatch::start(&Fixed);
/// assert_eq!(watch.elapsed_nanos(), 0.0);
/// ```
pub struct Stopwatch<'a> {
    timer: &'a dyn DurationTimer,
    start: u64,
}

impl<'a> Stopwatch<'a> {
    /// Takes the reference time.
    #[inline(always)]
    pub fn start(timer: &'a dyn DurationTimer) -> Self {
        let start = timer.now();
        Stopwatch { timer, start }
    }

    /// Elapsed ticks since [`start()`](Stopwatch::start).
    ///
    /// Saturates at zero if the timer went backwards.
    #[inline(always)]
    pub fn elapsed_ticks(&self) -> u64 {
        self.timer.now().saturating_sub(self.start)
    }

    /// Elapsed time since [`start()`](Stopwatch::start) in nanoseconds.
    #[inline(always)]
    pub fn elapsed_nanos(&self) -> f64 {
        self.elapsed_ticks() as f64 * self.timer.tick_nanos()
    }
}

#[cfg(test)]
mod tests {
    use super::{DurationTimer, Stopwatch};
    use std::cell::Cell;

    struct Backwards {
        ticks: Cell<u64>,
    }

    impl DurationTimer for Backwards {
        fn name(&self) -> &'static str {
            "backwards"
        }
        fn now(&self) -> u64 {
            let t = self.ticks.get();
            self.ticks.set(t.saturating_sub(10));
            t
        }
        fn tick_nanos(&self) -> f64 {
            0.5
        }
    }

    #[test]
    fn test_stopwatch_saturates() {
        let timer = Backwards {
            ticks: Cell::new(100),
        };
        let watch = Stopwatch::start(&timer);
        assert_eq!(watch.elapsed_ticks(), 0);
    }

    #[test]
    fn test_stopwatch_scales_ticks() {
        struct Step(Cell<u64>);
        impl DurationTimer for Step {
            fn name(&self) -> &'static str {
                "step"
            }
            fn now(&self) -> u64 {
                let t = self.0.get();
                self.0.set(t + 8);
                t
            }
            fn tick_nanos(&self) -> f64 {
                0.25
            }
        }
        let timer = Step(Cell::new(0));
        let watch = Stopwatch::start(&timer);
        assert_eq!(watch.elapsed_nanos(), 2.0);
    }
}
