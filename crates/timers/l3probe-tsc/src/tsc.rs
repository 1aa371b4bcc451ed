use l3probe_core::timer::{DurationTimer, TimerError};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Length of one calibration window
const CALIBRATION_WINDOW: Duration = Duration::from_millis(10);
/// Number of calibration windows, the median tick period is used
const CALIBRATION_ROUNDS: usize = 5;

/// Timer reading the time stamp counter.
pub struct TscTimer {
    tick_nanos: f64,
}

impl TscTimer {
    /// Creates a new timer and calibrates its tick period.
    ///
    /// Logs a warning if the CPU does not advertise an invariant TSC, in which case
    /// the tick period may change with the core frequency.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Unsupported`] if the CPU does not implement `rdtscp` and
    /// [`TimerError::Calibration`] if the counter does not advance.
    pub fn new() -> Result<Self, TimerError> {
        if !has_rdtscp() {
            return Err(TimerError::Unsupported("CPU does not support rdtscp"));
        }
        if !has_invariant_tsc() {
            warn!("TSC is not invariant, timings may depend on the core frequency");
        }
        let tick_nanos = calibrate()?;
        info!(
            "Calibrated TSC: {:.4} ns per tick ({:.3} GHz)",
            tick_nanos,
            1.0 / tick_nanos
        );
        Ok(TscTimer { tick_nanos })
    }

    /// Creates a timer with a known tick period, skipping calibration.
    #[cfg(target_arch = "x86_64")]
    pub fn with_tick_nanos(tick_nanos: f64) -> Self {
        TscTimer { tick_nanos }
    }
}

impl DurationTimer for TscTimer {
    fn name(&self) -> &'static str {
        "tsc"
    }

    #[inline(always)]
    fn now(&self) -> u64 {
        rdtscp_fenced()
    }

    fn tick_nanos(&self) -> f64 {
        self.tick_nanos
    }
}

fn calibrate() -> Result<f64, TimerError> {
    let mut periods = Vec::with_capacity(CALIBRATION_ROUNDS);
    for _ in 0..CALIBRATION_ROUNDS {
        let start = Instant::now();
        let start_tsc = rdtscp_fenced();
        while start.elapsed() < CALIBRATION_WINDOW {
            std::hint::spin_loop();
        }
        let end_tsc = rdtscp_fenced();
        let elapsed = start.elapsed();
        let ticks = end_tsc
            .checked_sub(start_tsc)
            .filter(|&ticks| ticks > 0)
            .ok_or_else(|| {
                TimerError::Calibration(format!(
                    "TSC did not advance ({} -> {})",
                    start_tsc, end_tsc
                ))
            })?;
        let period = elapsed.as_nanos() as f64 / ticks as f64;
        debug!("Calibration window: {} ticks in {:?}", ticks, elapsed);
        periods.push(period);
    }
    periods.sort_by(f64::total_cmp);
    Ok(periods[periods.len() / 2])
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn rdtscp_fenced() -> u64 {
    use std::arch::x86_64::{__rdtscp, _mm_lfence, _mm_mfence};
    unsafe {
        let mut aux = 0;
        _mm_mfence();
        let time = __rdtscp(&mut aux);
        _mm_lfence();
        time
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn rdtscp_fenced() -> u64 {
    unreachable!("TscTimer is never constructed on this architecture")
}

#[cfg(target_arch = "x86_64")]
#[allow(unused_unsafe)]
fn max_extended_leaf() -> u32 {
    use std::arch::x86_64::__cpuid;
    unsafe { __cpuid(0x8000_0000) }.eax
}

#[cfg(target_arch = "x86_64")]
#[allow(unused_unsafe)]
fn has_rdtscp() -> bool {
    use std::arch::x86_64::__cpuid;
    max_extended_leaf() >= 0x8000_0001 && unsafe { __cpuid(0x8000_0001) }.edx & (1 << 27) != 0
}

#[cfg(target_arch = "x86_64")]
#[allow(unused_unsafe)]
fn has_invariant_tsc() -> bool {
    use std::arch::x86_64::__cpuid;
    max_extended_leaf() >= 0x8000_0007 && unsafe { __cpuid(0x8000_0007) }.edx & (1 << 8) != 0
}

#[cfg(not(target_arch = "x86_64"))]
fn has_rdtscp() -> bool {
    false
}

#[cfg(not(target_arch = "x86_64"))]
fn has_invariant_tsc() -> bool {
    false
}

#[cfg(all(test, target_arch = "x86_64"))]
mod tests {
    use super::TscTimer;
    use l3probe_core::timer::{DurationTimer, Stopwatch};
    use std::time::Duration;

    #[test]
    fn test_with_tick_nanos() {
        let timer = TscTimer::with_tick_nanos(0.5);
        assert_eq!(timer.tick_nanos(), 0.5);
        assert_eq!(timer.name(), "tsc");
        let a = timer.now();
        let b = timer.now();
        assert!(b >= a);
    }

    #[test]
    #[ignore]
    fn test_calibrated_sleep() -> Result<(), l3probe_core::timer::TimerError> {
        let timer = TscTimer::new()?;
        let watch = Stopwatch::start(&timer);
        std::thread::sleep(Duration::from_millis(20));
        let nanos = watch.elapsed_nanos();
        assert!(nanos > 15_000_000.0, "measured {} ns", nanos);
        assert!(nanos < 200_000_000.0, "measured {} ns", nanos);
        Ok(())
    }
}
