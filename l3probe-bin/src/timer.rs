//! Timer selection for the `probe` binary.
//!
//! To add a new timer, implement the `DurationTimer` trait in a new crate and add a new
//! variant to the `TimerKind` enum.

use clap::ValueEnum;
use l3probe_core::timer::DurationTimer;
use l3probe_instant::InstantTimer;
use l3probe_tsc::TscTimer;
use serde::Serialize;

/// Available timer implementations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// `std::time::Instant`, nanosecond ticks
    Instant,
    /// x86_64 time stamp counter via `rdtscp`
    Tsc,
}

/// Construct the timer selected by `kind`.
///
/// # Errors
///
/// Returns an error if the timer is not supported on this machine.
pub fn construct_timer(kind: TimerKind) -> anyhow::Result<Box<dyn DurationTimer>> {
    let timer: Box<dyn DurationTimer> = match kind {
        TimerKind::Instant => Box::new(InstantTimer::new()),
        TimerKind::Tsc => Box::new(TscTimer::new()?),
    };
    Ok(timer)
}

#[cfg(test)]
mod tests {
    use super::{TimerKind, construct_timer};

    #[test]
    fn test_construct_instant() -> anyhow::Result<()> {
        let timer = construct_timer(TimerKind::Instant)?;
        assert_eq!(timer.name(), "instant");
        assert_eq!(timer.tick_nanos(), 1.0);
        Ok(())
    }
}
