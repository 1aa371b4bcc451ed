use serde::{Deserialize, Serialize};

use crate::config::ProbeConfig;

/// Raw timings of a single round in nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundTimings {
    /// First read after the eviction sweep
    pub first: f64,
    /// Read immediately following `first`
    pub second: f64,
    /// Control read following `second`
    pub third: f64,
    /// Control read after the second eviction sweep
    pub fourth: f64,
}

/// Averaged timings of a probe run in nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    /// Average of the first read after eviction
    pub flushed_average: f64,
    /// Average of the read right after `flushed`
    pub unflushed_average: f64,
    /// Average of the read after the control eviction
    pub flushed_control_average: f64,
    /// Average of the cached control read
    pub unflushed_control_average: f64,
}

/// Relative differences between the primary and the control measurements.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ControlDeviation {
    /// `|flushed - flushed_control| / max(flushed, flushed_control)`
    pub cold: f64,
    /// `|unflushed - unflushed_control| / max(unflushed, unflushed_control)`
    pub warm: f64,
}

impl ProbeResult {
    /// Whether both evicted reads were at least as slow as their cached counterparts.
    pub fn is_ordered(&self) -> bool {
        self.flushed_average >= self.unflushed_average
            && self.flushed_control_average >= self.unflushed_control_average
    }

    /// How closely the control pair reproduces the primary pair.
    pub fn control_deviation(&self) -> ControlDeviation {
        ControlDeviation {
            cold: relative_difference(self.flushed_average, self.flushed_control_average),
            warm: relative_difference(self.unflushed_average, self.unflushed_control_average),
        }
    }

    /// All four averages are finite and non-negative.
    pub fn is_well_formed(&self) -> bool {
        [
            self.flushed_average,
            self.unflushed_average,
            self.flushed_control_average,
            self.unflushed_control_average,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }
}

fn relative_difference(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max <= 0.0 { 0.0 } else { (a - b).abs() / max }
}

/// Running sums of a probe run.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TimingTotals {
    flushed: f64,
    unflushed: f64,
    flushed_control: f64,
    unflushed_control: f64,
}

impl TimingTotals {
    pub(crate) fn add(&mut self, round: &RoundTimings) {
        self.flushed += round.first;
        self.unflushed += round.second;
        self.flushed_control += round.fourth;
        self.unflushed_control += round.third;
    }

    pub(crate) fn average(&self, rounds: u64) -> ProbeResult {
        if rounds == 0 {
            return ProbeResult::default();
        }
        let rounds = rounds as f64;
        ProbeResult {
            flushed_average: self.flushed / rounds,
            unflushed_average: self.unflushed / rounds,
            flushed_control_average: self.flushed_control / rounds,
            unflushed_control_average: self.unflushed_control / rounds,
        }
    }
}

/// Memory accesses performed by a probe run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCounters {
    /// Completed eviction sweeps
    pub sweeps: u64,
    /// Words read by all eviction sweeps
    pub eviction_reads: u64,
    /// Reads of the probed word
    pub probe_reads: u64,
}

/// Report of a complete probe run.
#[derive(Clone, Debug, Serialize)]
pub struct ExperimentData {
    /// ISO 8601 timestamp of when the run finished
    pub date: String,
    /// Name of the timer used for the measurements
    pub timer: String,
    /// Configuration of the run
    pub config: ProbeConfig,
    /// Averaged timings
    pub result: ProbeResult,
    /// Memory accesses performed
    pub accesses: AccessCounters,
    /// Raw timings of every round, if requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<RoundTimings>>,
}

impl ExperimentData {
    pub(crate) fn new(
        timer: &str,
        config: ProbeConfig,
        result: ProbeResult,
        accesses: AccessCounters,
        samples: Option<Vec<RoundTimings>>,
    ) -> Self {
        Self {
            date: chrono::Local::now().to_rfc3339(),
            timer: timer.to_string(),
            config,
            result,
            accesses,
            samples,
        }
    }
}
