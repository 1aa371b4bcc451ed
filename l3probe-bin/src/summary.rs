use l3probe_core::{ExperimentData, ProbeResult};
use serde::Serialize;

/// Aggregate over the reports of several repetitions.
#[derive(Debug, Serialize)]
pub struct Summary {
    /// Number of reports
    pub repetitions: usize,
    /// Reports whose evicted reads were slower than their cached reads
    pub ordered: usize,
    /// Mean of every average over all reports
    pub mean: ProbeResult,
}

impl Summary {
    /// Summarizes `reports`. Returns `None` for an empty slice.
    pub fn from_reports(reports: &[ExperimentData]) -> Option<Self> {
        if reports.is_empty() {
            return None;
        }
        let n = reports.len() as f64;
        let mean = |f: fn(&ProbeResult) -> f64| reports.iter().map(|r| f(&r.result)).sum::<f64>() / n;
        Some(Summary {
            repetitions: reports.len(),
            ordered: reports.iter().filter(|r| r.result.is_ordered()).count(),
            mean: ProbeResult {
                flushed_average: mean(|r| r.flushed_average),
                unflushed_average: mean(|r| r.unflushed_average),
                flushed_control_average: mean(|r| r.flushed_control_average),
                unflushed_control_average: mean(|r| r.unflushed_control_average),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Summary;
    use l3probe_core::{AccessCounters, ExperimentData, ProbeConfig, ProbeResult};

    fn report(flushed: f64, unflushed: f64) -> ExperimentData {
        ExperimentData {
            date: String::new(),
            timer: "test".into(),
            config: ProbeConfig::default(),
            result: ProbeResult {
                flushed_average: flushed,
                unflushed_average: unflushed,
                flushed_control_average: flushed,
                unflushed_control_average: unflushed,
            },
            accesses: AccessCounters::default(),
            samples: None,
        }
    }

    #[test]
    fn test_summary_empty() {
        assert!(Summary::from_reports(&[]).is_none());
    }

    #[test]
    fn test_summary_mean_and_ordered() {
        let reports = vec![report(100.0, 20.0), report(10.0, 40.0)];
        let summary = Summary::from_reports(&reports).expect("summary");
        assert_eq!(summary.repetitions, 2);
        assert_eq!(summary.ordered, 1);
        assert_eq!(summary.mean.flushed_average, 55.0);
        assert_eq!(summary.mean.unflushed_control_average, 30.0);
    }
}
