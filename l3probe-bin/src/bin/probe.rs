use std::{
    fs::File,
    io::{BufWriter, Write},
    time::Instant,
};

use anyhow::{Context, Result};
use clap::Parser;
use l3probe_bin::summary::Summary;
use l3probe_bin::timer::{TimerKind, construct_timer};
use l3probe_bin::init_logging_with_progress;
use l3probe_core::{CacheProber, ExperimentData, ProbeConfig};
use log::{info, warn};
use serde::Serialize;

/// CLI arguments for the `probe` binary.
///
/// Values given on the command line override the values of the `--config` file,
/// which in turn override the built-in defaults.
#[derive(Debug, Parser, Serialize, Clone)]
struct CliArgs {
    /// JSON file with a probe configuration.
    #[clap(long = "config")]
    config: Option<String>,
    /// The number of measurement rounds.
    #[clap(long = "rounds")]
    rounds: Option<u64>,
    /// The size of the eviction and probe buffers in KB.
    #[clap(long = "size")]
    size_kb: Option<usize>,
    /// The stride of the eviction sweep in bytes.
    #[clap(long = "stride")]
    stride: Option<usize>,
    /// The offset of the probed word in bytes.
    #[clap(long = "offset")]
    offset: Option<usize>,
    /// The timer to use.
    #[clap(long = "timer", value_enum, default_value = "instant")]
    timer: TimerKind,
    /// Repeat the measurement this many times, each with fresh buffers.
    #[clap(
        long = "repeat",
        default_value = "1",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    repeat: usize,
    /// Record the raw timings of every round.
    #[clap(long = "samples")]
    samples: bool,
    /// Output file for results (JSON format).
    #[clap(long = "output")]
    output: Option<String>,
    /// Show a progress bar over the rounds.
    #[clap(long = "progress")]
    progress: bool,
}

impl CliArgs {
    fn probe_config(&self) -> Result<ProbeConfig> {
        let mut config = match &self.config {
            Some(path) => ProbeConfig::from_jsonfile(path)?,
            None => ProbeConfig::default(),
        };
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if let Some(size_kb) = self.size_kb {
            config.buffer_size = size_kb
                .checked_mul(1024)
                .with_context(|| format!("buffer size of {} KB overflows usize", size_kb))?;
        }
        if let Some(stride) = self.stride {
            config.stride = stride;
        }
        if let Some(offset) = self.offset {
            config.probe_offset = offset;
        }
        config.keep_samples |= self.samples;
        Ok(config)
    }
}

fn save_to_file(filename: &str, reports: &[ExperimentData]) -> Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);
    if let [report] = reports {
        serde_json::to_writer_pretty(&mut writer, report)?;
    } else {
        serde_json::to_writer_pretty(&mut writer, reports)?;
    }
    writer.flush()?;
    info!("Results saved to {}", filename);
    Ok(())
}

fn main() -> Result<()> {
    let progress = init_logging_with_progress()?;

    let args = CliArgs::parse();
    info!("CLI args: {:?}", args);

    let config = args.probe_config()?;
    info!("Probe config: {:?}", config);

    let start_time = Instant::now();
    let mut reports = Vec::with_capacity(args.repeat);

    for rep in 1..=args.repeat {
        info!("Starting repetition {}/{}", rep, args.repeat);
        let mut builder = CacheProber::builder()
            .timer(construct_timer(args.timer)?)
            .config(config.clone());
        if args.progress {
            builder = builder.progress(progress.clone());
        }
        let mut prober = builder.build()?;
        let report = prober.run();
        info!("{}", serde_json::to_string(&report.result)?);
        let deviation = report.result.control_deviation();
        if deviation.cold > 0.5 || deviation.warm > 0.5 {
            warn!(
                "Control reads deviate from primary reads: cold {:.1}%, warm {:.1}%",
                deviation.cold * 100.0,
                deviation.warm * 100.0
            );
        }
        reports.push(report);
    }

    if let Some(output_file) = &args.output {
        save_to_file(output_file, &reports)?;
    }

    if let Some(summary) = Summary::from_reports(&reports) {
        if summary.repetitions > 1 {
            info!("=== PROBE SUMMARY ===");
            info!("Repetitions: {}", summary.repetitions);
            info!(
                "Evicted reads slower than cached reads: {}/{}",
                summary.ordered, summary.repetitions
            );
            info!("Mean averages: {}", serde_json::to_string(&summary.mean)?);
        }
    }
    info!(
        "Total probe time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn test_size_flag_in_kb() -> anyhow::Result<()> {
        let args = CliArgs::try_parse_from(["probe", "--size", "64", "--offset", "8"])?;
        let config = args.probe_config()?;
        assert_eq!(config.buffer_size, 64 * 1024);
        assert_eq!(config.probe_offset, 8);
        assert_eq!(args.repeat, 1);
        Ok(())
    }

    #[test]
    fn test_oversized_size_flag_is_an_error() -> anyhow::Result<()> {
        let size = (usize::MAX / 512).to_string();
        let args = CliArgs::try_parse_from(["probe", "--size", size.as_str()])?;
        assert!(args.probe_config().is_err());
        Ok(())
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        assert!(CliArgs::try_parse_from(["probe", "--repeat", "0"]).is_err());
        assert!(CliArgs::try_parse_from(["probe", "--repeat", "2"]).is_ok());
    }
}
