use crate::config::{ConfigError, ProbeConfig};
use crate::eviction::EvictionBuffer;
use crate::memory::MemoryError;
use crate::probe::ProbeBuffer;
use crate::results::{AccessCounters, ExperimentData, RoundTimings, TimingTotals};
use crate::timer::{DurationTimer, Stopwatch};
use crate::util::{NamedProgress, Size};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, trace, warn};
use std::hint::black_box;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on the samples reserved up front, longer runs grow the vector
const MAX_RESERVED_SAMPLES: usize = 1 << 16;

/// Cache-timing prober.
///
/// The `CacheProber` owns an eviction buffer, a probe buffer and a timer. Every
/// round it
///
/// 1. sweeps the eviction buffer,
/// 2. times a read of the probed word (cold),
/// 3. times the same read again (warm),
/// 4. times a third read as warm control,
/// 5. sweeps the eviction buffer again,
/// 6. times a fourth read as cold control.
///
/// [`run()`](CacheProber::run) repeats this for the configured number of rounds and
/// averages the four timings.
///
/// # Examples
///
/// Use [`CacheProber::builder()`] to construct a `CacheProber` instance.
pub struct CacheProber {
    eviction: EvictionBuffer,
    probe: ProbeBuffer,
    timer: Box<dyn DurationTimer>,
    progress: Option<MultiProgress>,
    config: ProbeConfig,
    counters: AccessCounters,
    sink: u32,
}

impl CacheProber {
    /// Creates a new CacheProber builder.
    pub fn builder() -> CacheProberBuilder {
        CacheProberBuilder::default()
    }

    /// Runs a single measurement round.
    pub fn round(&mut self) -> RoundTimings {
        let timer = self.timer.as_ref();
        let mut sink = self.eviction.sweep();

        let watch = Stopwatch::start(timer);
        sink = sink.wrapping_add(self.probe.probe());
        let first = watch.elapsed_nanos();

        let watch = Stopwatch::start(timer);
        sink = sink.wrapping_add(self.probe.probe());
        let second = watch.elapsed_nanos();

        let watch = Stopwatch::start(timer);
        sink = sink.wrapping_add(self.probe.probe());
        let third = watch.elapsed_nanos();

        sink = sink.wrapping_add(self.eviction.sweep());

        let watch = Stopwatch::start(timer);
        sink = sink.wrapping_add(self.probe.probe());
        let fourth = watch.elapsed_nanos();

        self.sink = black_box(self.sink.wrapping_add(sink));
        self.counters.sweeps += 2;
        self.counters.eviction_reads += 2 * self.eviction.reads() as u64;
        self.counters.probe_reads += 4;

        RoundTimings {
            first,
            second,
            third,
            fourth,
        }
    }

    /// Runs all configured rounds.
    ///
    /// Returns the averaged timings together with the access counters of this run.
    pub fn run(&mut self) -> ExperimentData {
        let rounds = self.config.rounds;
        self.counters = AccessCounters::default();
        let mut totals = TimingTotals::default();
        let mut samples = self
            .config
            .keep_samples
            .then(|| Vec::with_capacity(reserved_samples(rounds)));

        let p = self.progress.as_ref().map(|p| {
            let p = p.add(ProgressBar::new(rounds));
            p.set_style(ProgressStyle::named_bar("Probe rounds"));
            p.enable_steady_tick(Duration::from_secs(1));
            p
        });

        info!(
            "Probing {:p} for {} rounds with timer {}",
            self.probe.target(),
            rounds,
            self.timer.name()
        );
        for r in 1..=rounds {
            let timings = self.round();
            debug!("Round {}: {:?}", r, timings);
            totals.add(&timings);
            if let Some(samples) = samples.as_mut() {
                samples.push(timings);
            }
            if let Some(p) = p.as_ref() {
                p.set_position(r);
            }
        }
        if let Some(p) = p {
            p.finish_and_clear();
        }
        trace!("sink: {:#010x}", self.sink);

        let result = totals.average(rounds);
        if !result.is_ordered() {
            warn!("Evicted reads were not slower than cached reads: {:?}", result);
        }
        info!("Probe result: {:?}", result);
        ExperimentData::new(
            self.timer.name(),
            self.config.clone(),
            result,
            self.counters,
            samples,
        )
    }

    /// Access counters of the current run.
    pub fn counters(&self) -> AccessCounters {
        self.counters
    }

    /// The eviction buffer.
    pub fn eviction(&self) -> &EvictionBuffer {
        &self.eviction
    }

    /// The probe buffer.
    pub fn probe(&self) -> &ProbeBuffer {
        &self.probe
    }

    /// The configuration this prober was built with.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }
}

fn reserved_samples(rounds: u64) -> usize {
    usize::try_from(rounds).map_or(MAX_RESERVED_SAMPLES, |r| r.min(MAX_RESERVED_SAMPLES))
}

/// Builder for [`CacheProber`].
#[derive(Default)]
pub struct CacheProberBuilder {
    timer: Option<Box<dyn DurationTimer>>,
    progress: Option<MultiProgress>,
    config: ProbeConfig,
    config_file: Option<PathBuf>,
}

impl CacheProberBuilder {
    /// Sets the timer used for all measurements.
    pub fn timer(mut self, timer: Box<dyn DurationTimer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Shows a progress bar over the rounds.
    pub fn progress(mut self, progress: MultiProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the run configuration.
    pub fn config(mut self, config: ProbeConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the run configuration from a JSON file when building.
    ///
    /// Takes precedence over [`config()`](Self::config).
    pub fn config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Validates the configuration and maps both buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded, no timer was set,
    /// the configuration is invalid, or a buffer cannot be mapped.
    pub fn build(self) -> Result<CacheProber, Error> {
        let config = match &self.config_file {
            Some(path) => {
                debug!("Loading probe config from {}", path.display());
                ProbeConfig::from_jsonfile(path)?
            }
            None => self.config,
        };
        config.validate().map_err(Error::InvalidConfig)?;
        let timer = self.timer.ok_or(Error::Timer)?;
        info!(
            "Allocating eviction and probe buffers of {} each",
            Size::from_bytes(config.buffer_size)
        );
        let eviction = EvictionBuffer::new(config.buffer_size, config.stride)?;
        let probe = ProbeBuffer::new(config.buffer_size, config.probe_offset)?;
        Ok(CacheProber {
            eviction,
            probe,
            timer,
            progress: self.progress,
            config,
            counters: AccessCounters::default(),
            sink: 0,
        })
    }
}

/// Errors that can occur while setting up a [`CacheProber`].
#[derive(Debug, Error)]
pub enum Error {
    /// No timer was passed to the builder
    #[error("No timer specified")]
    Timer,
    /// The configuration violates a constraint
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    /// The configuration file could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A buffer could not be mapped
    #[error("Buffer allocation failed: {0}")]
    Alloc(#[from] MemoryError),
}
