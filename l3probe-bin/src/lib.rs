//! Support code for the `probe` binary.
//!
//! - `timer`: Selects and constructs a [`l3probe_core::timer::DurationTimer`] by name.
//! - `summary`: Aggregates the reports of several repetitions.
pub mod summary;
pub mod timer;

use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

pub fn init_logging_with_progress() -> anyhow::Result<MultiProgress> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let progress = MultiProgress::new();
    LogWrapper::new(progress.clone(), logger).try_init()?;
    Ok(progress)
}
