use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

use crate::util::{
    DEFAULT_BUFFER_SIZE, DEFAULT_PROBE_OFFSET, DEFAULT_ROUNDS, DEFAULT_STRIDE, READ_WIDTH,
};

/// Errors that can occur when loading a [`ProbeConfig`] file.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

/// Configuration parameters for a probe run.
///
/// Missing fields in a config file fall back to their [`Default`] values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Number of measurement rounds
    pub rounds: u64,
    /// Size of the eviction buffer and of the probe buffer in bytes
    pub buffer_size: usize,
    /// Distance between two reads of the eviction sweep in bytes
    pub stride: usize,
    /// Offset of the probed value inside the probe buffer
    pub probe_offset: usize,
    /// Record the raw timings of every round
    pub keep_samples: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            stride: DEFAULT_STRIDE,
            probe_offset: DEFAULT_PROBE_OFFSET,
            keep_samples: false,
        }
    }
}

impl ProbeConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a valid config.
    pub fn from_jsonfile<P: AsRef<Path>>(filepath: P) -> Result<Self, ConfigError> {
        let file = File::open(filepath)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Checks that a prober can be built from this config.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.rounds == 0 {
            return Err("rounds must be greater than 0".into());
        }
        if self.stride == 0 {
            return Err("stride must be greater than 0".into());
        }
        if self.buffer_size < READ_WIDTH {
            return Err(format!(
                "buffer size ({}) must be at least {} bytes",
                self.buffer_size, READ_WIDTH
            ));
        }
        if self
            .probe_offset
            .checked_add(READ_WIDTH)
            .is_none_or(|end| end > self.buffer_size)
        {
            return Err(format!(
                "probe offset ({}) plus {} bytes exceeds buffer size ({})",
                self.probe_offset, READ_WIDTH, self.buffer_size
            ));
        }
        Ok(())
    }
}
