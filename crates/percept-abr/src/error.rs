use thiserror::Error;

use percept_core::{SolverConfigError, SolverError};

#[derive(Debug, Error)]
/// Error type for stream loading, configuration, environment construction and training.
pub enum AbrError {
    #[error("failed to read YAML file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid rule config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    SolverConfig(#[from] SolverConfigError),

    #[error("stream has no quality levels")]
    NoQualityLevels,

    #[error("representation {index} has invalid bitrate {bitrate_kbps} kbps")]
    InvalidBitrate { index: usize, bitrate_kbps: f64 },

    #[error("fragment duration must be finite and positive, got {0}")]
    InvalidFragmentDuration(f64),

    #[error("initial quality {quality} is outside the {levels} available levels")]
    InvalidQuality { quality: usize, levels: usize },

    #[error("no usable bandwidth estimate for training")]
    MissingBandwidth,

    #[error("no usable buffer level for training")]
    MissingBuffer,

    #[error("window starting at segment {start} lies past the last of {segment_count} segments")]
    WindowOutOfRange { start: usize, segment_count: usize },

    #[error("{quality_levels} quality levels over a lookahead of {lookahead} exceed the state budget of {max_states}")]
    StateSpaceTooLarge {
        quality_levels: usize,
        lookahead: usize,
        max_states: usize,
    },

    #[error("solver failed: {0}")]
    Solver(#[from] SolverError),
}
