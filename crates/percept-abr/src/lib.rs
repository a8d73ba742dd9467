mod config;
mod content;
mod environment;
mod error;
mod io;
mod reward;
mod rule;
mod state;
mod stream;

pub use config::{BufferThresholds, RegimeWeights, RewardWeighting, RuleConfig, TermWeights};
pub use content::ContentTables;
pub use environment::{AbrEnvironment, WindowSpec};
pub use error::AbrError;
pub use io::{load_stream_yaml, save_stream_yaml};
pub use reward::RewardTerms;
pub use rule::{
    DEFAULT_QUALITY, MdpRule, TrainReport, TrainRequest, TrainedWindow, TrainingNotice,
    train_window,
};
pub use state::MdpState;
pub use stream::{Representation, SegmentMeta, StreamContext};

#[cfg(test)]
mod tests;
