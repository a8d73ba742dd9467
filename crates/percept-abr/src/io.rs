use std::{fs, path::Path};

use crate::{AbrError, StreamContext};

/// Load and validate a stream context from YAML on disk.
pub fn load_stream_yaml(path: impl AsRef<Path>) -> Result<StreamContext, AbrError> {
    let yaml = fs::read_to_string(path)?;
    let stream: StreamContext = serde_yaml::from_str(&yaml)?;
    stream.validate()?;
    Ok(stream)
}

/// Serialize and write a stream context to YAML.
pub fn save_stream_yaml(path: impl AsRef<Path>, stream: &StreamContext) -> Result<(), AbrError> {
    let yaml = serde_yaml::to_string(stream)?;
    fs::write(path, yaml)?;
    Ok(())
}
