use serde::{Deserialize, Serialize};

use crate::AbrError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// One available quality level of the video adaptation set.
pub struct Representation {
    /// Nominal bitrate in kbps.
    pub bitrate_kbps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Content metadata of one media segment.
pub struct SegmentMeta {
    /// Perceptual importance class; higher is more important.
    pub saliency: u32,
    /// Shot (scene) identifier. Consecutive segments sharing it form one shot.
    pub shot: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Everything the rule needs to know about the stream it adapts.
pub struct StreamContext {
    /// Quality levels sorted by ascending bitrate; index = quality index.
    pub representations: Vec<Representation>,
    /// Nominal segment duration in seconds.
    pub fragment_duration: f64,
    /// Per-segment metadata indexed by absolute segment number.
    pub segments: Vec<SegmentMeta>,
}

impl StreamContext {
    /// Number of quality levels.
    pub fn quality_levels(&self) -> usize {
        self.representations.len()
    }

    /// Number of segments in the stream.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Bitrates in kbps, indexed by quality.
    pub fn bitrates(&self) -> Vec<f64> {
        self.representations.iter().map(|r| r.bitrate_kbps).collect()
    }

    /// Check the catalog: at least one level, positive ascending bitrates,
    /// positive fragment duration.
    pub fn validate(&self) -> Result<(), AbrError> {
        if self.representations.is_empty() {
            return Err(AbrError::NoQualityLevels);
        }

        let mut previous = 0.0;
        for (index, rep) in self.representations.iter().enumerate() {
            let bitrate = rep.bitrate_kbps;
            if !bitrate.is_finite() || bitrate <= 0.0 || bitrate < previous {
                return Err(AbrError::InvalidBitrate {
                    index,
                    bitrate_kbps: bitrate,
                });
            }
            previous = bitrate;
        }

        if !self.fragment_duration.is_finite() || self.fragment_duration <= 0.0 {
            return Err(AbrError::InvalidFragmentDuration(self.fragment_duration));
        }
        Ok(())
    }
}
