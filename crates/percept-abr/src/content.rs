use crate::SegmentMeta;

#[derive(Debug, Clone, PartialEq)]
/// Per-segment saliency and shot tables for one training cycle.
///
/// Saliency classes are rescaled against the best quality the current
/// bandwidth can carry, so a saliency target never asks for more than the
/// network supports.
pub struct ContentTables {
    shot_persistence: Vec<u32>,
    saliency: Vec<u32>,
    saliency_delta: Vec<i64>,
    max_saliency: u32,
}

impl ContentTables {
    /// Build the tables from raw segment metadata.
    ///
    /// `bitrates` must be ascending (kbps); `bandwidth` is the current estimate
    /// in the same unit and `safety` the headroom factor applied to it.
    pub fn build(segments: &[SegmentMeta], bitrates: &[f64], bandwidth: f64, safety: f64) -> Self {
        let shot_persistence = shot_persistence(segments);
        let saliency = refine_saliency(segments, top_quality_index(bitrates, bandwidth * safety));

        let saliency_delta = saliency
            .iter()
            .enumerate()
            .map(|(i, &s)| match i {
                0 => 0,
                _ => i64::from(s) - i64::from(saliency[i - 1]),
            })
            .collect();
        let max_saliency = saliency.iter().copied().max().unwrap_or(1);

        ContentTables {
            shot_persistence,
            saliency,
            saliency_delta,
            max_saliency,
        }
    }

    pub fn len(&self) -> usize {
        self.saliency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saliency.is_empty()
    }

    /// Segments left in the shot of `segment`, itself included.
    /// A value of 1 marks the last segment before a shot boundary.
    pub fn shot_persistence(&self, segment: usize) -> Option<u32> {
        self.shot_persistence.get(segment).copied()
    }

    /// Rescaled saliency class of `segment`, at least 1.
    pub fn saliency(&self, segment: usize) -> Option<u32> {
        self.saliency.get(segment).copied()
    }

    /// Saliency change from the previous segment; 0 for the first one.
    pub fn saliency_delta(&self, segment: usize) -> Option<i64> {
        self.saliency_delta.get(segment).copied()
    }

    /// Largest rescaled saliency class of the stream.
    pub fn max_saliency(&self) -> u32 {
        self.max_saliency
    }
}

/// Count, for every segment, how many segments remain in its shot run.
fn shot_persistence(segments: &[SegmentMeta]) -> Vec<u32> {
    let mut counts = vec![0u32; segments.len()];
    let mut run = 0u32;
    for i in (0..segments.len()).rev() {
        let continues = segments
            .get(i + 1)
            .is_some_and(|next| next.shot == segments[i].shot);
        run = if continues { run + 1 } else { 1 };
        counts[i] = run;
    }
    counts
}

/// Highest quality index whose bitrate stays below `budget`; 0 when none does.
fn top_quality_index(bitrates: &[f64], budget: f64) -> usize {
    bitrates
        .iter()
        .rposition(|&bitrate| budget > bitrate)
        .unwrap_or(0)
}

/// Rescale raw classes onto `1..=top_quality + 1`.
fn refine_saliency(segments: &[SegmentMeta], top_quality: usize) -> Vec<u32> {
    let current_top = segments.iter().map(|s| s.saliency).max().unwrap_or(0);
    if current_top == 0 {
        return vec![1; segments.len()];
    }

    let top_class = (top_quality + 1) as f64;
    segments
        .iter()
        .map(|s| {
            let scaled = (f64::from(s.saliency) * top_class / f64::from(current_top)).round();
            (scaled as u32).max(1)
        })
        .collect()
}
