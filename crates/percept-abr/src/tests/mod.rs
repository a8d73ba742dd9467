mod content_tests;
mod reward_tests;

use crate::SegmentMeta;

pub(super) fn segments(saliency: &[u32], shots: &[u64]) -> Vec<SegmentMeta> {
    saliency
        .iter()
        .zip(shots)
        .map(|(&saliency, &shot)| SegmentMeta { saliency, shot })
        .collect()
}
