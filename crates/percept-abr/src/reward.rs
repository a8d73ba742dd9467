use crate::{BufferThresholds, MdpState, RewardWeighting, TermWeights};

/// Offset keeping the logarithms of zero distances and bitrates finite.
const LOG_OFFSET: f64 = 1.5;

/// The three normalized reward terms of one transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardTerms {
    /// Buffer stability; within `[0, 1]` inside the buffer band, negative outside.
    pub smoothness: f64,
    /// Closeness to the expected quality; within `[0, 1]`.
    pub switching: f64,
    /// Saliency-weighted perceptual quality; within `[0, 1]`.
    pub quality: f64,
}

impl RewardTerms {
    pub fn combine(&self, weights: TermWeights) -> f64 {
        weights.smoothness * self.smoothness
            + weights.switching * self.switching
            + weights.quality * self.quality
    }
}

/// Scale `value` from `[min, max]` onto `[0, 1]`. A degenerate range carries
/// no signal and maps to 0.
pub(crate) fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range.is_nan() || range.abs() <= f64::EPSILON {
        return 0.0;
    }
    (value - min) / range
}

fn quality_reward(bitrate_kbps: f64, saliency: u32) -> f64 {
    f64::from(saliency) * (bitrate_kbps * 1000.0 + LOG_OFFSET).ln()
}

fn distance_score(from_kbps: f64, to_kbps: f64) -> f64 {
    ((from_kbps - to_kbps).abs() * 1000.0 + LOG_OFFSET).ln()
}

#[derive(Debug, Clone)]
/// Reward shaping for one training cycle, with normalization bounds precomputed.
pub(crate) struct RewardModel {
    bitrates: Vec<f64>,
    thresholds: BufferThresholds,
    weighting: RewardWeighting,
    smoothness_max: f64,
    // (min, max) quality reward per saliency class, index = class - 1
    quality_bounds: Vec<(f64, f64)>,
    max_saliency: u32,
}

impl RewardModel {
    pub(crate) fn new(
        bitrates: Vec<f64>,
        thresholds: BufferThresholds,
        weighting: RewardWeighting,
        max_saliency: u32,
    ) -> Self {
        let half_band = (thresholds.r_max - thresholds.r_min) / 2.0;
        let lowest = bitrates.first().copied().unwrap_or(0.0);
        let highest = bitrates.last().copied().unwrap_or(0.0);
        let max_saliency = max_saliency.max(1);
        let quality_bounds = (1..=max_saliency)
            .map(|s| (quality_reward(lowest, s), quality_reward(highest, s)))
            .collect();

        RewardModel {
            bitrates,
            thresholds,
            weighting,
            smoothness_max: half_band * half_band,
            quality_bounds,
            max_saliency,
        }
    }

    /// Linear penalty outside `[r_min, r_max]`, normalized bump inside it.
    pub(crate) fn smoothness(&self, next_buffer: f64) -> f64 {
        let BufferThresholds { r_min, r_max, .. } = self.thresholds;
        if next_buffer < r_min {
            return next_buffer - r_min;
        }
        if next_buffer > r_max {
            return r_max - next_buffer;
        }
        normalize((next_buffer - r_min) * (r_max - next_buffer), 0.0, self.smoothness_max)
    }

    /// Score how close `action` stays to the quality the viewer expects.
    ///
    /// The expectation is the last chosen quality, shifted by the saliency
    /// change when the transition crosses a shot boundary.
    pub(crate) fn switching(&self, state: &MdpState, action: usize, next: &MdpState) -> f64 {
        let top = self.bitrates.len().saturating_sub(1);
        let mut expected = state.last_quality().min(top);
        if state.at_shot_boundary() {
            let shifted = expected as i64 + next.saliency_delta();
            expected = shifted.clamp(0, top as i64) as usize;
        }

        let expected_kbps = self.bitrates[expected];
        let chosen_kbps = self.bitrates[action.min(top)];
        let worst = distance_score(expected_kbps, self.bitrates[0])
            .max(distance_score(expected_kbps, self.bitrates[top]));

        1.0 - normalize(distance_score(expected_kbps, chosen_kbps), 0.0, worst)
    }

    /// Perceptual quality of `action` for a segment of the given saliency class.
    pub(crate) fn quality(&self, action: usize, saliency: u32) -> f64 {
        let saliency = saliency.clamp(1, self.max_saliency);
        let (min, max) = self.quality_bounds[(saliency - 1) as usize];
        let top = self.bitrates.len().saturating_sub(1);
        let value = quality_reward(self.bitrates[action.min(top)], saliency);
        let factor = f64::from(saliency) / f64::from(self.max_saliency);
        factor * normalize(value, min, max)
    }

    pub(crate) fn terms(&self, state: &MdpState, action: usize, next: &MdpState) -> RewardTerms {
        RewardTerms {
            smoothness: self.smoothness(next.buffer()),
            switching: self.switching(state, action, next),
            quality: self.quality(action, next.saliency()),
        }
    }

    pub(crate) fn reward(&self, state: &MdpState, action: usize, next: &MdpState) -> f64 {
        let weights = self.weighting.weights_for(state.buffer(), &self.thresholds);
        self.terms(state, action, next).combine(weights)
    }
}
