use crate::{
    BufferThresholds, MdpState, RegimeWeights, RewardWeighting, TermWeights,
    reward::{RewardModel, normalize},
};

fn model(bitrates: &[f64], max_saliency: u32) -> RewardModel {
    RewardModel::new(
        bitrates.to_vec(),
        BufferThresholds::default(),
        RewardWeighting::Uniform,
        max_saliency,
    )
}

fn state(
    last_quality: usize,
    shot_persistence: u32,
    saliency: u32,
    saliency_delta: i64,
) -> MdpState {
    MdpState {
        depth: 1,
        buffer: 10.0,
        bandwidth: 1000.0,
        bitrate_vector: vec![last_quality],
        shot_persistence,
        saliency,
        saliency_delta,
    }
}

#[test]
fn degenerate_range_normalizes_to_zero() {
    assert_eq!(normalize(3.0, 2.0, 2.0), 0.0);
    assert_eq!(normalize(3.0, 2.0, 4.0), 0.5);
}

#[test]
fn smoothness_peaks_mid_band_and_penalizes_outside() {
    let model = model(&[500.0, 1000.0], 1);

    assert_eq!(model.smoothness(12.0), 1.0);
    assert_eq!(model.smoothness(4.0), 0.0);
    assert_eq!(model.smoothness(2.0), -2.0);
    assert_eq!(model.smoothness(25.0), -5.0);
    assert!(model.smoothness(8.0) > 0.0 && model.smoothness(8.0) < 1.0);
}

#[test]
fn switching_prefers_staying_on_the_last_quality() {
    let model = model(&[500.0, 1000.0, 2000.0], 1);
    let current = state(1, 3, 1, 0);
    let next = state(1, 2, 1, 0);

    let stay = model.switching(&current, 1, &next);
    let jump = model.switching(&current, 2, &next);
    assert!(stay > jump);
    assert!((0.0..=1.0).contains(&stay));
    assert!((0.0..=1.0).contains(&jump));
}

#[test]
fn switching_follows_saliency_across_a_shot_boundary() {
    let model = model(&[500.0, 1000.0, 2000.0], 3);
    let current = state(0, 1, 1, 0);
    let next = state(0, 2, 2, 1);

    // the new shot is more salient, so the expected quality moves up one level
    assert!(model.switching(&current, 1, &next) > model.switching(&current, 0, &next));

    // inside a shot the saliency change is ignored
    let mid_shot = state(0, 2, 1, 0);
    assert!(model.switching(&mid_shot, 0, &next) > model.switching(&mid_shot, 1, &next));
}

#[test]
fn quality_is_scaled_by_saliency() {
    let model = model(&[500.0, 1000.0, 2000.0], 2);

    assert_eq!(model.quality(2, 2), 1.0);
    assert_eq!(model.quality(0, 2), 0.0);
    assert!(model.quality(2, 1) <= 0.5);
    assert!(model.quality(1, 2) > model.quality(1, 1));
}

#[test]
fn single_quality_level_has_no_quality_signal() {
    let model = model(&[800.0], 1);
    assert_eq!(model.quality(0, 1), 0.0);
}

#[test]
fn buffer_regime_weighting_picks_weights_by_current_buffer() {
    let regimes = RegimeWeights::default();
    let weighting = RewardWeighting::BufferRegime(regimes);
    let thresholds = BufferThresholds::default();

    assert_eq!(weighting.weights_for(25.0, &thresholds), regimes.rich);
    assert_eq!(weighting.weights_for(2.0, &thresholds), regimes.starving);
    assert_eq!(weighting.weights_for(8.0, &thresholds), regimes.building);
    assert_eq!(weighting.weights_for(15.0, &thresholds), regimes.steady);
    assert_eq!(
        RewardWeighting::Uniform.weights_for(25.0, &thresholds),
        TermWeights::EQUAL
    );
}
