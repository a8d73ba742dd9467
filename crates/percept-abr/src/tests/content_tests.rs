use super::segments;
use crate::ContentTables;

const BITRATES: [f64; 3] = [500.0, 1000.0, 2000.0];

#[test]
fn shot_persistence_counts_down_to_each_boundary() {
    let meta = segments(&[1; 6], &[1, 1, 1, 2, 2, 3]);
    let tables = ContentTables::build(&meta, &BITRATES, 1000.0, 1.3);

    let counts: Vec<u32> = (0..6).filter_map(|i| tables.shot_persistence(i)).collect();
    assert_eq!(counts, vec![3, 2, 1, 2, 1, 1]);
    assert_eq!(tables.shot_persistence(6), None);
}

#[test]
fn saliency_is_rescaled_to_the_affordable_quality_range() {
    // 1000 * 1.3 affords up to quality 1, so classes map onto 1..=2
    let meta = segments(&[0, 2, 4], &[1, 1, 1]);
    let tables = ContentTables::build(&meta, &BITRATES, 1000.0, 1.3);

    assert_eq!(tables.saliency(0), Some(1));
    assert_eq!(tables.saliency(1), Some(1));
    assert_eq!(tables.saliency(2), Some(2));
    assert_eq!(tables.max_saliency(), 2);
    assert_eq!(tables.saliency_delta(0), Some(0));
    assert_eq!(tables.saliency_delta(1), Some(0));
    assert_eq!(tables.saliency_delta(2), Some(1));
}

#[test]
fn generous_bandwidth_spreads_saliency_over_all_levels() {
    let meta = segments(&[1, 2, 3], &[1, 2, 3]);
    let tables = ContentTables::build(&meta, &BITRATES, 10_000.0, 1.3);

    assert_eq!(tables.saliency(0), Some(1));
    assert_eq!(tables.saliency(1), Some(2));
    assert_eq!(tables.saliency(2), Some(3));
    assert_eq!(tables.saliency_delta(2), Some(1));
}

#[test]
fn starved_bandwidth_collapses_saliency_to_one_class() {
    let meta = segments(&[1, 4, 2], &[1, 1, 1]);
    let tables = ContentTables::build(&meta, &BITRATES, 100.0, 1.3);

    assert_eq!(tables.max_saliency(), 1);
    assert!((0..3).all(|i| tables.saliency(i) == Some(1)));
}

#[test]
fn zero_saliency_stream_is_treated_as_flat() {
    let meta = segments(&[0, 0], &[1, 1]);
    let tables = ContentTables::build(&meta, &BITRATES, 1000.0, 1.3);

    assert_eq!(tables.saliency(0), Some(1));
    assert_eq!(tables.saliency(1), Some(1));
    assert_eq!(tables.max_saliency(), 1);
}
