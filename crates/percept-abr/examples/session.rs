use std::path::PathBuf;

use percept_abr::{
    MdpRule, Representation, RuleConfig, SegmentMeta, StreamContext, TrainRequest,
    TrainingNotice, load_stream_yaml,
};
use percept_core::{Environment, PolicySimulator, StateId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn synthetic_stream(segment_count: usize) -> StreamContext {
    StreamContext {
        representations: [300.0, 750.0, 1500.0, 3000.0]
            .into_iter()
            .map(|bitrate_kbps| Representation { bitrate_kbps })
            .collect(),
        fragment_duration: 2.0,
        segments: (0..segment_count)
            .map(|i| SegmentMeta {
                saliency: [1, 1, 3, 5, 2, 1, 4][i % 7],
                shot: (i / 5) as u64,
            })
            .collect(),
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,percept_abr=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let stream = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => load_stream_yaml(&path).expect("failed to load stream YAML"),
        None => synthetic_stream(40),
    };
    let config = RuleConfig::from_default_yaml().expect("default rule config should parse");
    let bitrates = stream.bitrates();
    let duration = stream.fragment_duration;

    let mut rule = MdpRule::new(stream.clone(), config).expect("failed to build rule");
    rule.on_training(|notice| match notice {
        TrainingNotice::Completed(report) => println!(
            "trained segments {}..={} states={} rounds={}",
            report.min_segment, report.max_segment, report.num_states, report.metrics.rounds
        ),
        TrainingNotice::Failed { window_start, reason } => {
            println!("training for segment {window_start} failed: {reason}")
        }
    });

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut buffer = 0.0f64;
    let mut bandwidth = 1200.0f64;
    let mut quality = 0usize;
    let mut stalls = 0.0f64;

    for segment in 0..stream.segment_count() {
        // the host asks while the previous segment is playing out
        if segment > 0 && rule.window_exhausted(segment - 1) {
            let request = TrainRequest {
                window_start: segment,
                bandwidth_kbps: Some(bandwidth),
                buffer_level: Some(buffer),
                last_quality: quality,
            };
            if let Err(err) = rule.train(request) {
                warn!(segment, error = %err, "keeping the previous window");
            }
        }
        if segment > 0 {
            quality = rule.decide(segment - 1);
        }

        let throughput = (bandwidth * rng.gen_range(0.6..1.4)).max(50.0);
        let download = bitrates[quality] / throughput * duration;
        stalls += (download - buffer).max(0.0);
        buffer = (buffer - download).max(0.0) + duration;
        bandwidth = 0.7 * bandwidth + 0.3 * throughput;

        info!(segment, quality, buffer, bandwidth, "segment downloaded");
    }

    println!("total_stall_seconds={stalls:.3}");

    if let Some(window) = rule.window() {
        let env = window.environment();
        let gamma = rule.config().solver.gamma;
        let mut simulator = PolicySimulator::new(env, window.policy(), gamma, 12345);
        let episode = simulator
            .rollout(StateId::ROOT, env.lookahead())
            .expect("rollout of the last window failed");
        println!(
            "last_window_states={} replay_return={:.6} value={:.6}",
            env.num_states(),
            episode.total_return,
            window.values()[0]
        );
    }
}
