use std::sync::{Arc, Mutex};

use percept_abr::{
    AbrError, DEFAULT_QUALITY, MdpRule, Representation, RewardWeighting, RuleConfig, SegmentMeta,
    StreamContext, TrainRequest, TrainingNotice, load_stream_yaml, save_stream_yaml, train_window,
};
use percept_core::{ActionId, Environment, StateId};

fn flat_stream(segment_count: usize) -> StreamContext {
    StreamContext {
        representations: vec![
            Representation { bitrate_kbps: 500.0 },
            Representation { bitrate_kbps: 1000.0 },
        ],
        fragment_duration: 2.0,
        segments: vec![SegmentMeta { saliency: 1, shot: 0 }; segment_count],
    }
}

fn salient_stream() -> StreamContext {
    StreamContext {
        representations: [300.0, 750.0, 1500.0, 3000.0]
            .into_iter()
            .map(|bitrate_kbps| Representation { bitrate_kbps })
            .collect(),
        fragment_duration: 2.0,
        segments: (0..40)
            .map(|i| SegmentMeta {
                saliency: [1, 4, 2, 5, 3, 1, 5][i % 7],
                shot: (i / 3 + i / 8) as u64,
            })
            .collect(),
    }
}

/// Best discounted return from `state` over every quality path below it.
fn best_return<E: Environment>(env: &E, state: StateId, gamma: f64) -> f64 {
    env.allowed_actions(state)
        .iter()
        .map(|&action| {
            let next = env.next_state(state, action);
            env.reward(state, action, next) + gamma * best_return(env, next, gamma)
        })
        .reduce(f64::max)
        .unwrap_or(0.0)
}

fn rule(lookahead: usize) -> MdpRule {
    let config = RuleConfig {
        lookahead,
        ..RuleConfig::default()
    };
    MdpRule::new(flat_stream(12), config).expect("rule should build")
}

fn request(window_start: usize) -> TrainRequest {
    TrainRequest {
        window_start,
        bandwidth_kbps: Some(1500.0),
        buffer_level: Some(10.0),
        last_quality: 0,
    }
}

fn recorded(rule: &mut MdpRule) -> Arc<Mutex<Vec<TrainingNotice>>> {
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notices);
    rule.on_training(move |notice| sink.lock().expect("lock").push(notice.clone()));
    notices
}

#[test]
fn untrained_rule_returns_default_quality() {
    let mut rule = rule(3);
    assert_eq!(rule.decide(0), DEFAULT_QUALITY);
    assert_eq!(rule.decide(7), DEFAULT_QUALITY);
    assert!(rule.window_exhausted(0));
}

#[test]
fn missing_samples_reject_training_and_notify() {
    let mut rule = rule(3);
    let notices = recorded(&mut rule);

    let err = rule
        .train(TrainRequest {
            bandwidth_kbps: None,
            ..request(5)
        })
        .expect_err("no bandwidth");
    assert!(matches!(err, AbrError::MissingBandwidth));

    let err = rule
        .train(TrainRequest {
            buffer_level: Some(f64::NAN),
            ..request(5)
        })
        .expect_err("no buffer");
    assert!(matches!(err, AbrError::MissingBuffer));

    assert!(rule.window().is_none());
    assert_eq!(rule.decide(5), DEFAULT_QUALITY);

    let notices = notices.lock().expect("lock");
    assert_eq!(notices.len(), 2);
    assert!(
        notices
            .iter()
            .all(|n| matches!(n, TrainingNotice::Failed { window_start: 5, .. }))
    );
}

#[test]
fn successful_training_reports_the_window() {
    let mut rule = rule(3);
    let notices = recorded(&mut rule);

    let report = rule.train(request(5)).expect("training should succeed");
    assert_eq!(report.min_segment, 5);
    assert_eq!(report.max_segment, 7);
    assert_eq!(report.num_states, 15);
    assert!(report.metrics.rounds >= 1);

    let notices = notices.lock().expect("lock");
    assert_eq!(notices.as_slice(), &[TrainingNotice::Completed(report)]);
}

#[test]
fn decisions_follow_the_greedy_path_of_the_window() {
    let mut rule = rule(3);
    rule.train(request(5)).expect("training should succeed");
    let window = rule.window().expect("window installed");
    let env = window.environment();
    let policy = window.policy();

    let mut state = StateId::ROOT;
    let mut expected = Vec::new();
    for _ in 0..3 {
        let action = policy.greedy_action(state).expect("row exists");
        expected.push(action.index());
        state = env.next_state(state, action);
    }

    // the host asks about segment i + 1 while segment i is playing out
    assert_eq!(rule.decide(4), expected[0]);
    assert_eq!(rule.decide(5), expected[1]);
    assert_eq!(rule.decide(6), expected[2]);
}

#[test]
fn repeated_queries_return_the_same_quality() {
    let mut rule = rule(3);
    rule.train(request(5)).expect("training should succeed");

    let first = rule.decide(5);
    assert_eq!(rule.decide(5), first);
    assert_eq!(rule.decide(5), first);

    // seeking back to the window start replays the root decision
    let root = rule.decide(4);
    rule.decide(6);
    assert_eq!(rule.decide(4), root);
}

#[test]
fn queries_outside_the_window_use_the_default() {
    let mut rule = rule(3);
    rule.train(request(5)).expect("training should succeed");

    assert_eq!(rule.decide(3), DEFAULT_QUALITY);
    assert_eq!(rule.decide(7), DEFAULT_QUALITY);
    assert!(!rule.window_exhausted(6));
    assert!(rule.window_exhausted(7));
}

#[test]
fn failed_retrain_keeps_the_previous_window() {
    let mut rule = rule(3);
    rule.train(request(5)).expect("training should succeed");
    let before = rule.decide(4);

    rule.train(TrainRequest {
        buffer_level: None,
        ..request(8)
    })
    .expect_err("no buffer");

    let window = rule.window().expect("window still installed");
    assert_eq!(window.min_segment(), 5);
    assert_eq!(rule.decide(4), before);
}

#[test]
fn single_segment_window_end_to_end() {
    let mut rule = rule(1);
    let report = rule
        .train(TrainRequest {
            window_start: 2,
            bandwidth_kbps: Some(1000.0),
            buffer_level: Some(10.0),
            last_quality: 0,
        })
        .expect("training should succeed");

    assert_eq!(report.num_states, 3);
    let window = rule.window().expect("window installed");
    let env = window.environment();
    assert!(env.allowed_actions(StateId::from(1)).is_empty());
    assert!(env.allowed_actions(StateId::from(2)).is_empty());

    assert!(rule.decide(1) < 2);
    assert_eq!(rule.decide(2), DEFAULT_QUALITY);
}

#[test]
fn rich_bandwidth_keeps_the_higher_quality() {
    let mut rule = rule(1);
    rule.train(TrainRequest {
        window_start: 2,
        bandwidth_kbps: Some(10_000.0),
        buffer_level: Some(10.0),
        last_quality: 1,
    })
    .expect("training should succeed");

    assert_eq!(rule.decide(1), 1);
}

#[test]
fn starved_bandwidth_falls_back_to_the_lowest_quality() {
    let mut rule = rule(1);
    rule.train(TrainRequest {
        window_start: 2,
        bandwidth_kbps: Some(100.0),
        buffer_level: Some(5.0),
        last_quality: 0,
    })
    .expect("training should succeed");

    assert_eq!(rule.decide(1), 0);
}

#[test]
fn windows_trained_elsewhere_can_be_installed() {
    let stream = flat_stream(12);
    let config = RuleConfig {
        lookahead: 2,
        ..RuleConfig::default()
    };
    let window = train_window(&stream, &config, &request(0)).expect("training should succeed");
    assert!(window.covers(0));
    assert!(window.covers(1));
    assert!(!window.covers(2));

    let json = window.snapshot().to_json().expect("snapshot should serialize");
    assert!(json.contains("\"schema_version\": 1"));
    assert!(json.contains("\"greedy_action\""));

    let mut rule = MdpRule::new(stream, config).expect("rule should build");
    rule.install(window);
    assert!(!rule.window_exhausted(0));
}

#[test]
fn default_yaml_matches_default_config() {
    let from_yaml = RuleConfig::from_default_yaml().expect("default yaml should parse");
    assert_eq!(from_yaml, RuleConfig::default());
}

#[test]
fn regime_weighting_parses_from_yaml() {
    let yaml = r#"
lookahead: 2
weighting:
  kind: buffer_regime
  starving:
    smoothness: 1.0
    switching: 0.0
    quality: 0.0
"#;
    let config = RuleConfig::from_yaml_str(yaml).expect("yaml should parse");
    let RewardWeighting::BufferRegime(regimes) = config.weighting else {
        panic!("expected buffer regime weighting");
    };
    assert_eq!(regimes.starving.smoothness, 1.0);
    assert_eq!(regimes.rich.smoothness, 0.4);
    assert_eq!(config.lookahead, 2);
    assert_eq!(config.buffer.r_min, 4.0);
}

#[test]
fn invalid_config_is_rejected() {
    let err = RuleConfig::from_yaml_str("buffer:\n  r_min: 30.0\n").expect_err("r_min above r_max");
    assert!(matches!(err, AbrError::InvalidConfig(_)));

    let err = RuleConfig::from_yaml_str("solver:\n  gamma: 2.0\n").expect_err("bad gamma");
    assert!(matches!(err, AbrError::SolverConfig(_)));
}

#[test]
fn stream_context_survives_a_yaml_file() {
    let stream = flat_stream(4);
    let path = std::env::temp_dir().join(format!("percept-stream-{}.yaml", std::process::id()));

    save_stream_yaml(&path, &stream).expect("save should succeed");
    let loaded = load_stream_yaml(&path).expect("load should succeed");
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, stream);
}

#[test]
fn root_decision_matches_exhaustive_search() {
    let stream = salient_stream();
    for lookahead in 2..=4 {
        let config = RuleConfig {
            lookahead,
            ..RuleConfig::default()
        };
        let gamma = config.solver.gamma;
        for start in [1, 7, 10, 23, 36] {
            for bandwidth in [300.0, 800.0, 2500.0] {
                for buffer in [2.0, 10.0, 22.0] {
                    let mut rule =
                        MdpRule::new(stream.clone(), config.clone()).expect("rule should build");
                    let report = rule
                        .train(TrainRequest {
                            window_start: start,
                            bandwidth_kbps: Some(bandwidth),
                            buffer_level: Some(buffer),
                            last_quality: 1,
                        })
                        .expect("training should succeed");
                    assert!(report.metrics.converged);

                    let window = rule.window().expect("window installed");
                    let env = window.environment();
                    let optimum = best_return(env, StateId::ROOT, gamma);

                    let action = ActionId::from(rule.decide(start - 1));
                    let next = env.next_state(StateId::ROOT, action);
                    let achieved = env.reward(StateId::ROOT, action, next)
                        + gamma * best_return(env, next, gamma);

                    assert!(
                        (achieved - optimum).abs() < 1e-9,
                        "L={lookahead} start={start} bw={bandwidth} buf={buffer}: \
                         chose {} worth {achieved}, best is {optimum}",
                        action.index()
                    );
                    assert!((window.values()[0] - optimum).abs() < 1e-9);
                }
            }
        }
    }
}
