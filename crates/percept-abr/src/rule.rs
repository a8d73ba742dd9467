use std::{fmt, sync::Arc};

use tracing::{debug, info, warn};

use percept_core::{
    ActionId, Environment, Policy, PolicySnapshot, SolveMetrics, StateId, solve_with_hook,
};

use crate::{AbrEnvironment, AbrError, RuleConfig, StreamContext, WindowSpec};

/// Quality returned whenever no trained window covers a request.
pub const DEFAULT_QUALITY: usize = 0;

/// Training trigger for one window, issued by the host at window boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainRequest {
    /// First segment the new window decides.
    pub window_start: usize,
    /// Latest bandwidth estimate in kbps, if the estimator has one.
    pub bandwidth_kbps: Option<f64>,
    /// Latest buffer level in seconds, if measured.
    pub buffer_level: Option<f64>,
    /// Quality requested for the segment before `window_start`.
    pub last_quality: usize,
}

/// Summary of a successful training cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainReport {
    pub min_segment: usize,
    pub max_segment: usize,
    pub num_states: usize,
    pub metrics: SolveMetrics,
}

/// Training completion notification handed to a registered listener.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingNotice {
    Completed(TrainReport),
    Failed { window_start: usize, reason: String },
}

#[derive(Debug)]
/// Immutable result of one training cycle: the solved policy, the
/// environment it was solved on and the segments it is valid for.
pub struct TrainedWindow {
    min_segment: usize,
    max_segment: usize,
    env: AbrEnvironment,
    policy: Policy,
    values: Vec<f64>,
    metrics: SolveMetrics,
}

impl TrainedWindow {
    pub fn min_segment(&self) -> usize {
        self.min_segment
    }

    pub fn max_segment(&self) -> usize {
        self.max_segment
    }

    /// Whether `segment` is decided by this window.
    pub fn covers(&self, segment: usize) -> bool {
        (self.min_segment..=self.max_segment).contains(&segment)
    }

    pub fn environment(&self) -> &AbrEnvironment {
        &self.env
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn metrics(&self) -> SolveMetrics {
        self.metrics
    }

    pub fn report(&self) -> TrainReport {
        TrainReport {
            min_segment: self.min_segment,
            max_segment: self.max_segment,
            num_states: self.env.num_states(),
            metrics: self.metrics,
        }
    }

    /// Capture the policy and values for diagnostics.
    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::capture(&self.policy, &self.values)
    }

    fn greedy(&self, state: StateId) -> ActionId {
        self.policy
            .greedy_action(state)
            .unwrap_or(ActionId::from(DEFAULT_QUALITY))
    }

    /// Walk the greedy path from the root down to `depth`.
    fn greedy_state_at(&self, depth: usize) -> StateId {
        let mut state = StateId::ROOT;
        for _ in 0..depth {
            state = self.env.next_state(state, self.greedy(state));
        }
        state
    }
}

/// Build the environment for a window and solve it, without touching any rule.
pub fn train_window(
    stream: &StreamContext,
    config: &RuleConfig,
    request: &TrainRequest,
) -> Result<TrainedWindow, AbrError> {
    let bandwidth_kbps = request
        .bandwidth_kbps
        .filter(|b| b.is_finite() && *b > 0.0)
        .ok_or(AbrError::MissingBandwidth)?;
    let buffer_level = request
        .buffer_level
        .filter(|b| b.is_finite() && *b >= 0.0)
        .ok_or(AbrError::MissingBuffer)?;

    let env = AbrEnvironment::new(
        stream,
        config,
        WindowSpec {
            start_segment: request.window_start,
            bandwidth_kbps,
            buffer_level,
            initial_quality: request.last_quality,
        },
    )?;

    let solution = solve_with_hook(&env, &config.solver, |round| {
        debug!(
            round = round.round,
            policy_error = round.policy_error,
            value_change = round.value_change,
            "policy iteration round"
        );
    })?;

    if !solution.metrics.converged {
        warn!(
            rounds = solution.metrics.rounds,
            final_error = solution.metrics.final_error,
            final_value_change = solution.metrics.final_value_change,
            "policy iteration hit the round cap before converging"
        );
    }

    Ok(TrainedWindow {
        min_segment: env.start_segment(),
        max_segment: env.end_segment(),
        env,
        policy: solution.policy,
        values: solution.values,
        metrics: solution.metrics,
    })
}

/// Position of the rule inside the current window's state tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    state: StateId,
    depth: usize,
    last_action: ActionId,
    last_segment: usize,
}

type TrainingListener = Box<dyn FnMut(&TrainingNotice) + Send>;

/// Online executor: retrains the lookahead window on request and answers
/// per-segment quality queries from the trained policy.
pub struct MdpRule {
    stream: StreamContext,
    config: RuleConfig,
    window: Option<Arc<TrainedWindow>>,
    cursor: Option<Cursor>,
    listener: Option<TrainingListener>,
}

impl fmt::Debug for MdpRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MdpRule")
            .field("config", &self.config)
            .field("window", &self.window.as_ref().map(|w| w.report()))
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl MdpRule {
    /// Create an untrained rule for a stream.
    pub fn new(stream: StreamContext, config: RuleConfig) -> Result<Self, AbrError> {
        config.validate()?;
        stream.validate()?;
        Ok(MdpRule {
            stream,
            config,
            window: None,
            cursor: None,
            listener: None,
        })
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    pub fn stream(&self) -> &StreamContext {
        &self.stream
    }

    /// Shared handle to the current trained window, if any.
    pub fn window(&self) -> Option<Arc<TrainedWindow>> {
        self.window.clone()
    }

    /// Register a callback receiving every training outcome.
    pub fn on_training<F>(&mut self, listener: F)
    where
        F: FnMut(&TrainingNotice) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    fn notify(&mut self, notice: TrainingNotice) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&notice);
        }
    }

    /// Train a fresh window and replace the current one.
    ///
    /// On failure the previous window, trained or not, stays in place.
    pub fn train(&mut self, request: TrainRequest) -> Result<TrainReport, AbrError> {
        match train_window(&self.stream, &self.config, &request) {
            Ok(window) => {
                let report = window.report();
                info!(
                    min_segment = report.min_segment,
                    max_segment = report.max_segment,
                    states = report.num_states,
                    rounds = report.metrics.rounds,
                    final_error = report.metrics.final_error,
                    converged = report.metrics.converged,
                    "mdp training finished"
                );
                self.install(window);
                self.notify(TrainingNotice::Completed(report));
                Ok(report)
            }
            Err(err) => {
                warn!(window_start = request.window_start, error = %err, "mdp training rejected");
                self.notify(TrainingNotice::Failed {
                    window_start: request.window_start,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Swap in a window trained elsewhere. The cursor restarts at its root.
    pub fn install(&mut self, window: TrainedWindow) {
        self.window = Some(Arc::new(window));
        self.cursor = None;
    }

    /// Whether the next segment after `current_segment` lies beyond the
    /// trained window, i.e. a retrain is due.
    pub fn window_exhausted(&self, current_segment: usize) -> bool {
        match &self.window {
            Some(window) => current_segment.saturating_add(1) > window.max_segment,
            None => true,
        }
    }

    /// Pick the quality of the segment after `current_segment`.
    ///
    /// Untrained rules and requests outside the trained window get
    /// `DEFAULT_QUALITY`. Inside the window the cursor follows the actions
    /// taken so far and the most probable action of its state is returned,
    /// lowest index first on ties.
    pub fn decide(&mut self, current_segment: usize) -> usize {
        let Some(window) = self.window.clone() else {
            debug!(current_segment, "no trained window, using default quality");
            return DEFAULT_QUALITY;
        };

        let target = current_segment.saturating_add(1);
        if !window.covers(target) {
            debug!(
                current_segment,
                min_segment = window.min_segment,
                max_segment = window.max_segment,
                "segment outside trained window, using default quality"
            );
            return DEFAULT_QUALITY;
        }

        let depth = target - window.min_segment;
        let state = match self.cursor {
            _ if depth == 0 => StateId::ROOT,
            Some(cursor) if cursor.last_segment == current_segment => cursor.state,
            Some(cursor) if cursor.depth < depth => {
                let mut state = window.env.next_state(cursor.state, cursor.last_action);
                for _ in cursor.depth + 1..depth {
                    state = window.env.next_state(state, window.greedy(state));
                }
                state
            }
            _ => window.greedy_state_at(depth),
        };

        let action = window.greedy(state);
        self.cursor = Some(Cursor {
            state,
            depth,
            last_action: action,
            last_segment: current_segment,
        });
        debug!(
            current_segment,
            state = state.index(),
            quality = action.index(),
            "quality chosen from trained policy"
        );
        action.index()
    }
}
