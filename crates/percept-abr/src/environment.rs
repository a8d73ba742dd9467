use percept_core::{ActionId, Arena, Environment, StateId};

use crate::{
    AbrError, ContentTables, MdpState, RewardTerms, RuleConfig, StreamContext,
    reward::RewardModel,
};

/// Initial condition of one lookahead window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    /// First segment whose quality the window decides.
    pub start_segment: usize,
    /// Bandwidth estimate in kbps, held constant over the window.
    pub bandwidth_kbps: f64,
    /// Current buffer level in seconds.
    pub buffer_level: f64,
    /// Quality requested for the segment before `start_segment`.
    pub initial_quality: usize,
}

#[derive(Debug, Clone)]
/// Deterministic MDP over the quality choices of a lookahead window.
///
/// States form a full `k`-ary tree (`k` = quality levels) stored in an arena:
/// the child of `s` under action `a` is `s * k + a + 1`. The root stands for
/// the segment before the window; depth `d` stands for segment
/// `start_segment - 1 + d`, and the leaves at depth `lookahead` are terminal.
pub struct AbrEnvironment {
    states: Arena<MdpState>,
    actions: Vec<ActionId>,
    quality_levels: usize,
    lookahead: usize,
    start_segment: usize,
    rewards: RewardModel,
}

/// Number of nodes of a full `branching`-ary tree with `depth + 1` levels.
fn tree_size(branching: usize, depth: usize) -> Option<usize> {
    let mut total = 0usize;
    let mut level = 1usize;
    for d in 0..=depth {
        if d > 0 {
            level = level.checked_mul(branching)?;
        }
        total = total.checked_add(level)?;
    }
    Some(total)
}

impl AbrEnvironment {
    /// Build the content tables and the full state tree of one window.
    pub fn new(
        stream: &StreamContext,
        config: &RuleConfig,
        window: WindowSpec,
    ) -> Result<Self, AbrError> {
        config.validate()?;
        stream.validate()?;

        let quality_levels = stream.quality_levels();
        if window.initial_quality >= quality_levels {
            return Err(AbrError::InvalidQuality {
                quality: window.initial_quality,
                levels: quality_levels,
            });
        }
        if !window.bandwidth_kbps.is_finite() || window.bandwidth_kbps <= 0.0 {
            return Err(AbrError::MissingBandwidth);
        }
        if !window.buffer_level.is_finite() || window.buffer_level < 0.0 {
            return Err(AbrError::MissingBuffer);
        }

        let segment_count = stream.segment_count();
        if window.start_segment >= segment_count {
            return Err(AbrError::WindowOutOfRange {
                start: window.start_segment,
                segment_count,
            });
        }
        // the last window of a stream may be shorter than the configured lookahead
        let lookahead = config.lookahead.min(segment_count - window.start_segment);

        let num_states = tree_size(quality_levels, lookahead)
            .filter(|n| *n <= config.max_states)
            .ok_or(AbrError::StateSpaceTooLarge {
                quality_levels,
                lookahead,
                max_states: config.max_states,
            })?;

        let bitrates = stream.bitrates();
        let tables = ContentTables::build(
            &stream.segments,
            &bitrates,
            window.bandwidth_kbps,
            config.bandwidth_safety,
        );

        let rewards = RewardModel::new(
            bitrates.clone(),
            config.buffer,
            config.weighting,
            tables.max_saliency(),
        );

        let mut env = AbrEnvironment {
            states: Arena::with_capacity(num_states),
            actions: (0..quality_levels).map(ActionId::from).collect(),
            quality_levels,
            lookahead,
            start_segment: window.start_segment,
            rewards,
        };
        env.construct_states(
            &tables,
            &bitrates,
            stream.fragment_duration,
            config,
            window,
            num_states,
        );
        Ok(env)
    }

    /// Forward-simulate every quality path of the window, breadth first, so
    /// that arena order matches `parent * k + action + 1`.
    fn construct_states(
        &mut self,
        tables: &ContentTables,
        bitrates: &[f64],
        fragment_duration: f64,
        config: &RuleConfig,
        window: WindowSpec,
        num_states: usize,
    ) {
        let root = match window.start_segment.checked_sub(1) {
            Some(previous) => MdpState {
                depth: 0,
                buffer: window.buffer_level,
                bandwidth: window.bandwidth_kbps,
                bitrate_vector: vec![window.initial_quality],
                shot_persistence: tables.shot_persistence(previous).unwrap_or(1),
                saliency: tables.saliency(previous).unwrap_or(1),
                saliency_delta: tables.saliency_delta(previous).unwrap_or(0),
            },
            // nothing precedes the first segment; treat it as a fresh shot
            None => MdpState {
                depth: 0,
                buffer: window.buffer_level,
                bandwidth: window.bandwidth_kbps,
                bitrate_vector: vec![window.initial_quality],
                shot_persistence: 1,
                saliency: tables.saliency(0).unwrap_or(1),
                saliency_delta: 0,
            },
        };
        self.states.allocate(root);

        let mut parent_index = 0;
        while self.states.len() < num_states {
            let Some(parent) = self.states.get(StateId::from(parent_index)).cloned() else {
                break;
            };
            // the child decides segment `start_segment + parent.depth`
            let segment = self.start_segment + parent.depth;
            let sleep = if parent.buffer > config.buffer.r_target {
                config.sleep_interval
            } else {
                0.0
            };

            for (action, &bitrate) in bitrates.iter().enumerate() {
                let download = bitrate / parent.bandwidth * fragment_duration;
                let bitrate_vector = if parent.at_shot_boundary() {
                    vec![action]
                } else {
                    let mut path = parent.bitrate_vector.clone();
                    path.push(action);
                    path
                };

                let child = MdpState {
                    depth: parent.depth + 1,
                    buffer: parent.buffer + fragment_duration - download - sleep,
                    bandwidth: parent.bandwidth,
                    bitrate_vector,
                    shot_persistence: tables.shot_persistence(segment).unwrap_or(1),
                    saliency: tables.saliency(segment).unwrap_or(1),
                    saliency_delta: tables.saliency_delta(segment).unwrap_or(0),
                };
                let id = self.states.allocate(child);
                debug_assert_eq!(id.index(), parent_index * self.quality_levels + action + 1);
            }
            parent_index += 1;
        }
    }

    /// Number of quality levels, i.e. actions per non-terminal state.
    pub fn quality_levels(&self) -> usize {
        self.quality_levels
    }

    /// Effective lookahead of this window.
    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// First segment decided by this window.
    pub fn start_segment(&self) -> usize {
        self.start_segment
    }

    /// Last segment decided by this window.
    pub fn end_segment(&self) -> usize {
        self.start_segment + self.lookahead - 1
    }

    /// Borrow one state of the tree.
    pub fn state(&self, state: StateId) -> Option<&MdpState> {
        self.states.get(state)
    }

    /// Absolute segment a state stands for; `None` for the root of a window at segment 0.
    pub fn segment_of(&self, state: StateId) -> Option<usize> {
        let depth = self.states.get(state)?.depth;
        (self.start_segment + depth).checked_sub(1)
    }

    /// Whether the state's segment is the last of the window.
    pub fn is_terminal(&self, state: StateId) -> bool {
        self.states
            .get(state)
            .is_none_or(|s| s.depth >= self.lookahead)
    }

    /// The individual reward terms of a transition, before weighting.
    pub fn reward_terms(
        &self,
        state: StateId,
        action: ActionId,
        next_state: StateId,
    ) -> Option<RewardTerms> {
        let current = self.states.get(state)?;
        let next = self.states.get(next_state)?;
        Some(self.rewards.terms(current, action.index(), next))
    }
}

impl Environment for AbrEnvironment {
    fn num_states(&self) -> usize {
        self.states.len()
    }

    fn max_num_actions(&self) -> usize {
        self.quality_levels
    }

    fn allowed_actions(&self, state: StateId) -> &[ActionId] {
        if self.is_terminal(state) {
            &[]
        } else {
            &self.actions
        }
    }

    fn next_state(&self, state: StateId, action: ActionId) -> StateId {
        StateId::from(state.index() * self.quality_levels + action.index() + 1)
    }

    fn reward(&self, state: StateId, action: ActionId, next_state: StateId) -> f64 {
        match (self.states.get(state), self.states.get(next_state)) {
            (Some(current), Some(next)) => self.rewards.reward(current, action.index(), next),
            _ => 0.0,
        }
    }
}
