use crate::solver::{
    environment::Environment,
    ids::{ActionId, StateId},
};

#[derive(Debug, Clone, PartialEq)]
/// Stochastic policy table `pi(action | state)`.
///
/// Stored row-major by state so the probabilities of one state's actions are
/// contiguous. Actions a state does not allow always hold probability 0.
pub struct Policy {
    num_states: usize,
    num_actions: usize,
    probs: Vec<f64>,
}

impl Policy {
    /// Create a policy where every probability is 0.
    pub fn zeros(num_states: usize, num_actions: usize) -> Self {
        Policy {
            num_states,
            num_actions,
            probs: vec![0.0; num_states * num_actions],
        }
    }

    /// Create the uniform random policy over each state's legal actions.
    /// Actions outside `[0, max_num_actions)` are ignored.
    pub fn uniform<E: Environment>(env: &E) -> Self {
        let mut policy = Policy::zeros(env.num_states(), env.max_num_actions());
        for s in 0..policy.num_states {
            let state = StateId::from(s);
            let allowed = env.allowed_actions(state);
            if allowed.is_empty() {
                continue;
            }
            let share = 1.0 / allowed.len() as f64;
            let row = policy.row_mut(state);
            for action in allowed {
                if let Some(p) = row.get_mut(action.index()) {
                    *p = share;
                }
            }
        }
        policy
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Probability of `action` in `state`; 0 for anything out of range.
    pub fn prob(&self, state: StateId, action: ActionId) -> f64 {
        if state.index() >= self.num_states || action.index() >= self.num_actions {
            return 0.0;
        }
        self.probs[state.index() * self.num_actions + action.index()]
    }

    /// The action probabilities of one state.
    pub fn row(&self, state: StateId) -> Option<&[f64]> {
        if state.index() >= self.num_states {
            return None;
        }
        let start = state.index() * self.num_actions;
        Some(&self.probs[start..start + self.num_actions])
    }

    pub(crate) fn row_mut(&mut self, state: StateId) -> &mut [f64] {
        let start = state.index() * self.num_actions;
        &mut self.probs[start..start + self.num_actions]
    }

    /// Flat view of the table, row-major by state.
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }

    /// Pick the most probable action of a state.
    /// Ties keep the first (lowest) action; an all-zero row yields action 0.
    pub fn greedy_action(&self, state: StateId) -> Option<ActionId> {
        let row = self.row(state)?;
        let mut best_idx = 0;
        let mut best_prob = 0.0;
        for (i, &p) in row.iter().enumerate() {
            if p > best_prob {
                best_prob = p;
                best_idx = i;
            }
        }
        Some(ActionId::from(best_idx))
    }

    /// Sample an action of `state` by inverse CDF over `allowed`, using a
    /// uniform sample in `[0, 1)`. Zero-probability actions are never drawn.
    pub fn sample(&self, state: StateId, allowed: &[ActionId], sample: f64) -> Option<ActionId> {
        let mut cumulative = 0.0;
        let mut last_positive = None;

        for &action in allowed {
            let p = self.prob(state, action);
            if p <= 0.0 {
                continue;
            }
            cumulative += p;
            last_positive = Some(action);
            if cumulative >= sample {
                return Some(action);
            }
        }

        // rounding left the CDF short of the sample
        last_positive
    }

    /// Mean squared difference between two tables of the same shape.
    /// Tables of different shapes are infinitely far apart.
    pub fn mean_squared_error(&self, other: &Policy) -> f64 {
        if self.num_states != other.num_states || self.num_actions != other.num_actions {
            return f64::INFINITY;
        }
        if self.probs.is_empty() {
            return 0.0;
        }

        let sum: f64 = self
            .probs
            .iter()
            .zip(&other.probs)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        sum / self.probs.len() as f64
    }
}
