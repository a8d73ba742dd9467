use std::cmp::Ordering;

use crate::solver::{
    environment::Environment,
    error::SolverError,
    ids::{ActionId, StateId},
    policy::Policy,
};

#[derive(Debug, Clone)]
/// Dynamic programming agent running policy iteration over an `Environment`.
///
/// Each call to `learn` performs one synchronous evaluation sweep followed by
/// one greedy improvement. The value function of the previous sweep is kept
/// so the driver can tell when the values have settled; see `solve`.
pub struct DpAgent<'a, E: Environment> {
    env: &'a E,
    gamma: f64,
    values: Vec<f64>,
    previous_values: Vec<f64>,
    policy: Policy,
}

impl<'a, E: Environment> DpAgent<'a, E> {
    /// Allocate a zero value function and seed the uniform random policy.
    pub fn new(env: &'a E, gamma: f64) -> Result<Self, SolverError> {
        if !gamma.is_finite() || !(0.0..=1.0).contains(&gamma) {
            return Err(SolverError::InvalidDiscount { gamma });
        }
        let num_states = env.num_states();
        if num_states == 0 {
            return Err(SolverError::EmptyStateSpace);
        }

        Ok(DpAgent {
            env,
            gamma,
            values: vec![0.0; num_states],
            previous_values: vec![0.0; num_states],
            policy: Policy::uniform(env),
        })
    }

    /// Discount factor used for every backup.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Current value function, one entry per state.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Largest absolute change of any state value during the last sweep.
    pub fn value_change(&self) -> f64 {
        self.values
            .iter()
            .zip(&self.previous_values)
            .map(|(v, p)| (v - p).abs())
            .fold(0.0, f64::max)
    }

    /// Current policy table.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Release the learned policy and value function.
    pub fn into_parts(self) -> (Policy, Vec<f64>) {
        (self.policy, self.values)
    }

    /// Resolve one transition, checking the environment keeps its contract.
    fn transition(&self, state: StateId, action: ActionId) -> Result<(StateId, f64), SolverError> {
        let num_actions = self.env.max_num_actions();
        if action.index() >= num_actions {
            return Err(SolverError::InvalidAction {
                state,
                action,
                num_actions,
            });
        }

        let next_state = self.env.next_state(state, action);
        if next_state.index() >= self.values.len() {
            return Err(SolverError::InvalidTransition {
                state,
                action,
                next_state,
            });
        }

        let reward = self.env.reward(state, action, next_state);
        if !reward.is_finite() {
            return Err(SolverError::NonFiniteReward {
                state,
                action,
                reward,
            });
        }

        Ok((next_state, reward))
    }

    /// `reward + gamma * V(next)` for one legal action under the current values.
    pub fn action_value(&self, state: StateId, action: ActionId) -> Result<f64, SolverError> {
        self.check_state(state)?;
        let (next_state, reward) = self.transition(state, action)?;
        Ok(reward + self.gamma * self.values[next_state.index()])
    }

    fn check_state(&self, state: StateId) -> Result<(), SolverError> {
        if state.index() >= self.values.len() {
            return Err(SolverError::UnknownState {
                state,
                num_states: self.values.len(),
            });
        }
        Ok(())
    }

    /// One synchronous Bellman expectation sweep.
    /// Every backup reads the previous sweep's values; the buffers swap at the end.
    pub fn evaluate_policy(&mut self) -> Result<(), SolverError> {
        let env = self.env;
        let mut next_values = std::mem::take(&mut self.previous_values);
        next_values.clear();
        next_values.resize(self.values.len(), 0.0);

        for (s, slot) in next_values.iter_mut().enumerate() {
            let state = StateId::from(s);
            let mut v = 0.0;
            for &action in env.allowed_actions(state) {
                let prob = self.policy.prob(state, action);
                if prob == 0.0 {
                    continue;
                }
                let (next_state, reward) = self.transition(state, action)?;
                v += prob * (reward + self.gamma * self.values[next_state.index()]);
            }
            *slot = v;
        }

        self.previous_values = std::mem::replace(&mut self.values, next_values);
        Ok(())
    }

    /// Make the policy greedy with respect to the current value function.
    ///
    /// Actions whose value compares equal to the maximum under `f64::total_cmp`
    /// share the probability mass uniformly. The comparison is exact on purpose
    /// so ties resolve identically on every platform.
    pub fn update_policy(&mut self) -> Result<(), SolverError> {
        let env = self.env;
        let mut action_values: Vec<f64> = Vec::with_capacity(env.max_num_actions());

        for s in 0..self.values.len() {
            let state = StateId::from(s);
            let allowed = env.allowed_actions(state);

            action_values.clear();
            let mut best: Option<f64> = None;
            let mut ties = 0usize;
            for &action in allowed {
                let (next_state, reward) = self.transition(state, action)?;
                let q = reward + self.gamma * self.values[next_state.index()];
                action_values.push(q);

                match best {
                    None => {
                        best = Some(q);
                        ties = 1;
                    }
                    Some(current) => match q.total_cmp(&current) {
                        Ordering::Greater => {
                            best = Some(q);
                            ties = 1;
                        }
                        Ordering::Equal => ties += 1,
                        Ordering::Less => {}
                    },
                }
            }

            let row = self.policy.row_mut(state);
            row.fill(0.0);
            if let Some(best) = best {
                let share = 1.0 / ties as f64;
                for (action, q) in allowed.iter().zip(&action_values) {
                    if q.total_cmp(&best) == Ordering::Equal {
                        row[action.index()] = share;
                    }
                }
            }
        }

        Ok(())
    }

    /// One round of policy iteration: evaluate, then improve.
    pub fn learn(&mut self) -> Result<(), SolverError> {
        self.evaluate_policy()?;
        self.update_policy()
    }

    /// Sample an action from the policy of `state` using a uniform sample in `[0, 1)`.
    /// Returns `None` for states without legal actions.
    pub fn act(&self, state: StateId, sample: f64) -> Result<Option<ActionId>, SolverError> {
        self.check_state(state)?;
        let allowed = self.env.allowed_actions(state);
        Ok(self.policy.sample(state, allowed, sample))
    }
}
