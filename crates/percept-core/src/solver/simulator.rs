use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::solver::{
    environment::Environment,
    error::SolverError,
    ids::{ActionId, StateId},
    policy::Policy,
};

/// One simulated episode under a policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    /// `(state, action)` pairs taken from the start state.
    pub path: Vec<(StateId, ActionId)>,
    /// State the episode stopped in.
    pub last_state: StateId,
    /// Discounted sum of the rewards collected along `path`.
    pub total_return: f64,
}

#[derive(Debug, Clone)]
/// Seeded sampler that plays a learned policy against its environment.
/// Not used on the decision path; meant for evaluation and tests.
pub struct PolicySimulator<'a, E: Environment> {
    env: &'a E,
    policy: &'a Policy,
    gamma: f64,
    rng: ChaCha8Rng,
}

impl<'a, E: Environment> PolicySimulator<'a, E> {
    /// Create a simulator with deterministic RNG seed.
    pub fn new(env: &'a E, policy: &'a Policy, gamma: f64, seed: u64) -> Self {
        PolicySimulator {
            env,
            policy,
            gamma,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn next_sample(&mut self) -> f64 {
        (self.rng.next_u64() as f64) / ((u64::MAX as f64) + 1.0)
    }

    /// Sample one action for `state`, or `None` when the state has no legal action.
    pub fn act(&mut self, state: StateId) -> Option<ActionId> {
        let sample = self.next_sample();
        self.policy
            .sample(state, self.env.allowed_actions(state), sample)
    }

    /// Follow the policy from `start` until a terminal state or `max_steps`.
    pub fn rollout(&mut self, start: StateId, max_steps: usize) -> Result<Episode, SolverError> {
        let num_states = self.env.num_states();
        if start.index() >= num_states {
            return Err(SolverError::UnknownState {
                state: start,
                num_states,
            });
        }

        let mut state = start;
        let mut path = Vec::new();
        let mut total_return = 0.0;
        let mut discount = 1.0;

        for _ in 0..max_steps {
            let Some(action) = self.act(state) else {
                break;
            };
            let next_state = self.env.next_state(state, action);
            if next_state.index() >= num_states {
                return Err(SolverError::InvalidTransition {
                    state,
                    action,
                    next_state,
                });
            }

            total_return += discount * self.env.reward(state, action, next_state);
            discount *= self.gamma;
            path.push((state, action));
            state = next_state;
        }

        Ok(Episode {
            path,
            last_state: state,
            total_return,
        })
    }
}
