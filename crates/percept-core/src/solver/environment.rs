use crate::solver::ids::{ActionId, StateId};

/// Contract between a finite, deterministic environment and the policy solver.
///
/// The solver only ever talks to an environment through these five queries,
/// so any finite state space whose transitions are a pure function of
/// `(state, action)` can be solved.
pub trait Environment {
    /// Return the number of states. States are indexed `0..num_states()`.
    fn num_states(&self) -> usize;

    /// Return the size of the widest action set over all states.
    fn max_num_actions(&self) -> usize;

    /// Return the legal actions of a state. Terminal states return an empty slice.
    fn allowed_actions(&self, state: StateId) -> &[ActionId];

    /// Return the unique successor of taking `action` in `state`.
    fn next_state(&self, state: StateId, action: ActionId) -> StateId;

    /// Return the reward of the transition `state --action--> next_state`.
    fn reward(&self, state: StateId, action: ActionId, next_state: StateId) -> f64;
}

impl<E: Environment + ?Sized> Environment for &E {
    fn num_states(&self) -> usize {
        (**self).num_states()
    }

    fn max_num_actions(&self) -> usize {
        (**self).max_num_actions()
    }

    fn allowed_actions(&self, state: StateId) -> &[ActionId] {
        (**self).allowed_actions(state)
    }

    fn next_state(&self, state: StateId, action: ActionId) -> StateId {
        (**self).next_state(state, action)
    }

    fn reward(&self, state: StateId, action: ActionId, next_state: StateId) -> f64 {
        (**self).reward(state, action, next_state)
    }
}
