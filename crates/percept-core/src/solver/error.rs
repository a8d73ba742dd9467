use std::fmt;

use crate::solver::ids::{ActionId, StateId};

/// Error type for policy solving over an environment.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The environment reported zero states.
    EmptyStateSpace,
    /// Discount factor outside `[0, 1]` or not finite.
    InvalidDiscount { gamma: f64 },
    /// Attempted to query a state id that does not exist in the environment.
    UnknownState { state: StateId, num_states: usize },
    /// The environment listed an action outside `[0, max_num_actions)`.
    InvalidAction {
        state: StateId,
        action: ActionId,
        num_actions: usize,
    },
    /// The environment returned a successor outside `[0, num_states)`.
    InvalidTransition {
        state: StateId,
        action: ActionId,
        next_state: StateId,
    },
    /// The environment returned a NaN or infinite reward.
    NonFiniteReward {
        state: StateId,
        action: ActionId,
        reward: f64,
    },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::EmptyStateSpace => write!(f, "environment has no states"),
            SolverError::InvalidDiscount { gamma } => {
                write!(f, "discount factor must be finite and within [0, 1], got {gamma}")
            }
            SolverError::UnknownState { state, num_states } => write!(
                f,
                "state {} does not exist in an environment with {} states",
                state.index(),
                num_states
            ),
            SolverError::InvalidAction {
                state,
                action,
                num_actions,
            } => write!(
                f,
                "state {} allows action {} but the environment only has {} actions",
                state.index(),
                action.index(),
                num_actions
            ),
            SolverError::InvalidTransition {
                state,
                action,
                next_state,
            } => write!(
                f,
                "action {} on state {} leads to unknown state {}",
                action.index(),
                state.index(),
                next_state.index()
            ),
            SolverError::NonFiniteReward {
                state,
                action,
                reward,
            } => write!(
                f,
                "action {} on state {} produced non-finite reward {}",
                action.index(),
                state.index(),
                reward
            ),
        }
    }
}

impl std::error::Error for SolverError {}
