
use crate::{ActionId, Environment, StateId};

/// Full `branching`-ary tree of the given depth with one reward per child node.
/// Child of `s` under `a` is `s * branching + a + 1`; leaves are terminal.
#[derive(Debug)]
pub(super) struct TreeEnv {
    pub branching: usize,
    pub depth: usize,
    pub rewards: Vec<f64>,
    actions: Vec<ActionId>,
    depths: Vec<usize>,
}

impl TreeEnv {
    pub fn new(branching: usize, depth: usize, reward_of: impl Fn(usize) -> f64) -> Self {
        let mut depths = vec![0usize];
        let mut parent = 0;
        let mut level = 1;
        let mut total = 1;
        for _ in 0..depth {
            level *= branching;
            total += level;
        }
        while depths.len() < total {
            let child_depth = depths[parent] + 1;
            for _ in 0..branching {
                depths.push(child_depth);
            }
            parent += 1;
        }
        TreeEnv {
            branching,
            depth,
            rewards: (0..total).map(reward_of).collect(),
            actions: (0..branching).map(ActionId::from).collect(),
            depths,
        }
    }
}

impl Environment for TreeEnv {
    fn num_states(&self) -> usize {
        self.depths.len()
    }

    fn max_num_actions(&self) -> usize {
        self.branching
    }

    fn allowed_actions(&self, state: StateId) -> &[ActionId] {
        if self.depths[state.index()] == self.depth {
            &[]
        } else {
            &self.actions
        }
    }

    fn next_state(&self, state: StateId, action: ActionId) -> StateId {
        StateId::from(state.index() * self.branching + action.index() + 1)
    }

    fn reward(&self, _state: StateId, _action: ActionId, next_state: StateId) -> f64 {
        self.rewards[next_state.index()]
    }
}
