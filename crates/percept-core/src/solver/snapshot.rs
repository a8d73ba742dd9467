use serde::Serialize;

use crate::solver::{ids::StateId, policy::Policy};

#[derive(Debug, Clone, Serialize)]
pub struct PolicySnapshot {
    pub schema_version: u32,
    pub num_states: usize,
    pub num_actions: usize,
    pub states: Vec<StateSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_id: usize,
    pub value: f64,
    pub probabilities: Vec<f64>,
    pub greedy_action: Option<usize>,
}

impl PolicySnapshot {
    /// Capture a policy table and its value function for diagnostics.
    pub fn capture(policy: &Policy, values: &[f64]) -> Self {
        let states = (0..policy.num_states())
            .map(|s| {
                let state = StateId::from(s);
                let probabilities = policy.row(state).map(<[f64]>::to_vec).unwrap_or_default();
                // terminal rows carry no mass and have no action to report
                let greedy_action = if probabilities.iter().any(|p| *p > 0.0) {
                    policy.greedy_action(state).map(|a| a.index())
                } else {
                    None
                };
                StateSnapshot {
                    state_id: s,
                    value: values.get(s).copied().unwrap_or(0.0),
                    probabilities,
                    greedy_action,
                }
            })
            .collect();

        PolicySnapshot {
            schema_version: 1,
            num_states: policy.num_states(),
            num_actions: policy.num_actions(),
            states,
        }
    }

    /// Serialize the snapshot as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
