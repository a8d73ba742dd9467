use serde::{Deserialize, Serialize};

/// A wrapper for the dense integer index of a state in an environment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(usize);

impl StateId {
    /// The root of every environment's state space.
    pub const ROOT: StateId = StateId(0);

    /// Get the value of the state index without exposing the inner field.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for StateId {
    /// Allow for explicit conversion from usize to StateId
    fn from(value: usize) -> Self {
        StateId(value)
    }
}

/// A wrapper for an integer index into a state's action list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(usize);

impl ActionId {
    /// Get the value of the action index without exposing the inner field.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for ActionId {
    /// Allow for explicit conversion from usize to ActionId
    fn from(value: usize) -> Self {
        ActionId(value)
    }
}
