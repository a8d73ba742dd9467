use std::slice::Iter;

use crate::solver::ids::StateId;

/// Holds all states of an environment in one flat, cache friendly vector.
/// States are addressed by `StateId`, never by reference, so parent/child
/// relations are plain index arithmetic.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    storage: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena {
            storage: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    /// Create a new empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty storage able to hold `capacity` items without reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            storage: Vec::with_capacity(capacity),
        }
    }

    /// Allocate a new item to the storage and return the associated StateId
    pub fn allocate(&mut self, item: T) -> StateId {
        let id = StateId::from(self.storage.len());
        self.storage.push(item);
        id
    }

    /// Retrieve an associated item from the Arena
    pub fn get(&self, state_id: StateId) -> Option<&T> {
        self.storage.get(state_id.index())
    }

    /// Check the length of the Arena
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the Arena is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Iteration helper for the Arena
    pub fn iter(&self) -> Iter<'_, T> {
        self.storage.iter()
    }
}

/// Iteration support for Arena.
/// - `for x in &arena` (borrows items)
impl<'a, T> IntoIterator for &'a Arena<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.storage.iter()
    }
}
