// src/queue.rs

//! Ordered id sequence used throughout the planner
//!
//! `IdQueue` is the common currency between the universe, the solver
//! interface, and the transaction: an append-only, possibly-repeating list
//! of package ids where insertion order is significant. Before an ordering
//! pass it encodes decision order; afterwards, execution order.

use crate::universe::PackageId;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Ordered, possibly-repeating sequence of package ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdQueue {
    ids: Vec<PackageId>,
}

impl IdQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Create a queue with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
        }
    }

    /// Append an id to the end of the queue
    pub fn push(&mut self, id: PackageId) {
        self.ids.push(id);
    }

    /// Remove all ids, keeping allocated capacity
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Number of ids in the queue (duplicates counted)
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if the queue holds no ids
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True if the queue contains the given id at least once
    pub fn contains(&self, id: PackageId) -> bool {
        self.ids.contains(&id)
    }

    /// Iterate over the ids in order
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, PackageId>> {
        self.ids.iter().copied()
    }

    /// View the queue as a slice
    pub fn as_slice(&self) -> &[PackageId] {
        &self.ids
    }
}

impl Index<usize> for IdQueue {
    type Output = PackageId;

    fn index(&self, index: usize) -> &PackageId {
        &self.ids[index]
    }
}

impl FromIterator<PackageId> for IdQueue {
    fn from_iter<I: IntoIterator<Item = PackageId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Extend<PackageId> for IdQueue {
    fn extend<I: IntoIterator<Item = PackageId>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}

impl IntoIterator for IdQueue {
    type Item = PackageId;
    type IntoIter = std::vec::IntoIter<PackageId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

impl<'a> IntoIterator for &'a IdQueue {
    type Item = PackageId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, PackageId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<Vec<PackageId>> for IdQueue {
    fn from(ids: Vec<PackageId>) -> Self {
        Self { ids }
    }
}
