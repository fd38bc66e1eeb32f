//! Lifetime dependency registrar.
//!
//! A dependency edge keeps one handle (the dependency) alive at least as
//! long as another (the dependent). Edges are auxiliary strong references
//! traced by the collector, not owning references: once the dependent is
//! unreachable the edge stops contributing, and both sides become
//! collectible in the same cycle.

use crate::heap::Heap;
use smallvec::SmallVec;
use tether_core::{fast_map_new, FastHashMap, ObjectId, Value};

pub struct DependencyTable {
    edges: FastHashMap<ObjectId, SmallVec<[Value; 2]>>,
}

impl DependencyTable {
    pub(crate) fn new() -> Self {
        Self {
            edges: fast_map_new(),
        }
    }

    /// Record `dependency` as kept-alive by `dependent`.
    /// Identical pairs are registered once; fan-in and fan-out are both fine.
    pub(crate) fn register(&mut self, dependent: ObjectId, dependency: Value) {
        let list = self.edges.entry(dependent).or_default();
        if !list.contains(&dependency) {
            list.push(dependency);
        }
    }

    pub(crate) fn edges_of(&self, id: ObjectId) -> &[Value] {
        self.edges.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Drop edge lists whose dependent was collected. Runs after every
    /// sweep so a reused slot never inherits a dead dependent's edges.
    pub(crate) fn retain_live(&mut self, heap: &Heap) {
        self.edges.retain(|id, _| heap.get(*id).is_some());
    }

    /// Total number of registered edges.
    pub fn len(&self) -> usize {
        self.edges.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
