//! Heap and collection.
//!
//! The heap is a slot arena: every script-visible object lives in one slot,
//! addressed by `ObjectId`. Collection is cooperative mark/sweep: nothing
//! is reclaimed until a collection cycle runs, and a native value's
//! destructor runs exactly once, when the sweep frees its owning cell.

use crate::class::ClassId;
use crate::lifetime::DependencyTable;
use crate::map::MapContainer;
use crate::seq::SeqContainer;
use std::any::Any;
use tether_core::{FastHashMap, ObjectId, Value};

/// Storage behind a native handle.
pub struct NativeCell {
    pub(crate) class: ClassId,
    pub(crate) data: NativeData,
}

pub enum NativeData {
    /// The handle owns the boxed native value; sweep drops it.
    Owned(Box<dyn Any>),
    /// Non-owning view of a member inside another handle's storage.
    Projection { owner: ObjectId, member: usize },
    /// Projection whose owner was collected. Resolves to a stale-handle fault.
    Dangling,
}

pub enum SeqCell {
    Owned(Box<dyn SeqContainer>),
    Projection { owner: ObjectId, member: usize },
    Dangling,
}

pub enum MapCell {
    Owned(Box<dyn MapContainer>),
    Projection { owner: ObjectId, member: usize },
    Dangling,
}

pub enum ManagedObject {
    Str(String),
    /// Snapshot table of a sequential container; disconnected copy.
    List(Vec<Value>),
    /// Snapshot table of an associative container; disconnected copy.
    Dict(FastHashMap<String, Value>),
    Native(NativeCell),
    /// Live view of a sequential container.
    Seq(SeqCell),
    /// Live view of an associative container.
    Map(MapCell),
}

impl ManagedObject {
    pub fn size(&self) -> usize {
        // Base size of the enum variant + deep size estimation
        let base = std::mem::size_of::<ManagedObject>();
        let deep = match self {
            ManagedObject::Str(s) => s.capacity() + 32,
            ManagedObject::List(v) => {
                v.len() * std::mem::size_of::<Value>()
                    + v.capacity() * std::mem::size_of::<Value>() / 4
                    + v.capacity() * 8 // Estimated allocator overhead
            }
            ManagedObject::Dict(d) => {
                let map_size = d.capacity()
                    * (std::mem::size_of::<String>() + std::mem::size_of::<Value>() + 16);
                let string_size: usize = d.keys().map(|s| s.capacity()).sum();
                map_size + string_size
            }
            ManagedObject::Native(cell) => match cell.data {
                NativeData::Owned(_) => 128, // boxed payload estimate
                _ => 16,
            },
            ManagedObject::Seq(cell) => match cell {
                SeqCell::Owned(c) => c.len() * 16 + 64,
                _ => 16,
            },
            ManagedObject::Map(cell) => match cell {
                MapCell::Owned(c) => c.len() * 48 + 64,
                _ => 16,
            },
        };
        base + deep
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HeapStats {
    pub live_objects: usize,
    pub free_slots: usize,
    pub alloc_bytes: usize,
}

pub struct Heap {
    pub(crate) objects: Vec<Option<ManagedObject>>,
    free_list: Vec<usize>,
    marks: Vec<u64>,
    pub(crate) alloc_count: usize,
    pub(crate) gc_threshold: usize,
    pub(crate) alloc_bytes: usize,
    pub(crate) gc_threshold_bytes: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self::with_thresholds(100_000, 32 * 1024 * 1024)
    }

    pub fn with_thresholds(gc_threshold: usize, gc_threshold_bytes: usize) -> Self {
        Self {
            objects: Vec::with_capacity(1024),
            free_list: Vec::new(),
            marks: Vec::new(),
            alloc_count: 0,
            gc_threshold,
            alloc_bytes: 0,
            gc_threshold_bytes,
        }
    }

    /// Allocate a managed object on the heap.
    pub fn alloc(&mut self, obj: ManagedObject) -> ObjectId {
        self.alloc_count += 1;
        self.alloc_bytes += obj.size();

        if let Some(id) = self.free_list.pop() {
            self.objects[id] = Some(obj);
            ObjectId(id)
        } else {
            let id = self.objects.len();
            self.objects.push(Some(obj));
            ObjectId(id)
        }
    }

    #[inline]
    pub fn should_gc(&self) -> bool {
        self.alloc_count >= self.gc_threshold || self.alloc_bytes >= self.gc_threshold_bytes
    }

    /// Returns `None` once the slot has been reclaimed.
    pub fn get(&self, id: ObjectId) -> Option<&ManagedObject> {
        self.objects.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ManagedObject> {
        self.objects.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    /// Whether the slot still holds the object a handle was issued for.
    /// Dangling projections are live slots but dead identities.
    pub(crate) fn is_identity_live(&self, id: ObjectId) -> bool {
        match self.get(id) {
            Some(ManagedObject::Native(cell)) => !matches!(cell.data, NativeData::Dangling),
            Some(ManagedObject::Seq(cell)) => !matches!(cell, SeqCell::Dangling),
            Some(ManagedObject::Map(cell)) => !matches!(cell, MapCell::Dangling),
            Some(_) => true,
            None => false,
        }
    }

    pub fn live_count(&self) -> usize {
        self.objects.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            live_objects: self.live_count(),
            free_slots: self.free_list.len(),
            alloc_bytes: self.alloc_bytes,
        }
    }

    pub(crate) fn is_marked(&self, id: ObjectId) -> bool {
        let word = id.0 >> 6;
        let bit = id.0 & 63;
        self.marks
            .get(word)
            .map_or(false, |w| (w & (1 << bit)) != 0)
    }

    fn set_mark(&mut self, id: ObjectId) -> bool {
        let word = id.0 >> 6;
        let bit = id.0 & 63;
        if word >= self.marks.len() {
            self.marks.resize(word + 1, 0);
        }
        let w = &mut self.marks[word];
        let mask = 1 << bit;
        if (*w & mask) != 0 {
            return false;
        }
        *w |= mask;
        true
    }

    /// Mark all objects reachable from the roots.
    ///
    /// Dependency edges are traced alongside ordinary children: marking a
    /// dependent also greys everything it registered as a dependency. That
    /// makes the registrar's table an ordinary part of the object graph, so
    /// mutual dependency cycles are reclaimed like any other cycle.
    pub(crate) fn mark_all(&mut self, roots: &[Value], deps: &DependencyTable) {
        self.marks.clear();

        let mut pending: Vec<Value> = roots.to_vec();
        while let Some(val) = pending.pop() {
            if !val.is_obj() {
                continue;
            }
            let id = val.as_obj_id();
            if id.0 >= self.objects.len() {
                continue;
            }
            if !self.set_mark(id) {
                continue;
            }
            match &self.objects[id.0] {
                Some(ManagedObject::List(items)) => pending.extend_from_slice(items),
                Some(ManagedObject::Dict(map)) => pending.extend(map.values().copied()),
                // Projections do not keep their owner alive; that is what
                // dependency edges are for.
                _ => {}
            }
            pending.extend_from_slice(deps.edges_of(id));
        }
    }

    /// Sweep unreachable objects, returning them so the space can run
    /// finalizers, and update thresholds.
    pub(crate) fn sweep(&mut self) -> Vec<ManagedObject> {
        let mut corpses = Vec::new();
        let mut live_bytes = 0;
        let mut live_count = 0;

        self.free_list.clear();

        for i in 0..self.objects.len() {
            if self.objects[i].is_none() {
                self.free_list.push(i);
                continue;
            }
            if !self.is_marked(ObjectId(i)) {
                if let Some(obj) = self.objects[i].take() {
                    corpses.push(obj);
                }
                self.free_list.push(i);
            } else if let Some(obj) = &self.objects[i] {
                live_bytes += obj.size();
                live_count += 1;
            }
        }
        self.marks.clear();

        self.invalidate_dangling_projections();

        self.alloc_count = 0;
        self.alloc_bytes = live_bytes;

        self.compact_if_needed();

        // Adaptive strategy:
        // If heap is small, grow fast (2x).
        // If heap is large, grow slower (1.5x) to avoid long pauses.
        let growth_factor = if live_bytes > 10 * 1024 * 1024 {
            1.5
        } else {
            2.0
        };

        self.gc_threshold = (live_count as f64 * growth_factor) as usize;
        self.gc_threshold = self.gc_threshold.max(32768);

        self.gc_threshold_bytes = (live_bytes as f64 * growth_factor) as usize;
        self.gc_threshold_bytes = self.gc_threshold_bytes.max(1024 * 1024); // Min 1MB

        corpses
    }

    /// Surviving projections whose owner died this cycle become dangling:
    /// the owner's slot may be reused by the next allocation, so the stale
    /// link must be severed now.
    fn invalidate_dangling_projections(&mut self) {
        let mut stale: Vec<usize> = Vec::new();
        for (i, slot) in self.objects.iter().enumerate() {
            let owner = match slot {
                Some(ManagedObject::Native(cell)) => match &cell.data {
                    NativeData::Projection { owner, .. } => Some(*owner),
                    _ => None,
                },
                Some(ManagedObject::Seq(SeqCell::Projection { owner, .. })) => Some(*owner),
                Some(ManagedObject::Map(MapCell::Projection { owner, .. })) => Some(*owner),
                _ => None,
            };
            if let Some(owner) = owner {
                let owner_dead = self
                    .objects
                    .get(owner.0)
                    .map_or(true, |slot| slot.is_none());
                if owner_dead {
                    stale.push(i);
                }
            }
        }
        for i in stale {
            match &mut self.objects[i] {
                Some(ManagedObject::Native(cell)) => cell.data = NativeData::Dangling,
                Some(ManagedObject::Seq(cell)) => *cell = SeqCell::Dangling,
                Some(ManagedObject::Map(cell)) => *cell = MapCell::Dangling,
                _ => {}
            }
        }
    }

    /// Only performs compaction if fragmentation is high to avoid
    /// unnecessary work.
    fn compact_if_needed(&mut self) {
        let total_slots = self.objects.len();
        let free_slots = self.free_list.len();

        if total_slots > 1000 && free_slots > total_slots / 2 {
            self.compact();
        }
    }

    /// Truncate trailing free slots and rebuild the free list.
    fn compact(&mut self) {
        let mut last_live = 0;
        for (i, obj) in self.objects.iter().enumerate() {
            if obj.is_some() {
                last_live = i;
            }
        }

        let new_len = last_live + 1;
        if new_len < self.objects.len() {
            self.objects.truncate(new_len);
            self.objects.shrink_to_fit();

            self.free_list.retain(|&idx| idx < new_len);
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
