//! Sequential container marshaling.
//!
//! A native sequential container is presented to script code either as a
//! live view (a `TAG_SEQ` handle; reads and writes alias the one underlying
//! container) or as a disconnected snapshot table. View indexing is 1-based
//! to match the host convention regardless of the container's own storage.
//!
//! Writing one slot past the end grows the container by exactly one
//! element; writing further out faults without mutating anything.

use crate::heap::{ManagedObject, SeqCell};
use crate::marshal::{scalar_from_value, scalar_to_value, Scalar, ScalarElem};
use crate::space::ObjectSpace;
use std::any::Any;
use tether_core::value::{TAG_LIST, TAG_SEQ};
use tether_core::{Fault, FaultKind, Value};

/// Type-erased live sequential container.
pub trait SeqContainer: Any {
    fn len(&self) -> usize;
    /// 0-based element read; `None` past the end.
    fn get(&self, idx: usize) -> Option<Scalar>;
    /// 0-based in-range element write.
    fn set(&mut self, idx: usize, s: Scalar) -> Result<(), Fault>;
    /// Grow by one element.
    fn push(&mut self, s: Scalar) -> Result<(), Fault>;
    /// Replace the whole contents.
    fn assign(&mut self, items: Vec<Scalar>) -> Result<(), Fault>;
    fn snapshot(&self) -> Vec<Scalar>;
    fn as_any(&self) -> &dyn Any;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ScalarElem> SeqContainer for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, idx: usize) -> Option<Scalar> {
        self.as_slice().get(idx).map(|e| e.to_scalar())
    }

    fn set(&mut self, idx: usize, s: Scalar) -> Result<(), Fault> {
        let elem = T::from_scalar(s)?;
        match self.get_mut(idx) {
            Some(slot) => {
                *slot = elem;
                Ok(())
            }
            None => Err(Fault::new(FaultKind::IndexOutOfRange {
                index: idx as i64 + 1,
                len: Vec::len(self),
            })),
        }
    }

    fn push(&mut self, s: Scalar) -> Result<(), Fault> {
        let elem = T::from_scalar(s)?;
        Vec::push(self, elem);
        Ok(())
    }

    fn assign(&mut self, items: Vec<Scalar>) -> Result<(), Fault> {
        let mut elems = Vec::with_capacity(items.len());
        for s in items {
            elems.push(T::from_scalar(s)?);
        }
        *self = elems;
        Ok(())
    }

    fn snapshot(&self) -> Vec<Scalar> {
        self.iter().map(|e| e.to_scalar()).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ObjectSpace {
    /// Move a native sequential container into the space and return a live
    /// view handle onto it.
    pub fn bind_seq<C: SeqContainer>(&mut self, container: C) -> Value {
        let id = self
            .heap
            .alloc(ManagedObject::Seq(SeqCell::Owned(Box::new(container))));
        Value::seq(id)
    }

    /// Snapshot-table form: a disconnected copy, 1-based by construction.
    pub fn as_table<C: SeqContainer>(&mut self, container: &C) -> Value {
        let scalars = container.snapshot();
        let items: Vec<Value> = scalars
            .into_iter()
            .map(|s| scalar_to_value(self, s))
            .collect();
        self.new_list(items)
    }

    pub fn seq_len(&self, view: Value) -> Result<usize, Fault> {
        self.with_seq(view, |c| c.len())
    }

    /// 1-based read. Past-the-end reads return `VOID`, which is the
    /// iteration terminator.
    pub fn seq_get(&mut self, view: Value, index: i64) -> Result<Value, Fault> {
        if index < 1 {
            let len = self.seq_len(view)?;
            return Err(Fault::new(FaultKind::IndexOutOfRange { index, len }));
        }
        let scalar = self.with_seq(view, |c| c.get((index - 1) as usize))?;
        match scalar {
            Some(s) => Ok(scalar_to_value(self, s)),
            None => Ok(Value::VOID),
        }
    }

    /// 1-based write. Writing at `len + 1` appends one element; writing
    /// further past the end faults and the container is left untouched.
    pub fn seq_set(&mut self, view: Value, index: i64, item: Value) -> Result<(), Fault> {
        let len = self.seq_len(view)?;
        if index < 1 || index as usize > len + 1 {
            return Err(Fault::new(FaultKind::IndexOutOfRange { index, len }));
        }
        let s = scalar_from_value(self, item)?;
        let r = self.with_seq_mut(view, move |c| {
            if index as usize == len + 1 {
                c.push(s)
            } else {
                c.set((index - 1) as usize, s)
            }
        })?;
        r
    }

    /// Append one element (the `view[#view + 1] = x` idiom).
    pub fn seq_push(&mut self, view: Value, item: Value) -> Result<(), Fault> {
        let len = self.seq_len(view)?;
        self.seq_set(view, len as i64 + 1, item)
    }

    /// Replace the view's contents from a snapshot list or another view.
    pub fn seq_assign(&mut self, view: Value, items: Value) -> Result<(), Fault> {
        let scalars: Vec<Scalar> = match items.get_tag() {
            TAG_LIST => {
                let vals = self.list_items(items)?.to_vec();
                vals.into_iter()
                    .map(|v| scalar_from_value(self, v))
                    .collect::<Result<_, _>>()?
            }
            TAG_SEQ => self.with_seq(items, |c| c.snapshot())?,
            _ => {
                return Err(Fault::new(FaultKind::TypeMismatch {
                    expected: crate::errors::messages::EXPECTED_LIST_OR_SEQ.to_string(),
                    actual: items.type_name().to_string(),
                }))
            }
        };
        let r = self.with_seq_mut(view, move |c| c.assign(scalars))?;
        r
    }

    /// Disconnected snapshot of a live view.
    pub fn seq_snapshot(&mut self, view: Value) -> Result<Value, Fault> {
        let scalars = self.with_seq(view, |c| c.snapshot())?;
        let items: Vec<Value> = scalars
            .into_iter()
            .map(|s| scalar_to_value(self, s))
            .collect();
        Ok(self.new_list(items))
    }

    /// Typed copy-out for native-side inspection.
    pub fn seq_elems<T: ScalarElem>(&self, view: Value) -> Result<Vec<T>, Fault> {
        let scalars = self.with_seq(view, |c| c.snapshot())?;
        scalars.into_iter().map(T::from_scalar).collect()
    }

    pub(crate) fn with_seq<R>(
        &self,
        view: Value,
        f: impl FnOnce(&dyn SeqContainer) -> R,
    ) -> Result<R, Fault> {
        if view.get_tag() != TAG_SEQ {
            return Err(Fault::new(FaultKind::NotASequence(
                view.type_name().to_string(),
            )));
        }
        let id = view.as_obj_id();
        match self.heap.get(id) {
            Some(ManagedObject::Seq(SeqCell::Owned(c))) => Ok(f(&**c)),
            Some(ManagedObject::Seq(SeqCell::Projection { owner, member })) => {
                let (owner, member) = (*owner, *member);
                let class = match self.heap.get(owner) {
                    Some(ManagedObject::Native(oc)) => oc.class,
                    _ => return Err(Fault::new(FaultKind::StaleHandle)),
                };
                let proj = self.registry.seq_projector(class, member)?;
                let any = self.owned_native_any(owner)?;
                let c = proj
                    .seq_ref(any)
                    .ok_or_else(|| Fault::new(FaultKind::StaleHandle))?;
                Ok(f(c))
            }
            Some(ManagedObject::Seq(SeqCell::Dangling)) => {
                Err(Fault::new(FaultKind::StaleHandle))
            }
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    pub(crate) fn with_seq_mut<R>(
        &mut self,
        view: Value,
        f: impl FnOnce(&mut dyn SeqContainer) -> R,
    ) -> Result<R, Fault> {
        if view.get_tag() != TAG_SEQ {
            return Err(Fault::new(FaultKind::NotASequence(
                view.type_name().to_string(),
            )));
        }
        let id = view.as_obj_id();
        let place = match self.heap.get(id) {
            Some(ManagedObject::Seq(SeqCell::Owned(_))) => None,
            Some(ManagedObject::Seq(SeqCell::Projection { owner, member })) => {
                Some((*owner, *member))
            }
            Some(ManagedObject::Seq(SeqCell::Dangling)) => {
                return Err(Fault::new(FaultKind::StaleHandle))
            }
            _ => return Err(Fault::new(FaultKind::StaleHandle)),
        };
        match place {
            None => match self.heap.get_mut(id) {
                Some(ManagedObject::Seq(SeqCell::Owned(c))) => Ok(f(&mut **c)),
                _ => Err(Fault::new(FaultKind::StaleHandle)),
            },
            Some((owner, member)) => {
                let class = match self.heap.get(owner) {
                    Some(ManagedObject::Native(oc)) => oc.class,
                    _ => return Err(Fault::new(FaultKind::StaleHandle)),
                };
                let proj = self.registry.seq_projector(class, member)?;
                let any = self.owned_native_any_mut(owner)?;
                let c = proj
                    .seq_mut(any)
                    .ok_or_else(|| Fault::new(FaultKind::StaleHandle))?;
                Ok(f(c))
            }
        }
    }
}
