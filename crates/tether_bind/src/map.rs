//! Associative container marshaling.
//!
//! Mirrors the sequential side: a live string-keyed view (`TAG_MAP`) that
//! aliases the one underlying container, or a disconnected snapshot dict.

use crate::heap::{ManagedObject, MapCell};
use crate::marshal::{scalar_from_value, scalar_to_value, Scalar, ScalarElem};
use crate::space::ObjectSpace;
use std::any::Any;
use tether_core::value::{TAG_DICT, TAG_MAP};
use tether_core::{fast_map_with_capacity, Fault, FaultKind, FastHashMap, Value};

/// Type-erased live associative container.
pub trait MapContainer: Any {
    fn len(&self) -> usize;
    fn get(&self, key: &str) -> Option<Scalar>;
    fn insert(&mut self, key: String, s: Scalar) -> Result<(), Fault>;
    fn remove(&mut self, key: &str) -> Option<Scalar>;
    fn keys(&self) -> Vec<String>;
    fn snapshot(&self) -> Vec<(String, Scalar)>;
    /// Replace the whole contents.
    fn assign(&mut self, items: Vec<(String, Scalar)>) -> Result<(), Fault>;
    fn as_any(&self) -> &dyn Any;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ScalarElem> MapContainer for FastHashMap<String, T> {
    fn len(&self) -> usize {
        FastHashMap::len(self)
    }

    fn get(&self, key: &str) -> Option<Scalar> {
        FastHashMap::get(self, key).map(|e| e.to_scalar())
    }

    fn insert(&mut self, key: String, s: Scalar) -> Result<(), Fault> {
        let elem = T::from_scalar(s)?;
        FastHashMap::insert(self, key, elem);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Option<Scalar> {
        FastHashMap::remove(self, key).map(|e| e.to_scalar())
    }

    fn keys(&self) -> Vec<String> {
        FastHashMap::keys(self).cloned().collect()
    }

    fn snapshot(&self) -> Vec<(String, Scalar)> {
        self.iter().map(|(k, v)| (k.clone(), v.to_scalar())).collect()
    }

    fn assign(&mut self, items: Vec<(String, Scalar)>) -> Result<(), Fault> {
        let mut next = fast_map_with_capacity(items.len());
        for (k, s) in items {
            next.insert(k, T::from_scalar(s)?);
        }
        *self = next;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: ScalarElem> MapContainer for std::collections::HashMap<String, T> {
    fn len(&self) -> usize {
        std::collections::HashMap::len(self)
    }

    fn get(&self, key: &str) -> Option<Scalar> {
        std::collections::HashMap::get(self, key).map(|e| e.to_scalar())
    }

    fn insert(&mut self, key: String, s: Scalar) -> Result<(), Fault> {
        let elem = T::from_scalar(s)?;
        std::collections::HashMap::insert(self, key, elem);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Option<Scalar> {
        std::collections::HashMap::remove(self, key).map(|e| e.to_scalar())
    }

    fn keys(&self) -> Vec<String> {
        std::collections::HashMap::keys(self).cloned().collect()
    }

    fn snapshot(&self) -> Vec<(String, Scalar)> {
        self.iter().map(|(k, v)| (k.clone(), v.to_scalar())).collect()
    }

    fn assign(&mut self, items: Vec<(String, Scalar)>) -> Result<(), Fault> {
        let mut next = std::collections::HashMap::with_capacity(items.len());
        for (k, s) in items {
            next.insert(k, T::from_scalar(s)?);
        }
        *self = next;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ObjectSpace {
    /// Move a native associative container into the space and return a live
    /// view handle onto it.
    pub fn bind_map<C: MapContainer>(&mut self, container: C) -> Value {
        let id = self
            .heap
            .alloc(ManagedObject::Map(MapCell::Owned(Box::new(container))));
        Value::map(id)
    }

    /// Snapshot-table form of an associative container.
    pub fn as_table_map<C: MapContainer>(&mut self, container: &C) -> Value {
        let entries = container.snapshot();
        let mut dict = fast_map_with_capacity(entries.len());
        for (k, s) in entries {
            let v = scalar_to_value(self, s);
            dict.insert(k, v);
        }
        self.new_dict(dict)
    }

    pub fn map_len(&self, view: Value) -> Result<usize, Fault> {
        self.with_map(view, |c| c.len())
    }

    /// Missing keys read as `VOID`.
    pub fn map_get(&mut self, view: Value, key: &str) -> Result<Value, Fault> {
        let scalar = self.with_map(view, |c| c.get(key))?;
        match scalar {
            Some(s) => Ok(scalar_to_value(self, s)),
            None => Ok(Value::VOID),
        }
    }

    pub fn map_insert(&mut self, view: Value, key: &str, item: Value) -> Result<(), Fault> {
        let s = scalar_from_value(self, item)?;
        let key = key.to_string();
        let r = self.with_map_mut(view, move |c| c.insert(key, s))?;
        r
    }

    /// Removes a key, returning its value or `VOID`.
    pub fn map_remove(&mut self, view: Value, key: &str) -> Result<Value, Fault> {
        let scalar = self.with_map_mut(view, |c| c.remove(key))?;
        match scalar {
            Some(s) => Ok(scalar_to_value(self, s)),
            None => Ok(Value::VOID),
        }
    }

    pub fn map_keys(&self, view: Value) -> Result<Vec<String>, Fault> {
        self.with_map(view, |c| c.keys())
    }

    /// Disconnected snapshot of a live view.
    pub fn map_snapshot(&mut self, view: Value) -> Result<Value, Fault> {
        let entries = self.with_map(view, |c| c.snapshot())?;
        let mut dict = fast_map_with_capacity(entries.len());
        for (k, s) in entries {
            let v = scalar_to_value(self, s);
            dict.insert(k, v);
        }
        Ok(self.new_dict(dict))
    }

    /// Replace the view's contents from a snapshot dict or another view.
    pub fn map_assign(&mut self, view: Value, items: Value) -> Result<(), Fault> {
        let entries: Vec<(String, Scalar)> = match items.get_tag() {
            TAG_DICT => {
                let pairs = self.dict_items(items)?;
                pairs
                    .into_iter()
                    .map(|(k, v)| scalar_from_value(self, v).map(|s| (k, s)))
                    .collect::<Result<_, _>>()?
            }
            TAG_MAP => self.with_map(items, |c| c.snapshot())?,
            _ => {
                return Err(Fault::new(FaultKind::TypeMismatch {
                    expected: crate::errors::messages::EXPECTED_DICT_OR_MAP.to_string(),
                    actual: items.type_name().to_string(),
                }))
            }
        };
        let r = self.with_map_mut(view, move |c| c.assign(entries))?;
        r
    }

    pub(crate) fn with_map<R>(
        &self,
        view: Value,
        f: impl FnOnce(&dyn MapContainer) -> R,
    ) -> Result<R, Fault> {
        if view.get_tag() != TAG_MAP {
            return Err(Fault::new(FaultKind::NotAMap(view.type_name().to_string())));
        }
        let id = view.as_obj_id();
        match self.heap.get(id) {
            Some(ManagedObject::Map(MapCell::Owned(c))) => Ok(f(&**c)),
            Some(ManagedObject::Map(MapCell::Projection { owner, member })) => {
                let (owner, member) = (*owner, *member);
                let class = match self.heap.get(owner) {
                    Some(ManagedObject::Native(oc)) => oc.class,
                    _ => return Err(Fault::new(FaultKind::StaleHandle)),
                };
                let proj = self.registry.map_projector(class, member)?;
                let any = self.owned_native_any(owner)?;
                let c = proj
                    .map_ref(any)
                    .ok_or_else(|| Fault::new(FaultKind::StaleHandle))?;
                Ok(f(c))
            }
            Some(ManagedObject::Map(MapCell::Dangling)) => Err(Fault::new(FaultKind::StaleHandle)),
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    pub(crate) fn with_map_mut<R>(
        &mut self,
        view: Value,
        f: impl FnOnce(&mut dyn MapContainer) -> R,
    ) -> Result<R, Fault> {
        if view.get_tag() != TAG_MAP {
            return Err(Fault::new(FaultKind::NotAMap(view.type_name().to_string())));
        }
        let id = view.as_obj_id();
        let place = match self.heap.get(id) {
            Some(ManagedObject::Map(MapCell::Owned(_))) => None,
            Some(ManagedObject::Map(MapCell::Projection { owner, member })) => {
                Some((*owner, *member))
            }
            Some(ManagedObject::Map(MapCell::Dangling)) => {
                return Err(Fault::new(FaultKind::StaleHandle))
            }
            _ => return Err(Fault::new(FaultKind::StaleHandle)),
        };
        match place {
            None => match self.heap.get_mut(id) {
                Some(ManagedObject::Map(MapCell::Owned(c))) => Ok(f(&mut **c)),
                _ => Err(Fault::new(FaultKind::StaleHandle)),
            },
            Some((owner, member)) => {
                let class = match self.heap.get(owner) {
                    Some(ManagedObject::Native(oc)) => oc.class,
                    _ => return Err(Fault::new(FaultKind::StaleHandle)),
                };
                let proj = self.registry.map_projector(class, member)?;
                let any = self.owned_native_any_mut(owner)?;
                let c = proj
                    .map_mut(any)
                    .ok_or_else(|| Fault::new(FaultKind::StaleHandle))?;
                Ok(f(c))
            }
        }
    }
}
