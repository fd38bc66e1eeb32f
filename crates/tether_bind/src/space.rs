//! The object space.
//!
//! `ObjectSpace` owns the heap, the class/function registry, the dependency
//! table, the named globals (script-visible roots), and the value stack all
//! bound calls marshal through. It is the single-threaded execution context:
//! every native-to-script call and every collector-driven finalization runs
//! on the thread that owns it.

use crate::call::CallWindow;
use crate::class::{ClassId, ClassSpec, GetFn, MapProject, MemberKind, MemberProject, SeqProject};
use crate::errors::messages;
use crate::filters::FilterChain;
use crate::heap::{Heap, ManagedObject, MapCell, NativeCell, NativeData, SeqCell};
use crate::lifetime::DependencyTable;
use crate::registry::{AddrKey, FunctionSpec, Registry};
use crate::util::value_to_string;
use std::any::{Any, TypeId};
use std::rc::Rc;
use tether_core::value::{TAG_DICT, TAG_LIST, TAG_NATIVE, TAG_STR};
use tether_core::{fast_map_new, Fault, FastHashMap, FaultKind, ObjectId, Value};

/// Object space configuration.
#[derive(Clone, Copy, Debug)]
pub struct SpaceConfig {
    /// Collect automatically when allocation thresholds trip at a call
    /// boundary. Explicit `collect()` works either way.
    pub gc_auto: bool,
    pub gc_threshold: usize,
    pub gc_threshold_bytes: usize,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            gc_auto: true,
            gc_threshold: 100_000,
            gc_threshold_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpaceStats {
    pub live_objects: usize,
    pub free_slots: usize,
    pub alloc_bytes: usize,
    pub dependency_edges: usize,
}

pub struct ObjectSpace {
    pub(crate) heap: Heap,
    pub(crate) registry: Registry,
    pub(crate) deps: DependencyTable,
    pub(crate) stack: Vec<Value>,
    globals: FastHashMap<String, Value>,
    /// Temporary GC roots for values not yet stored anywhere script-visible.
    temp_roots: Vec<Value>,
    config: SpaceConfig,
}

impl ObjectSpace {
    pub fn new() -> Self {
        Self::with_config(SpaceConfig::default())
    }

    pub fn with_config(config: SpaceConfig) -> Self {
        Self {
            heap: Heap::with_thresholds(config.gc_threshold, config.gc_threshold_bytes),
            registry: Registry::new(),
            deps: DependencyTable::new(),
            stack: Vec::new(),
            globals: fast_map_new(),
            temp_roots: Vec::new(),
            config,
        }
    }

    // ---- registration ----

    pub fn register_class<T: 'static>(&mut self, spec: ClassSpec<T>) -> ClassId {
        self.registry.register(spec.into_decl())
    }

    pub fn set_function(
        &mut self,
        name: &str,
        f: impl Fn(&mut ObjectSpace, &[Value]) -> Result<Value, Fault> + 'static,
    ) {
        self.set_function_with(name, f, FilterChain::new());
    }

    pub fn set_function_with(
        &mut self,
        name: &str,
        f: impl Fn(&mut ObjectSpace, &[Value]) -> Result<Value, Fault> + 'static,
        filters: FilterChain,
    ) {
        self.registry.set_function(
            name,
            FunctionSpec {
                func: Rc::new(f),
                filters,
            },
        );
    }

    // ---- globals: the script-visible roots ----

    pub fn set_global(&mut self, name: &str, v: Value) {
        self.globals.insert(name.to_string(), v);
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    /// Dropping the last global reference is how script code releases a
    /// handle; the object stays alive until a collection cycle runs.
    pub fn clear_global(&mut self, name: &str) {
        self.globals.remove(name);
    }

    /// Root a value that script code has not stored anywhere yet, e.g. a
    /// call result held only on the native side.
    pub fn protect(&mut self, v: Value) {
        self.temp_roots.push(v);
    }

    pub fn unprotect(&mut self, v: Value) {
        if let Some(pos) = self.temp_roots.iter().rposition(|r| *r == v) {
            self.temp_roots.remove(pos);
        }
    }

    // ---- allocation helpers ----

    pub fn new_str(&mut self, s: &str) -> Value {
        Value::str(self.heap.alloc(ManagedObject::Str(s.to_string())))
    }

    pub fn new_list(&mut self, items: Vec<Value>) -> Value {
        Value::list(self.heap.alloc(ManagedObject::List(items)))
    }

    pub fn new_dict(&mut self, entries: FastHashMap<String, Value>) -> Value {
        Value::dict(self.heap.alloc(ManagedObject::Dict(entries)))
    }

    pub fn str_contents(&self, v: Value) -> Result<&str, Fault> {
        if v.get_tag() != TAG_STR {
            return Err(Fault::new(FaultKind::TypeMismatch {
                expected: "string".to_string(),
                actual: v.type_name().to_string(),
            }));
        }
        match self.heap.get(v.as_obj_id()) {
            Some(ManagedObject::Str(s)) => Ok(s),
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    pub fn list_items(&self, v: Value) -> Result<&[Value], Fault> {
        if v.get_tag() != TAG_LIST {
            return Err(Fault::new(FaultKind::TypeMismatch {
                expected: "list".to_string(),
                actual: v.type_name().to_string(),
            }));
        }
        match self.heap.get(v.as_obj_id()) {
            Some(ManagedObject::List(items)) => Ok(items),
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    pub fn dict_len(&self, v: Value) -> Result<usize, Fault> {
        Ok(self.dict_ref(v)?.len())
    }

    /// Missing keys read as `VOID`.
    pub fn dict_get(&self, v: Value, key: &str) -> Result<Value, Fault> {
        Ok(self.dict_ref(v)?.get(key).copied().unwrap_or(Value::VOID))
    }

    pub(crate) fn dict_items(&self, v: Value) -> Result<Vec<(String, Value)>, Fault> {
        Ok(self
            .dict_ref(v)?
            .iter()
            .map(|(k, val)| (k.clone(), *val))
            .collect())
    }

    fn dict_ref(&self, v: Value) -> Result<&FastHashMap<String, Value>, Fault> {
        if v.get_tag() != TAG_DICT {
            return Err(Fault::new(FaultKind::TypeMismatch {
                expected: "dict".to_string(),
                actual: v.type_name().to_string(),
            }));
        }
        match self.heap.get(v.as_obj_id()) {
            Some(ManagedObject::Dict(d)) => Ok(d),
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    // ---- handle registry ----

    /// Push a native value into the object space, producing its managed
    /// handle. The value's type must be a registered class.
    pub fn create_handle<T: 'static>(&mut self, value: T) -> Result<Value, Fault> {
        let class = self
            .registry
            .class_id_by_type(TypeId::of::<T>())
            .ok_or_else(|| {
                Fault::new(FaultKind::UnknownClass(std::any::type_name::<T>().to_string()))
            })?;
        Ok(self.alloc_native_owned(class, Box::new(value)))
    }

    pub(crate) fn alloc_native_owned(&mut self, class: ClassId, boxed: Box<dyn Any>) -> Value {
        let addr = {
            let any: &dyn Any = boxed.as_ref();
            any as *const dyn Any as *const () as usize
        };
        let id = self.heap.alloc(ManagedObject::Native(NativeCell {
            class,
            data: NativeData::Owned(boxed),
        }));
        self.registry.record_addr(AddrKey::Owner(addr), id);
        Value::native(id)
    }

    /// The managed handle already issued for the owned native value at
    /// `addr`, if it is still alive.
    pub fn handle_for(&self, addr: usize) -> Option<Value> {
        let id = self.registry.lookup_addr(AddrKey::Owner(addr))?;
        if !self.heap.is_identity_live(id) {
            return None;
        }
        Some(Value::native(id))
    }

    /// Borrow the native value behind a handle. Works for owned handles and
    /// member projections alike.
    pub fn native_ref<T: 'static>(&self, v: Value) -> Result<&T, Fault> {
        let (any, class) = self.native_any(v)?;
        let name = &self.registry.class(class).name;
        any.downcast_ref::<T>().ok_or_else(|| {
            Fault::new(FaultKind::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                actual: name.clone(),
            })
        })
    }

    pub fn native_mut<T: 'static>(&mut self, v: Value) -> Result<&mut T, Fault> {
        let id = self.expect_native(v)?;
        enum Place {
            Own,
            Proj {
                owner: ObjectId,
                owner_class: ClassId,
                member: usize,
            },
        }
        let (place, class_name) = match self.heap.get(id) {
            Some(ManagedObject::Native(cell)) => {
                let name = self.registry.class(cell.class).name.clone();
                match &cell.data {
                    NativeData::Owned(_) => (Place::Own, name),
                    NativeData::Projection { owner, member } => {
                        let owner_class = match self.heap.get(*owner) {
                            Some(ManagedObject::Native(oc)) => oc.class,
                            _ => return Err(Fault::new(FaultKind::StaleHandle)),
                        };
                        (
                            Place::Proj {
                                owner: *owner,
                                owner_class,
                                member: *member,
                            },
                            name,
                        )
                    }
                    NativeData::Dangling => return Err(Fault::new(FaultKind::StaleHandle)),
                }
            }
            _ => return Err(Fault::new(FaultKind::StaleHandle)),
        };
        let any: &mut dyn Any = match place {
            Place::Own => match self.heap.get_mut(id) {
                Some(ManagedObject::Native(cell)) => match &mut cell.data {
                    NativeData::Owned(b) => b.as_mut(),
                    _ => return Err(Fault::new(FaultKind::StaleHandle)),
                },
                _ => return Err(Fault::new(FaultKind::StaleHandle)),
            },
            Place::Proj {
                owner,
                owner_class,
                member,
            } => {
                let proj = self.registry.object_projector(owner_class, member)?;
                let owner_any = self.owned_native_any_mut(owner)?;
                proj.member_mut(owner_any)
                    .ok_or_else(|| Fault::new(FaultKind::StaleHandle))?
            }
        };
        any.downcast_mut::<T>().ok_or_else(|| {
            Fault::new(FaultKind::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                actual: class_name,
            })
        })
    }

    fn native_any(&self, v: Value) -> Result<(&dyn Any, ClassId), Fault> {
        let id = self.expect_native(v)?;
        match self.heap.get(id) {
            Some(ManagedObject::Native(cell)) => match &cell.data {
                NativeData::Owned(b) => Ok((b.as_ref(), cell.class)),
                NativeData::Projection { owner, member } => {
                    let (owner, member) = (*owner, *member);
                    let class = cell.class;
                    let owner_class = match self.heap.get(owner) {
                        Some(ManagedObject::Native(oc)) => oc.class,
                        _ => return Err(Fault::new(FaultKind::StaleHandle)),
                    };
                    let proj = self.registry.object_projector(owner_class, member)?;
                    let owner_any = self.owned_native_any(owner)?;
                    let any = proj
                        .member_ref(owner_any)
                        .ok_or_else(|| Fault::new(FaultKind::StaleHandle))?;
                    Ok((any, class))
                }
                NativeData::Dangling => Err(Fault::new(FaultKind::StaleHandle)),
            },
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    pub(crate) fn owned_native_any(&self, id: ObjectId) -> Result<&dyn Any, Fault> {
        match self.heap.get(id) {
            Some(ManagedObject::Native(cell)) => match &cell.data {
                NativeData::Owned(b) => Ok(b.as_ref()),
                NativeData::Projection { .. } => Err(Fault::raw(messages::NESTED_PROJECTION)),
                NativeData::Dangling => Err(Fault::new(FaultKind::StaleHandle)),
            },
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    pub(crate) fn owned_native_any_mut(&mut self, id: ObjectId) -> Result<&mut dyn Any, Fault> {
        match self.heap.get_mut(id) {
            Some(ManagedObject::Native(cell)) => match &mut cell.data {
                NativeData::Owned(b) => Ok(b.as_mut()),
                NativeData::Projection { .. } => Err(Fault::raw(messages::NESTED_PROJECTION)),
                NativeData::Dangling => Err(Fault::new(FaultKind::StaleHandle)),
            },
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    fn expect_native(&self, v: Value) -> Result<ObjectId, Fault> {
        if v.get_tag() != TAG_NATIVE {
            return Err(Fault::new(FaultKind::NotAHandle(v.type_name().to_string())));
        }
        Ok(v.as_obj_id())
    }

    pub(crate) fn class_of(&self, v: Value) -> Result<ClassId, Fault> {
        let id = self.expect_native(v)?;
        match self.heap.get(id) {
            Some(ManagedObject::Native(cell)) => Ok(cell.class),
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    // ---- dependency registrar ----

    /// Make `dependency` live at least as long as `dependent`. Both must be
    /// heap objects; a primitive cannot be resolved to a handle and faults
    /// instead of producing a dangling relation.
    pub fn register_dependency(&mut self, dependent: Value, dependency: Value) -> Result<(), Fault> {
        if !dependent.is_obj() {
            return Err(Fault::new(FaultKind::NotAHandle(
                dependent.type_name().to_string(),
            )));
        }
        if !dependency.is_obj() {
            return Err(Fault::new(FaultKind::NotAHandle(
                dependency.type_name().to_string(),
            )));
        }
        self.deps.register(dependent.as_obj_id(), dependency);
        Ok(())
    }

    // ---- bound calls ----

    pub(crate) fn begin_window(&mut self, receiver: Option<Value>, args: &[Value]) -> CallWindow {
        let base = self.stack.len();
        if let Some(r) = receiver {
            self.stack.push(r);
        }
        self.stack.extend_from_slice(args);
        CallWindow {
            base,
            argc: self.stack.len() - base,
            receiver,
        }
    }

    pub(crate) fn end_window(&mut self, window: CallWindow) {
        self.stack.truncate(window.base);
    }

    /// Invoke a registered class constructor, delivering the handle after
    /// the filter chain has run.
    pub fn construct(&mut self, class_name: &str, args: &[Value]) -> Result<Value, Fault> {
        let window = self.begin_window(None, args);
        let out = self.construct_in(class_name, args, window);
        self.end_window(window);
        out
    }

    fn construct_in(
        &mut self,
        class_name: &str,
        args: &[Value],
        window: CallWindow,
    ) -> Result<Value, Fault> {
        if self.config.gc_auto {
            self.maybe_collect();
        }
        let class = self
            .registry
            .class_id_by_name(class_name)
            .ok_or_else(|| Fault::new(FaultKind::UnknownClass(class_name.to_string())))?;
        let (func, filters) = {
            let decl = self.registry.class(class);
            let ctor = decl
                .ctor
                .as_ref()
                .ok_or_else(|| Fault::new(FaultKind::NoConstructor(class_name.to_string())))?;
            (ctor.func.clone(), ctor.filters.clone())
        };
        let boxed = func.as_ref()(self, args)?;
        let handle = self.alloc_native_owned(class, boxed);
        self.stack.push(handle);
        filters.apply(self, window)?;
        Ok(window.first_result(self))
    }

    pub fn call_method(&mut self, recv: Value, name: &str, args: &[Value]) -> Result<Value, Fault> {
        let window = self.begin_window(Some(recv), args);
        let out = self.call_method_in(recv, name, args, window);
        self.end_window(window);
        out
    }

    fn call_method_in(
        &mut self,
        recv: Value,
        name: &str,
        args: &[Value],
        window: CallWindow,
    ) -> Result<Value, Fault> {
        if self.config.gc_auto {
            self.maybe_collect();
        }
        let class = self.class_of(recv)?;
        let (func, filters) = {
            let m = self
                .registry
                .method(class, name)
                .ok_or_else(|| Fault::new(FaultKind::UnknownMember(name.to_string())))?;
            (m.func.clone(), m.filters.clone())
        };
        let result = func.as_ref()(self, recv, args)?;
        self.stack.push(result);
        filters.apply(self, window)?;
        Ok(window.first_result(self))
    }

    pub fn call_function(&mut self, name: &str, args: &[Value]) -> Result<Value, Fault> {
        let window = self.begin_window(None, args);
        let out = self.call_function_in(name, args, window);
        self.end_window(window);
        out
    }

    fn call_function_in(
        &mut self,
        name: &str,
        args: &[Value],
        window: CallWindow,
    ) -> Result<Value, Fault> {
        if self.config.gc_auto {
            self.maybe_collect();
        }
        let (func, filters) = {
            let spec = self
                .registry
                .function(name)
                .ok_or_else(|| Fault::new(FaultKind::UnknownFunction(name.to_string())))?;
            (spec.func.clone(), spec.filters.clone())
        };
        let result = func.as_ref()(self, args)?;
        self.stack.push(result);
        filters.apply(self, window)?;
        Ok(window.first_result(self))
    }

    pub fn get_field(&mut self, recv: Value, name: &str) -> Result<Value, Fault> {
        let window = self.begin_window(Some(recv), &[]);
        let out = self.get_field_in(recv, name, window);
        self.end_window(window);
        out
    }

    fn get_field_in(
        &mut self,
        recv: Value,
        name: &str,
        window: CallWindow,
    ) -> Result<Value, Fault> {
        if self.config.gc_auto {
            self.maybe_collect();
        }
        let class = self.class_of(recv)?;
        let (member_idx, filters) = {
            let (idx, spec) = self
                .registry
                .member(class, name)
                .ok_or_else(|| Fault::new(FaultKind::UnknownMember(name.to_string())))?;
            (idx, spec.filters.clone())
        };
        let result = self.eval_member_get(recv, class, member_idx)?;
        self.stack.push(result);
        filters.apply(self, window)?;
        Ok(window.first_result(self))
    }

    pub fn set_field(&mut self, recv: Value, name: &str, item: Value) -> Result<(), Fault> {
        let class = self.class_of(recv)?;
        enum SetPlan {
            Value(crate::class::SetFn),
            NoSetter,
            Seq,
            Map,
            Object,
        }
        let (member_idx, plan) = {
            let (idx, spec) = self
                .registry
                .member(class, name)
                .ok_or_else(|| Fault::new(FaultKind::UnknownMember(name.to_string())))?;
            if spec.readonly {
                return Err(Fault::new(FaultKind::ReadonlyAssignment(name.to_string())));
            }
            let plan = match &spec.kind {
                MemberKind::Value { set: Some(s), .. } => SetPlan::Value(s.clone()),
                MemberKind::Value { set: None, .. } => SetPlan::NoSetter,
                MemberKind::Seq { .. } => SetPlan::Seq,
                MemberKind::Map { .. } => SetPlan::Map,
                MemberKind::Object { .. } => SetPlan::Object,
            };
            (idx, plan)
        };
        match plan {
            SetPlan::Value(set) => set.as_ref()(self, recv, item),
            SetPlan::NoSetter => Err(Fault::new(FaultKind::ReadonlyAssignment(name.to_string()))),
            SetPlan::Seq => {
                let view = self.eval_member_get(recv, class, member_idx)?;
                self.seq_assign(view, item)
            }
            SetPlan::Map => {
                let view = self.eval_member_get(recv, class, member_idx)?;
                self.map_assign(view, item)
            }
            SetPlan::Object => Err(Fault::raw(messages::OBJECT_FIELD_ASSIGNMENT)),
        }
    }

    pub(crate) fn eval_member_get(
        &mut self,
        recv: Value,
        class: ClassId,
        member: usize,
    ) -> Result<Value, Fault> {
        enum Plan {
            Value(GetFn),
            Object(Rc<dyn MemberProject>, TypeId, &'static str),
            Seq(Rc<dyn SeqProject>),
            Map(Rc<dyn MapProject>),
        }
        let plan = {
            let spec = self
                .registry
                .member_at(class, member)
                .ok_or_else(|| Fault::new(FaultKind::StaleHandle))?;
            match &spec.kind {
                MemberKind::Value { get, .. } => Plan::Value(get.clone()),
                MemberKind::Object {
                    project,
                    member_type,
                    member_type_name,
                } => Plan::Object(project.clone(), *member_type, *member_type_name),
                MemberKind::Seq { project } => Plan::Seq(project.clone()),
                MemberKind::Map { project } => Plan::Map(project.clone()),
            }
        };
        match plan {
            Plan::Value(get) => get.as_ref()(self, recv),
            Plan::Object(proj, member_type, member_type_name) => {
                self.project_object(recv, member, proj, member_type, member_type_name)
            }
            Plan::Seq(proj) => self.project_seq(recv, member, proj),
            Plan::Map(proj) => self.project_map(recv, member, proj),
        }
    }

    /// Produce the handle for a sub-object member. The same member resolves
    /// to the same handle for as long as it is alive (address identity), so
    /// double registration and double finalization cannot happen.
    fn project_object(
        &mut self,
        recv: Value,
        member: usize,
        proj: Rc<dyn MemberProject>,
        member_type: TypeId,
        member_type_name: &'static str,
    ) -> Result<Value, Fault> {
        let recv_id = self.expect_native(recv)?;
        let addr = {
            let owner_any = self.owned_native_any(recv_id)?;
            proj.member_addr(owner_any)
                .ok_or_else(|| Fault::new(FaultKind::StaleHandle))?
        };
        let member_class = self
            .registry
            .class_id_by_type(member_type)
            .ok_or_else(|| Fault::new(FaultKind::UnknownClass(member_type_name.to_string())))?;
        let key = AddrKey::Member {
            addr,
            class: member_class,
        };
        if let Some(existing) = self.registry.lookup_addr(key) {
            if self.heap.is_identity_live(existing) {
                return Ok(Value::native(existing));
            }
        }
        let id = self.heap.alloc(ManagedObject::Native(NativeCell {
            class: member_class,
            data: NativeData::Projection {
                owner: recv_id,
                member,
            },
        }));
        self.registry.record_addr(key, id);
        Ok(Value::native(id))
    }

    fn project_seq(
        &mut self,
        recv: Value,
        member: usize,
        proj: Rc<dyn SeqProject>,
    ) -> Result<Value, Fault> {
        let recv_id = self.expect_native(recv)?;
        let addr = {
            let owner_any = self.owned_native_any(recv_id)?;
            proj.seq_addr(owner_any)
                .ok_or_else(|| Fault::new(FaultKind::StaleHandle))?
        };
        let key = AddrKey::Seq(addr);
        if let Some(existing) = self.registry.lookup_addr(key) {
            if self.heap.is_identity_live(existing) {
                return Ok(Value::seq(existing));
            }
        }
        let id = self.heap.alloc(ManagedObject::Seq(SeqCell::Projection {
            owner: recv_id,
            member,
        }));
        self.registry.record_addr(key, id);
        Ok(Value::seq(id))
    }

    fn project_map(
        &mut self,
        recv: Value,
        member: usize,
        proj: Rc<dyn MapProject>,
    ) -> Result<Value, Fault> {
        let recv_id = self.expect_native(recv)?;
        let addr = {
            let owner_any = self.owned_native_any(recv_id)?;
            proj.map_addr(owner_any)
                .ok_or_else(|| Fault::new(FaultKind::StaleHandle))?
        };
        let key = AddrKey::Map(addr);
        if let Some(existing) = self.registry.lookup_addr(key) {
            if self.heap.is_identity_live(existing) {
                return Ok(Value::map(existing));
            }
        }
        let id = self.heap.alloc(ManagedObject::Map(MapCell::Projection {
            owner: recv_id,
            member,
        }));
        self.registry.record_addr(key, id);
        Ok(Value::map(id))
    }

    // ---- collection ----

    /// Explicit collection request: mark from globals, the value stack, and
    /// temporary roots; sweep; run finalize hooks; drop dead edges and
    /// identity entries.
    pub fn collect(&mut self) {
        let mut roots: Vec<Value> =
            Vec::with_capacity(self.globals.len() + self.stack.len() + self.temp_roots.len());
        roots.extend(self.globals.values().copied());
        roots.extend_from_slice(&self.stack);
        roots.extend_from_slice(&self.temp_roots);

        self.heap.mark_all(&roots, &self.deps);
        let corpses = self.heap.sweep();
        for obj in corpses {
            if let ManagedObject::Native(cell) = obj {
                if let NativeData::Owned(mut boxed) = cell.data {
                    // The hook only sees the native value; it cannot
                    // allocate, collect, or resurrect handles.
                    if let Some(hook) = self.registry.class(cell.class).finalize.clone() {
                        hook.as_ref()(boxed.as_mut());
                    }
                    drop(boxed);
                }
            }
        }
        self.deps.retain_live(&self.heap);
        self.registry.purge_addresses(&self.heap);
    }

    /// Allocation-driven collection trigger.
    pub fn maybe_collect(&mut self) {
        if self.heap.should_gc() {
            self.collect();
        }
    }

    // ---- stats & display ----

    pub fn heap_stats(&self) -> SpaceStats {
        let h = self.heap.stats();
        SpaceStats {
            live_objects: h.live_objects,
            free_slots: h.free_slots,
            alloc_bytes: h.alloc_bytes,
            dependency_edges: self.deps.len(),
        }
    }

    pub fn display(&self, v: Value) -> String {
        if v.get_tag() == TAG_NATIVE {
            if let Some(ManagedObject::Native(cell)) = self.heap.get(v.as_obj_id()) {
                return format!(
                    "<{}#{}>",
                    self.registry.class(cell.class).name,
                    v.as_obj_id().0
                );
            }
        }
        value_to_string(&v, &self.heap)
    }
}

impl Default for ObjectSpace {
    fn default() -> Self {
        Self::new()
    }
}
