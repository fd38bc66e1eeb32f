//! Class bindings.
//!
//! A `ClassSpec` declares how one native Rust type is exposed to script
//! code: an optional constructor, methods, value fields, and member
//! projections (sub-objects and live container views). Each declaration
//! may carry a filter chain, applied after the underlying operation on
//! every invocation.

use crate::filters::FilterChain;
use crate::map::MapContainer;
use crate::marshal::{FromValue, IntoValue};
use crate::seq::SeqContainer;
use crate::space::ObjectSpace;
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::rc::Rc;
use tether_core::{Fault, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) usize);

pub type CtorFn = Rc<dyn Fn(&mut ObjectSpace, &[Value]) -> Result<Box<dyn Any>, Fault>>;
pub type MethodFn = Rc<dyn Fn(&mut ObjectSpace, Value, &[Value]) -> Result<Value, Fault>>;
pub type NativeFn = Rc<dyn Fn(&mut ObjectSpace, &[Value]) -> Result<Value, Fault>>;
pub(crate) type GetFn = Rc<dyn Fn(&mut ObjectSpace, Value) -> Result<Value, Fault>>;
pub(crate) type SetFn = Rc<dyn Fn(&mut ObjectSpace, Value, Value) -> Result<(), Fault>>;
pub(crate) type FinalizeFn = Rc<dyn Fn(&mut dyn Any)>;

/// Resolves a sub-object member inside an owner's type-erased storage.
pub(crate) trait MemberProject {
    fn member_ref<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any>;
    fn member_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any>;

    /// Stable address of the member, used for handle identity.
    fn member_addr(&self, owner: &dyn Any) -> Option<usize> {
        self.member_ref(owner)
            .map(|m| m as *const dyn Any as *const () as usize)
    }
}

/// Resolves a sequential-container member inside an owner's storage.
pub(crate) trait SeqProject {
    fn seq_ref<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn SeqContainer>;
    fn seq_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn SeqContainer>;

    fn seq_addr(&self, owner: &dyn Any) -> Option<usize> {
        self.seq_ref(owner)
            .map(|c| c as *const dyn SeqContainer as *const () as usize)
    }
}

/// Resolves an associative-container member inside an owner's storage.
pub(crate) trait MapProject {
    fn map_ref<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn MapContainer>;
    fn map_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn MapContainer>;

    fn map_addr(&self, owner: &dyn Any) -> Option<usize> {
        self.map_ref(owner)
            .map(|c| c as *const dyn MapContainer as *const () as usize)
    }
}

struct FieldProjector<T, F, GR, GM> {
    get_ref: GR,
    get_mut: GM,
    marker: PhantomData<fn() -> (T, F)>,
}

impl<T, F, GR, GM> MemberProject for FieldProjector<T, F, GR, GM>
where
    T: 'static,
    F: Any,
    GR: Fn(&T) -> &F,
    GM: Fn(&mut T) -> &mut F,
{
    fn member_ref<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        owner.downcast_ref::<T>().map(|t| (self.get_ref)(t) as &dyn Any)
    }

    fn member_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        owner
            .downcast_mut::<T>()
            .map(|t| (self.get_mut)(t) as &mut dyn Any)
    }
}

struct SeqProjector<T, C, GR, GM> {
    get_ref: GR,
    get_mut: GM,
    marker: PhantomData<fn() -> (T, C)>,
}

impl<T, C, GR, GM> SeqProject for SeqProjector<T, C, GR, GM>
where
    T: 'static,
    C: SeqContainer,
    GR: Fn(&T) -> &C,
    GM: Fn(&mut T) -> &mut C,
{
    fn seq_ref<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn SeqContainer> {
        owner
            .downcast_ref::<T>()
            .map(|t| (self.get_ref)(t) as &dyn SeqContainer)
    }

    fn seq_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn SeqContainer> {
        owner
            .downcast_mut::<T>()
            .map(|t| (self.get_mut)(t) as &mut dyn SeqContainer)
    }
}

struct MapProjector<T, C, GR, GM> {
    get_ref: GR,
    get_mut: GM,
    marker: PhantomData<fn() -> (T, C)>,
}

impl<T, C, GR, GM> MapProject for MapProjector<T, C, GR, GM>
where
    T: 'static,
    C: MapContainer,
    GR: Fn(&T) -> &C,
    GM: Fn(&mut T) -> &mut C,
{
    fn map_ref<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn MapContainer> {
        owner
            .downcast_ref::<T>()
            .map(|t| (self.get_ref)(t) as &dyn MapContainer)
    }

    fn map_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn MapContainer> {
        owner
            .downcast_mut::<T>()
            .map(|t| (self.get_mut)(t) as &mut dyn MapContainer)
    }
}

pub(crate) enum MemberKind {
    Value {
        get: GetFn,
        set: Option<SetFn>,
    },
    Object {
        project: Rc<dyn MemberProject>,
        member_type: TypeId,
        member_type_name: &'static str,
    },
    Seq {
        project: Rc<dyn SeqProject>,
    },
    Map {
        project: Rc<dyn MapProject>,
    },
}

pub(crate) struct MemberSpec {
    pub(crate) kind: MemberKind,
    pub(crate) readonly: bool,
    pub(crate) filters: FilterChain,
}

pub(crate) struct MethodSpec {
    pub(crate) func: MethodFn,
    pub(crate) filters: FilterChain,
}

pub(crate) struct CtorSpec {
    pub(crate) func: CtorFn,
    pub(crate) filters: FilterChain,
}

pub(crate) struct ClassDecl {
    pub(crate) name: String,
    pub(crate) type_id: TypeId,
    pub(crate) ctor: Option<CtorSpec>,
    pub(crate) members: IndexMap<String, MemberSpec>,
    pub(crate) methods: IndexMap<String, MethodSpec>,
    pub(crate) finalize: Option<FinalizeFn>,
}

/// Builder for one native type's script binding.
pub struct ClassSpec<T: 'static> {
    decl: ClassDecl,
    marker: PhantomData<fn() -> T>,
}

impl<T: 'static> ClassSpec<T> {
    pub fn new(name: &str) -> Self {
        Self {
            decl: ClassDecl {
                name: name.to_string(),
                type_id: TypeId::of::<T>(),
                ctor: None,
                members: IndexMap::new(),
                methods: IndexMap::new(),
                finalize: None,
            },
            marker: PhantomData,
        }
    }

    pub fn ctor(
        self,
        f: impl Fn(&mut ObjectSpace, &[Value]) -> Result<T, Fault> + 'static,
    ) -> Self {
        self.ctor_with(f, FilterChain::new())
    }

    pub fn ctor_with(
        mut self,
        f: impl Fn(&mut ObjectSpace, &[Value]) -> Result<T, Fault> + 'static,
        filters: FilterChain,
    ) -> Self {
        let func: CtorFn =
            Rc::new(move |space, args| Ok(Box::new(f(space, args)?) as Box<dyn Any>));
        self.decl.ctor = Some(CtorSpec { func, filters });
        self
    }

    pub fn method(
        self,
        name: &str,
        f: impl Fn(&mut ObjectSpace, Value, &[Value]) -> Result<Value, Fault> + 'static,
    ) -> Self {
        self.method_with(name, f, FilterChain::new())
    }

    pub fn method_with(
        mut self,
        name: &str,
        f: impl Fn(&mut ObjectSpace, Value, &[Value]) -> Result<Value, Fault> + 'static,
        filters: FilterChain,
    ) -> Self {
        self.decl.methods.insert(
            name.to_string(),
            MethodSpec {
                func: Rc::new(f),
                filters,
            },
        );
        self
    }

    /// Read/write scalar field exposed through typed accessors.
    pub fn field<V>(
        mut self,
        name: &str,
        get: impl Fn(&T) -> V + 'static,
        set: impl Fn(&mut T, V) + 'static,
    ) -> Self
    where
        V: IntoValue + FromValue + 'static,
    {
        let get_fn: GetFn = Rc::new(move |space, recv| {
            let out = {
                let t = space.native_ref::<T>(recv)?;
                get(t)
            };
            Ok(out.into_value(space))
        });
        let set_fn: SetFn = Rc::new(move |space, recv, v| {
            let item = V::from_value(v, space)?;
            let t = space.native_mut::<T>(recv)?;
            set(t, item);
            Ok(())
        });
        self.decl.members.insert(
            name.to_string(),
            MemberSpec {
                kind: MemberKind::Value {
                    get: get_fn,
                    set: Some(set_fn),
                },
                readonly: false,
                filters: FilterChain::new(),
            },
        );
        self
    }

    /// Getter-only scalar field; assignment faults.
    pub fn field_readonly<V>(mut self, name: &str, get: impl Fn(&T) -> V + 'static) -> Self
    where
        V: IntoValue + 'static,
    {
        let get_fn: GetFn = Rc::new(move |space, recv| {
            let out = {
                let t = space.native_ref::<T>(recv)?;
                get(t)
            };
            Ok(out.into_value(space))
        });
        self.decl.members.insert(
            name.to_string(),
            MemberSpec {
                kind: MemberKind::Value {
                    get: get_fn,
                    set: None,
                },
                readonly: true,
                filters: FilterChain::new(),
            },
        );
        self
    }

    /// Expose a sub-object member as its own handle. The member's type must
    /// itself be a registered class. Access yields the same handle for the
    /// same member (address identity).
    pub fn object_field<F>(
        self,
        name: &str,
        get_ref: impl Fn(&T) -> &F + 'static,
        get_mut: impl Fn(&mut T) -> &mut F + 'static,
    ) -> Self
    where
        F: Any,
    {
        self.object_field_with(name, get_ref, get_mut, FilterChain::new())
    }

    pub fn object_field_with<F>(
        mut self,
        name: &str,
        get_ref: impl Fn(&T) -> &F + 'static,
        get_mut: impl Fn(&mut T) -> &mut F + 'static,
        filters: FilterChain,
    ) -> Self
    where
        F: Any,
    {
        let project: Rc<dyn MemberProject> = Rc::new(FieldProjector {
            get_ref,
            get_mut,
            marker: PhantomData::<fn() -> (T, F)>,
        });
        self.decl.members.insert(
            name.to_string(),
            MemberSpec {
                kind: MemberKind::Object {
                    project,
                    member_type: TypeId::of::<F>(),
                    member_type_name: std::any::type_name::<F>(),
                },
                readonly: false,
                filters,
            },
        );
        self
    }

    /// Expose a sequential-container member as a live view.
    pub fn seq_field<C>(
        self,
        name: &str,
        get_ref: impl Fn(&T) -> &C + 'static,
        get_mut: impl Fn(&mut T) -> &mut C + 'static,
    ) -> Self
    where
        C: SeqContainer,
    {
        self.seq_field_inner(name, get_ref, get_mut, false, FilterChain::new())
    }

    pub fn seq_field_readonly<C>(
        self,
        name: &str,
        get_ref: impl Fn(&T) -> &C + 'static,
        get_mut: impl Fn(&mut T) -> &mut C + 'static,
    ) -> Self
    where
        C: SeqContainer,
    {
        self.seq_field_inner(name, get_ref, get_mut, true, FilterChain::new())
    }

    pub fn seq_field_with<C>(
        self,
        name: &str,
        get_ref: impl Fn(&T) -> &C + 'static,
        get_mut: impl Fn(&mut T) -> &mut C + 'static,
        filters: FilterChain,
    ) -> Self
    where
        C: SeqContainer,
    {
        self.seq_field_inner(name, get_ref, get_mut, false, filters)
    }

    fn seq_field_inner<C>(
        mut self,
        name: &str,
        get_ref: impl Fn(&T) -> &C + 'static,
        get_mut: impl Fn(&mut T) -> &mut C + 'static,
        readonly: bool,
        filters: FilterChain,
    ) -> Self
    where
        C: SeqContainer,
    {
        let project: Rc<dyn SeqProject> = Rc::new(SeqProjector {
            get_ref,
            get_mut,
            marker: PhantomData::<fn() -> (T, C)>,
        });
        self.decl.members.insert(
            name.to_string(),
            MemberSpec {
                kind: MemberKind::Seq { project },
                readonly,
                filters,
            },
        );
        self
    }

    /// Expose an associative-container member as a live view.
    pub fn map_field<C>(
        mut self,
        name: &str,
        get_ref: impl Fn(&T) -> &C + 'static,
        get_mut: impl Fn(&mut T) -> &mut C + 'static,
    ) -> Self
    where
        C: MapContainer,
    {
        let project: Rc<dyn MapProject> = Rc::new(MapProjector {
            get_ref,
            get_mut,
            marker: PhantomData::<fn() -> (T, C)>,
        });
        self.decl.members.insert(
            name.to_string(),
            MemberSpec {
                kind: MemberKind::Map { project },
                readonly: false,
                filters: FilterChain::new(),
            },
        );
        self
    }

    /// Mark a previously declared member readonly.
    ///
    /// Panics if the member does not exist; bind-time declarations are
    /// programmer contracts.
    pub fn readonly(mut self, name: &str) -> Self {
        match self.decl.members.get_mut(name) {
            Some(spec) => spec.readonly = true,
            None => panic!("readonly: unknown member '{}'", name),
        }
        self
    }

    /// Observer invoked by the collector right before the native value is
    /// dropped. Receives only the value, so it cannot allocate or resurrect
    /// handles.
    pub fn on_finalize(mut self, f: impl Fn(&mut T) + 'static) -> Self {
        let hook: FinalizeFn = Rc::new(move |any| {
            if let Some(t) = any.downcast_mut::<T>() {
                f(t);
            }
        });
        self.decl.finalize = Some(hook);
        self
    }

    pub(crate) fn into_decl(self) -> ClassDecl {
        self.decl
    }
}
