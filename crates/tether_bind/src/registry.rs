//! Class and function registry, plus the address identity map.

use crate::class::{
    ClassDecl, ClassId, MapProject, MemberKind, MemberProject, MemberSpec, MethodSpec, NativeFn,
    SeqProject,
};
use crate::filters::FilterChain;
use crate::heap::Heap;
use std::any::TypeId;
use std::rc::Rc;
use tether_core::{fast_map_new, Fault, FastHashMap, FaultKind, ObjectId};

pub(crate) struct FunctionSpec {
    pub(crate) func: NativeFn,
    pub(crate) filters: FilterChain,
}

/// Identity key for the address map. A member at offset zero shares its
/// address with its owner, so raw addresses alone cannot name a handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum AddrKey {
    Owner(usize),
    Member { addr: usize, class: ClassId },
    Seq(usize),
    Map(usize),
}

pub(crate) struct Registry {
    classes: Vec<ClassDecl>,
    by_type: FastHashMap<TypeId, ClassId>,
    by_name: FastHashMap<String, ClassId>,
    functions: FastHashMap<String, FunctionSpec>,
    /// Native storage address -> issued handle. Gives member projections
    /// and container views stable script-visible identity.
    addresses: FastHashMap<AddrKey, ObjectId>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            classes: Vec::new(),
            by_type: fast_map_new(),
            by_name: fast_map_new(),
            functions: fast_map_new(),
            addresses: fast_map_new(),
        }
    }

    pub(crate) fn register(&mut self, decl: ClassDecl) -> ClassId {
        if self.by_name.contains_key(&decl.name) {
            panic!("class '{}' is already registered", decl.name);
        }
        if self.by_type.contains_key(&decl.type_id) {
            panic!(
                "native type behind class '{}' is already registered",
                decl.name
            );
        }
        let id = ClassId(self.classes.len());
        self.by_type.insert(decl.type_id, id);
        self.by_name.insert(decl.name.clone(), id);
        self.classes.push(decl);
        id
    }

    pub(crate) fn class(&self, id: ClassId) -> &ClassDecl {
        &self.classes[id.0]
    }

    pub(crate) fn class_id_by_type(&self, ty: TypeId) -> Option<ClassId> {
        self.by_type.get(&ty).copied()
    }

    pub(crate) fn class_id_by_name(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn member(&self, class: ClassId, name: &str) -> Option<(usize, &MemberSpec)> {
        self.classes[class.0]
            .members
            .get_full(name)
            .map(|(idx, _, spec)| (idx, spec))
    }

    pub(crate) fn member_at(&self, class: ClassId, idx: usize) -> Option<&MemberSpec> {
        self.classes[class.0]
            .members
            .get_index(idx)
            .map(|(_, spec)| spec)
    }

    pub(crate) fn method(&self, class: ClassId, name: &str) -> Option<&MethodSpec> {
        self.classes[class.0].methods.get(name)
    }

    pub(crate) fn object_projector(
        &self,
        class: ClassId,
        member: usize,
    ) -> Result<Rc<dyn MemberProject>, Fault> {
        match self.member_at(class, member).map(|spec| &spec.kind) {
            Some(MemberKind::Object { project, .. }) => Ok(project.clone()),
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    pub(crate) fn seq_projector(
        &self,
        class: ClassId,
        member: usize,
    ) -> Result<Rc<dyn SeqProject>, Fault> {
        match self.member_at(class, member).map(|spec| &spec.kind) {
            Some(MemberKind::Seq { project }) => Ok(project.clone()),
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    pub(crate) fn map_projector(
        &self,
        class: ClassId,
        member: usize,
    ) -> Result<Rc<dyn MapProject>, Fault> {
        match self.member_at(class, member).map(|spec| &spec.kind) {
            Some(MemberKind::Map { project }) => Ok(project.clone()),
            _ => Err(Fault::new(FaultKind::StaleHandle)),
        }
    }

    pub(crate) fn set_function(&mut self, name: &str, spec: FunctionSpec) {
        self.functions.insert(name.to_string(), spec);
    }

    pub(crate) fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(name)
    }

    pub(crate) fn lookup_addr(&self, key: AddrKey) -> Option<ObjectId> {
        self.addresses.get(&key).copied()
    }

    pub(crate) fn record_addr(&mut self, key: AddrKey, id: ObjectId) {
        self.addresses.insert(key, id);
    }

    /// Drop identity entries whose handle died. A freed native's address
    /// can be reused by a later allocation, so stale entries must not
    /// survive a collection.
    pub(crate) fn purge_addresses(&mut self, heap: &Heap) {
        self.addresses.retain(|_, id| heap.is_identity_live(*id));
    }
}
