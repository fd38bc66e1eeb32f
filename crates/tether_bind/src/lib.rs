//! Tether binding layer.
//!
//! Exposes native Rust values to a script-visible object space: managed
//! handles with cooperative collection, declarative filter chains on bound
//! operations (return-self, lifetime dependencies, custom steps), and
//! container views with 1-based host-convention indexing.

#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]

pub mod call;
pub mod class;
pub mod errors;
pub mod filters;
pub mod heap;
pub mod map;
pub mod marshal;
pub mod seq;
pub mod space;

mod lifetime;
mod registry;
mod util;

pub use call::{validate_arity, CallWindow};
pub use class::{ClassId, ClassSpec, CtorFn, MethodFn, NativeFn};
pub use filters::{CustomFn, FilterChain, FilterStep};
pub use heap::{Heap, HeapStats, ManagedObject};
pub use lifetime::DependencyTable;
pub use map::MapContainer;
pub use marshal::{FromValue, IntoValue, Scalar, ScalarElem};
pub use seq::SeqContainer;
pub use space::{ObjectSpace, SpaceConfig, SpaceStats};
pub use util::{value_to_string, Appendable};

pub use tether_core::{fast_map_new, fast_map_with_capacity, FastHashMap};
pub use tether_core::{Fault, FaultFormatter, FaultKind, ObjectId, Value};
