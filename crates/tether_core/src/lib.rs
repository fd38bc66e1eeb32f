//! Core value representation and fault taxonomy for the tether object space.

pub mod fault;
pub mod value;

pub use fault::{Fault, FaultFormatter, FaultKind};
pub use value::{FastHashMap, ObjectId, Value};
pub use value::{fast_hasher, fast_map_new, fast_map_with_capacity};
