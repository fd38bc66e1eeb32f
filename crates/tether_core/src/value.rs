//! Runtime value representation.
//!
//! Script-visible values use NaN-boxing for compact storage: floats are
//! stored untagged, everything else carries a 4-bit tag and a 48-bit payload
//! (an inline integer/boolean or the `ObjectId` of a heap slot).

use ahash::RandomState;
use hashbrown::HashMap;
use std::fmt;
use std::hash::Hash;

/// Handle to a heap-allocated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub usize);

pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;

pub fn fast_hasher() -> RandomState {
    RandomState::with_seeds(0, 0, 0, 0)
}

pub fn fast_map_new<K: Eq + Hash, V>() -> FastHashMap<K, V> {
    HashMap::with_hasher(fast_hasher())
}

pub fn fast_map_with_capacity<K: Eq + Hash, V>(cap: usize) -> FastHashMap<K, V> {
    HashMap::with_capacity_and_hasher(cap, fast_hasher())
}

// NaN-Boxing constants
pub const QNAN: u64 = 0x7ff8000000000000;
pub const TAG_BASE: u64 = 0xfff0000000000000;
pub const TAG_MASK: u64 = 0x000f000000000000;
pub const PAYLOAD_MASK: u64 = 0x0000ffffffffffff;

pub const TAG_INT: u64 = 0x0001;
pub const TAG_BOOL: u64 = 0x0002;
pub const TAG_VOID: u64 = 0x0003;

pub const TAG_STR: u64 = 0x0004;
pub const TAG_LIST: u64 = 0x0005;
pub const TAG_DICT: u64 = 0x0006;
pub const TAG_NATIVE: u64 = 0x0007;
pub const TAG_SEQ: u64 = 0x0008;
pub const TAG_MAP: u64 = 0x0009;

/// A single script-visible value.
///
/// Equality is raw-bit equality, so two values referring to the same heap
/// slot compare equal. That is the identity check the binding layer relies
/// on for its return-self guarantee.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Value(u64);

impl Default for Value {
    fn default() -> Self {
        Self::VOID
    }
}

impl Value {
    pub const VOID: Value = Value(TAG_BASE | (TAG_VOID << 48));

    #[inline(always)]
    pub fn from_f64(f: f64) -> Self {
        // Normalize NaN to a single pattern so payload bits never collide
        // with the tag space.
        if f.is_nan() {
            return Self(QNAN);
        }
        Self(f.to_bits())
    }

    #[inline(always)]
    pub fn from_i64(i: i64) -> Self {
        // Truncated to 48 bits; sign-extended on the way out.
        Self(TAG_BASE | (TAG_INT << 48) | (i as u64 & PAYLOAD_MASK))
    }

    #[inline(always)]
    pub fn from_bool(b: bool) -> Self {
        Self(TAG_BASE | (TAG_BOOL << 48) | (if b { 1 } else { 0 }))
    }

    #[inline(always)]
    fn from_obj(tag: u64, id: ObjectId) -> Self {
        Self(TAG_BASE | (tag << 48) | (id.0 as u64 & PAYLOAD_MASK))
    }

    pub fn str(id: ObjectId) -> Self {
        Self::from_obj(TAG_STR, id)
    }
    pub fn list(id: ObjectId) -> Self {
        Self::from_obj(TAG_LIST, id)
    }
    pub fn dict(id: ObjectId) -> Self {
        Self::from_obj(TAG_DICT, id)
    }
    pub fn native(id: ObjectId) -> Self {
        Self::from_obj(TAG_NATIVE, id)
    }
    pub fn seq(id: ObjectId) -> Self {
        Self::from_obj(TAG_SEQ, id)
    }
    pub fn map(id: ObjectId) -> Self {
        Self::from_obj(TAG_MAP, id)
    }

    #[inline(always)]
    pub fn is_f64(&self) -> bool {
        (self.0 & TAG_BASE) != TAG_BASE
    }
    #[inline(always)]
    pub fn is_int(&self) -> bool {
        (self.0 & 0xffff000000000000) == 0xfff1000000000000
    }
    #[inline(always)]
    pub fn is_bool(&self) -> bool {
        !self.is_f64() && self.get_tag() == TAG_BOOL
    }
    #[inline(always)]
    pub fn is_void(&self) -> bool {
        !self.is_f64() && self.get_tag() == TAG_VOID
    }
    #[inline(always)]
    pub fn is_obj(&self) -> bool {
        !self.is_f64() && self.get_tag() > TAG_VOID
    }

    #[inline(always)]
    pub fn as_f64(self) -> f64 {
        f64::from_bits(self.0)
    }

    #[inline(always)]
    pub fn as_i64(&self) -> i64 {
        let val = (self.0 & PAYLOAD_MASK) as i64;
        // Sign extend from 48 bits
        if (val & 0x0000800000000000) != 0 {
            val | -0x0001000000000000
        } else {
            val
        }
    }

    #[inline(always)]
    pub fn as_bool(&self) -> bool {
        (self.0 & 1) != 0
    }

    #[inline(always)]
    pub fn as_obj_id(&self) -> ObjectId {
        ObjectId((self.0 & PAYLOAD_MASK) as usize)
    }

    pub fn get_tag(&self) -> u64 {
        if self.is_f64() {
            0
        } else {
            (self.0 & TAG_MASK) >> 48
        }
    }

    pub fn type_name(&self) -> &'static str {
        if self.is_f64() {
            "float"
        } else if self.is_int() {
            "int"
        } else if self.is_bool() {
            "bool"
        } else if self.is_void() {
            "void"
        } else {
            match self.get_tag() {
                TAG_STR => "string",
                TAG_LIST => "list",
                TAG_DICT => "dict",
                TAG_NATIVE => "native",
                TAG_SEQ => "seq",
                TAG_MAP => "map",
                _ => "unknown",
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_f64() {
            write!(f, "Float({})", self.as_f64())
        } else if self.is_int() {
            write!(f, "Int({})", self.as_i64())
        } else if self.is_bool() {
            write!(f, "Bool({})", self.as_bool())
        } else if self.is_void() {
            write!(f, "Void")
        } else {
            let id = self.as_obj_id();
            match self.get_tag() {
                TAG_STR => write!(f, "Str(id={:?})", id),
                TAG_LIST => write!(f, "List(id={:?})", id),
                TAG_DICT => write!(f, "Dict(id={:?})", id),
                TAG_NATIVE => write!(f, "Native(id={:?})", id),
                TAG_SEQ => write!(f, "Seq(id={:?})", id),
                TAG_MAP => write!(f, "Map(id={:?})", id),
                tag => write!(f, "Unknown(tag={}, id={:?})", tag, id),
            }
        }
    }
}
