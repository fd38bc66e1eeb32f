//! Conversions between native Rust data and script-visible values.
//!
//! `IntoValue`/`FromValue` are the seams bound getters, setters, and
//! constructors marshal through. Container elements go through the owned
//! `Scalar` intermediate so container access can release its heap borrow
//! before any allocation happens.

use crate::errors::messages::EXPECTED_SCALAR;
use crate::space::ObjectSpace;
use tether_core::value::TAG_STR;
use tether_core::{Fault, FaultKind, Value};

/// Owned scalar snapshot of a single container element.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Unit,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Unit => "void",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Bool(_) => "bool",
            Scalar::Str(_) => "string",
        }
    }
}

/// Element types storable in marshaled containers.
pub trait ScalarElem: Sized + 'static {
    fn to_scalar(&self) -> Scalar;
    fn from_scalar(s: Scalar) -> Result<Self, Fault>;
}

fn elem_mismatch(expected: &'static str, got: &Scalar) -> Fault {
    Fault::new(FaultKind::TypeMismatch {
        expected: expected.to_string(),
        actual: got.type_name().to_string(),
    })
}

impl ScalarElem for i64 {
    fn to_scalar(&self) -> Scalar {
        Scalar::Int(*self)
    }
    fn from_scalar(s: Scalar) -> Result<Self, Fault> {
        match s {
            Scalar::Int(i) => Ok(i),
            other => Err(elem_mismatch("int", &other)),
        }
    }
}

impl ScalarElem for f64 {
    fn to_scalar(&self) -> Scalar {
        Scalar::Float(*self)
    }
    fn from_scalar(s: Scalar) -> Result<Self, Fault> {
        match s {
            Scalar::Float(f) => Ok(f),
            Scalar::Int(i) => Ok(i as f64),
            other => Err(elem_mismatch("float", &other)),
        }
    }
}

impl ScalarElem for bool {
    fn to_scalar(&self) -> Scalar {
        Scalar::Bool(*self)
    }
    fn from_scalar(s: Scalar) -> Result<Self, Fault> {
        match s {
            Scalar::Bool(b) => Ok(b),
            other => Err(elem_mismatch("bool", &other)),
        }
    }
}

impl ScalarElem for String {
    fn to_scalar(&self) -> Scalar {
        Scalar::Str(self.clone())
    }
    fn from_scalar(s: Scalar) -> Result<Self, Fault> {
        match s {
            Scalar::Str(s) => Ok(s),
            other => Err(elem_mismatch("string", &other)),
        }
    }
}

pub(crate) fn scalar_to_value(space: &mut ObjectSpace, s: Scalar) -> Value {
    match s {
        Scalar::Unit => Value::VOID,
        Scalar::Int(i) => Value::from_i64(i),
        Scalar::Float(f) => Value::from_f64(f),
        Scalar::Bool(b) => Value::from_bool(b),
        Scalar::Str(s) => space.new_str(&s),
    }
}

pub(crate) fn scalar_from_value(space: &ObjectSpace, v: Value) -> Result<Scalar, Fault> {
    if v.is_int() {
        Ok(Scalar::Int(v.as_i64()))
    } else if v.is_f64() {
        Ok(Scalar::Float(v.as_f64()))
    } else if v.is_bool() {
        Ok(Scalar::Bool(v.as_bool()))
    } else if v.is_void() {
        Ok(Scalar::Unit)
    } else if v.get_tag() == TAG_STR {
        Ok(Scalar::Str(space.str_contents(v)?.to_string()))
    } else {
        Err(Fault::new(FaultKind::TypeMismatch {
            expected: EXPECTED_SCALAR.to_string(),
            actual: v.type_name().to_string(),
        }))
    }
}

/// Marshal a native value into the object space.
pub trait IntoValue {
    fn into_value(self, space: &mut ObjectSpace) -> Value;
}

impl IntoValue for Value {
    fn into_value(self, _space: &mut ObjectSpace) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self, _space: &mut ObjectSpace) -> Value {
        Value::VOID
    }
}

impl IntoValue for bool {
    fn into_value(self, _space: &mut ObjectSpace) -> Value {
        Value::from_bool(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self, _space: &mut ObjectSpace) -> Value {
        Value::from_i64(self as i64)
    }
}

impl IntoValue for i64 {
    fn into_value(self, _space: &mut ObjectSpace) -> Value {
        Value::from_i64(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self, _space: &mut ObjectSpace) -> Value {
        Value::from_f64(self as f64)
    }
}

impl IntoValue for f64 {
    fn into_value(self, _space: &mut ObjectSpace) -> Value {
        Value::from_f64(self)
    }
}

impl IntoValue for String {
    fn into_value(self, space: &mut ObjectSpace) -> Value {
        space.new_str(&self)
    }
}

impl IntoValue for &str {
    fn into_value(self, space: &mut ObjectSpace) -> Value {
        space.new_str(self)
    }
}

/// Marshal a script-visible value back into native data.
pub trait FromValue: Sized {
    fn from_value(v: Value, space: &ObjectSpace) -> Result<Self, Fault>;
}

fn value_mismatch(expected: &'static str, v: Value) -> Fault {
    Fault::new(FaultKind::TypeMismatch {
        expected: expected.to_string(),
        actual: v.type_name().to_string(),
    })
}

impl FromValue for Value {
    fn from_value(v: Value, _space: &ObjectSpace) -> Result<Self, Fault> {
        Ok(v)
    }
}

impl FromValue for bool {
    fn from_value(v: Value, _space: &ObjectSpace) -> Result<Self, Fault> {
        if v.is_bool() {
            Ok(v.as_bool())
        } else {
            Err(value_mismatch("bool", v))
        }
    }
}

impl FromValue for i64 {
    fn from_value(v: Value, _space: &ObjectSpace) -> Result<Self, Fault> {
        if v.is_int() {
            Ok(v.as_i64())
        } else {
            Err(value_mismatch("int", v))
        }
    }
}

impl FromValue for f64 {
    fn from_value(v: Value, _space: &ObjectSpace) -> Result<Self, Fault> {
        if v.is_f64() {
            Ok(v.as_f64())
        } else if v.is_int() {
            Ok(v.as_i64() as f64)
        } else {
            Err(value_mismatch("float", v))
        }
    }
}

impl FromValue for f32 {
    fn from_value(v: Value, space: &ObjectSpace) -> Result<Self, Fault> {
        f64::from_value(v, space).map(|f| f as f32)
    }
}

impl FromValue for String {
    fn from_value(v: Value, space: &ObjectSpace) -> Result<Self, Fault> {
        if v.get_tag() == TAG_STR {
            Ok(space.str_contents(v)?.to_string())
        } else {
            Err(value_mismatch("string", v))
        }
    }
}
