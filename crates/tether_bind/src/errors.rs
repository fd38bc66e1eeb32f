//! Common error message constants used throughout the binding layer.

pub mod messages {
    pub const NESTED_PROJECTION: &str = "Nested member projection is not supported";
    pub const OBJECT_FIELD_ASSIGNMENT: &str =
        "Object member assignment is not supported; expose a value field instead";
    pub const EXPECTED_SCALAR: &str = "scalar value";
    pub const EXPECTED_LIST_OR_SEQ: &str = "list or sequence view";
    pub const EXPECTED_DICT_OR_MAP: &str = "dict or map view";
}
