//! Call-failure taxonomy.
//!
//! Every failure surfaced by the binding layer is a `Fault` carrying one of
//! the kinds below. Faults abort the current bound call synchronously; they
//! never abort the process.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultKind {
    TypeMismatch {
        expected: String,
        actual: String,
    },
    ArgumentCountMismatch {
        expected_min: usize,
        expected_max: usize,
        actual: usize,
    },
    IndexOutOfRange {
        index: i64,
        len: usize,
    },
    ReadonlyAssignment(String),
    UnknownClass(String),
    UnknownMember(String),
    UnknownFunction(String),
    NoConstructor(String),
    UnresolvedDependency {
        position: i32,
    },
    StackSlotOutOfRange {
        position: i32,
    },
    ReceiverRequired,
    NotAHandle(String),
    NotASequence(String),
    NotAMap(String),
    StaleHandle,

    // Custom
    Raw(String),
}

pub struct FaultFormatter;

impl FaultFormatter {
    fn format_en(kind: &FaultKind) -> String {
        match kind {
            FaultKind::TypeMismatch { expected, actual } => {
                format!("Type mismatch: expected {} but got {}", expected, actual)
            }
            FaultKind::ArgumentCountMismatch {
                expected_min,
                expected_max,
                actual,
            } => {
                if expected_min == expected_max {
                    format!(
                        "Argument count mismatch: expected {} but got {}",
                        expected_min, actual
                    )
                } else {
                    format!(
                        "Argument count mismatch: expected {}..{} but got {}",
                        expected_min, expected_max, actual
                    )
                }
            }
            FaultKind::IndexOutOfRange { index, len } => {
                format!("Index {} out of range for length {}", index, len)
            }
            FaultKind::ReadonlyAssignment(member) => {
                format!("Cannot assign to readonly member '{}'", member)
            }
            FaultKind::UnknownClass(name) => format!("Unknown class: {}", name),
            FaultKind::UnknownMember(name) => format!("Unknown member: {}", name),
            FaultKind::UnknownFunction(name) => format!("Unknown function: {}", name),
            FaultKind::NoConstructor(name) => {
                format!("Class '{}' has no constructor", name)
            }
            FaultKind::UnresolvedDependency { position } => format!(
                "Dependency registration failed: stack slot {} does not hold a handle",
                position
            ),
            FaultKind::StackSlotOutOfRange { position } => {
                format!("Stack slot {} is outside the current call window", position)
            }
            FaultKind::ReceiverRequired => {
                "Filter step requires a call receiver".into()
            }
            FaultKind::NotAHandle(actual) => {
                format!("Expected a native handle, got {}", actual)
            }
            FaultKind::NotASequence(actual) => {
                format!("Expected a sequence view, got {}", actual)
            }
            FaultKind::NotAMap(actual) => format!("Expected a map view, got {}", actual),
            FaultKind::StaleHandle => "Handle outlived the object it refers to".into(),

            FaultKind::Raw(s) => s.clone(),
        }
    }

    pub fn format(kind: &FaultKind) -> String {
        Self::format_en(kind)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
}

impl Fault {
    pub fn new(kind: FaultKind) -> Self {
        Self { kind }
    }

    pub fn raw(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Raw(message.into()),
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self.kind {
            FaultKind::TypeMismatch { .. } => Some(codes::TYPE_MISMATCH),
            FaultKind::ArgumentCountMismatch { .. } => Some(codes::ARGUMENT_COUNT_MISMATCH),
            FaultKind::IndexOutOfRange { .. } => Some(codes::INDEX_OUT_OF_RANGE),
            FaultKind::ReadonlyAssignment(_) => Some(codes::READONLY_ASSIGNMENT),
            FaultKind::UnresolvedDependency { .. } => Some(codes::UNRESOLVED_DEPENDENCY),
            FaultKind::StaleHandle => Some(codes::STALE_HANDLE),
            _ => None,
        }
    }
}

impl From<FaultKind> for Fault {
    fn from(kind: FaultKind) -> Self {
        Self { kind }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&FaultFormatter::format(&self.kind))
    }
}

impl std::error::Error for Fault {}

pub mod codes {
    pub const TYPE_MISMATCH: &str = "F0001";
    pub const ARGUMENT_COUNT_MISMATCH: &str = "F0002";
    pub const INDEX_OUT_OF_RANGE: &str = "F0003";
    pub const READONLY_ASSIGNMENT: &str = "F0004";
    pub const UNRESOLVED_DEPENDENCY: &str = "F0005";
    pub const STALE_HANDLE: &str = "F0006";
}
