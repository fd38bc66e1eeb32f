//! Call marshaling.
//!
//! Every bound invocation runs against a window of the space's value stack:
//! receiver (for member operations) and arguments first, then whatever
//! results the underlying operation and the filter chain leave behind.
//! Stack slots in the window are GC roots for the duration of the call, so
//! a collection triggered mid-call cannot reclaim an argument that script
//! code has not stored anywhere yet.

use crate::space::ObjectSpace;
use tether_core::{Fault, FaultKind, Value};

/// One bound call's view of the value stack.
///
/// Slot positions are 1-based from the window base (receiver first for
/// member operations, then arguments); negative positions count from the
/// top, results included, so `-1` is the most recently pushed result.
#[derive(Clone, Copy)]
pub struct CallWindow {
    pub(crate) base: usize,
    pub(crate) argc: usize,
    pub(crate) receiver: Option<Value>,
}

impl CallWindow {
    pub fn receiver(&self) -> Option<Value> {
        self.receiver
    }

    /// Number of slots currently in the window, results included.
    pub fn slot_count(&self, space: &ObjectSpace) -> usize {
        space.stack.len() - self.base
    }

    /// Resolve a declarative stack position against the live stack.
    pub fn slot(&self, space: &ObjectSpace, pos: i32) -> Result<Value, Fault> {
        let top = space.stack.len();
        let idx = if pos > 0 {
            self.base + (pos as usize) - 1
        } else if pos < 0 {
            match top.checked_sub((-pos) as usize) {
                Some(i) if i >= self.base => i,
                _ => return Err(Fault::new(FaultKind::StackSlotOutOfRange { position: pos })),
            }
        } else {
            return Err(Fault::new(FaultKind::StackSlotOutOfRange { position: pos }));
        };
        if idx >= top {
            return Err(Fault::new(FaultKind::StackSlotOutOfRange { position: pos }));
        }
        Ok(space.stack[idx])
    }

    /// The results pushed so far.
    pub fn results<'a>(&self, space: &'a ObjectSpace) -> &'a [Value] {
        &space.stack[self.base + self.argc..]
    }

    /// First result, or `VOID` when the call produced none.
    pub fn first_result(&self, space: &ObjectSpace) -> Value {
        space
            .stack
            .get(self.base + self.argc)
            .copied()
            .unwrap_or(Value::VOID)
    }

    pub fn push_result(&self, space: &mut ObjectSpace, v: Value) {
        space.stack.push(v);
    }

    /// Replace everything delivered so far.
    pub fn set_results(&self, space: &mut ObjectSpace, vals: &[Value]) {
        space.stack.truncate(self.base + self.argc);
        space.stack.extend_from_slice(vals);
    }
}

/// Check that an argument count falls in the accepted range.
pub fn validate_arity(args: &[Value], min: usize, max: usize) -> Result<(), Fault> {
    if args.len() < min || args.len() > max {
        return Err(Fault::new(FaultKind::ArgumentCountMismatch {
            expected_min: min,
            expected_max: max,
            actual: args.len(),
        }));
    }
    Ok(())
}
