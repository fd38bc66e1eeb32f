//! Declarative filter chains.
//!
//! A chain is an ordered list of post-processing steps attached to one
//! bound operation at declaration time. Steps execute after the underlying
//! operation succeeds, in declared order, against the live call window; a
//! failing step aborts the rest of the chain and the whole call. If the
//! underlying operation fails, no step runs at all.

use crate::call::CallWindow;
use crate::space::ObjectSpace;
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;
use tether_core::{Fault, FaultKind};

pub type CustomFn = Rc<dyn Fn(&mut ObjectSpace, &CallWindow) -> Result<(), Fault>>;

#[derive(Clone)]
pub enum FilterStep {
    /// Discard the delivered results and re-deliver the receiver handle
    /// itself, so chained calls observe the identical handle.
    ReturnsSelf,
    /// Register an edge making the produced member handle keep the
    /// receiver alive.
    SelfDependency,
    /// Register edges between explicit stack slots, resolved against the
    /// live window at invocation time (results included; negative counts
    /// from the top).
    StackDependencies {
        dependent: i32,
        dependencies: SmallVec<[i32; 2]>,
    },
    /// Arbitrary user step with full access to the call window.
    Custom(CustomFn),
}

impl fmt::Debug for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStep::ReturnsSelf => f.write_str("ReturnsSelf"),
            FilterStep::SelfDependency => f.write_str("SelfDependency"),
            FilterStep::StackDependencies {
                dependent,
                dependencies,
            } => f
                .debug_struct("StackDependencies")
                .field("dependent", dependent)
                .field("dependencies", dependencies)
                .finish(),
            FilterStep::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct FilterChain {
    steps: Vec<FilterStep>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn returns_self(mut self) -> Self {
        self.steps.push(FilterStep::ReturnsSelf);
        self
    }

    pub fn self_dependency(mut self) -> Self {
        self.steps.push(FilterStep::SelfDependency);
        self
    }

    pub fn stack_dependencies(
        mut self,
        dependent: i32,
        dependencies: impl IntoIterator<Item = i32>,
    ) -> Self {
        self.steps.push(FilterStep::StackDependencies {
            dependent,
            dependencies: dependencies.into_iter().collect(),
        });
        self
    }

    pub fn custom(
        mut self,
        f: impl Fn(&mut ObjectSpace, &CallWindow) -> Result<(), Fault> + 'static,
    ) -> Self {
        self.steps.push(FilterStep::Custom(Rc::new(f)));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step, in declared order, stopping at the first fault.
    pub(crate) fn apply(&self, space: &mut ObjectSpace, window: CallWindow) -> Result<(), Fault> {
        for step in &self.steps {
            step.apply(space, window)?;
        }
        Ok(())
    }
}

impl FilterStep {
    fn apply(&self, space: &mut ObjectSpace, window: CallWindow) -> Result<(), Fault> {
        match self {
            FilterStep::ReturnsSelf => {
                let recv = window
                    .receiver()
                    .ok_or_else(|| Fault::new(FaultKind::ReceiverRequired))?;
                window.set_results(space, &[recv]);
                Ok(())
            }
            FilterStep::SelfDependency => {
                let recv = window
                    .receiver()
                    .ok_or_else(|| Fault::new(FaultKind::ReceiverRequired))?;
                let result = window.first_result(space);
                space.register_dependency(result, recv)
            }
            FilterStep::StackDependencies {
                dependent,
                dependencies,
            } => {
                let target = window.slot(space, *dependent)?;
                if !target.is_obj() {
                    return Err(Fault::new(FaultKind::UnresolvedDependency {
                        position: *dependent,
                    }));
                }
                for &pos in dependencies {
                    let dep = window.slot(space, pos)?;
                    if !dep.is_obj() {
                        return Err(Fault::new(FaultKind::UnresolvedDependency {
                            position: pos,
                        }));
                    }
                    space.register_dependency(target, dep)?;
                }
                Ok(())
            }
            FilterStep::Custom(f) => f.as_ref()(space, &window),
        }
    }
}
