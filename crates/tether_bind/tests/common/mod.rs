#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use tether_bind::{validate_arity, ClassSpec, FilterChain, ObjectSpace, Value};

/// Shared destructor log; fixture types push their name when dropped.
pub type DropLog = Rc<RefCell<Vec<&'static str>>>;

pub fn drop_log() -> DropLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn log_of(log: &DropLog) -> Vec<&'static str> {
    log.borrow().clone()
}

pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn normalize(&mut self) {
        let len2 = self.x * self.x + self.y * self.y;
        if len2 != 0.0 {
            let len = len2.sqrt();
            self.x /= len;
            self.y /= len;
        }
    }
}

pub fn register_vec2(space: &mut ObjectSpace) {
    space.register_class(
        ClassSpec::<Vec2>::new("vec2")
            .ctor(|_, args| {
                validate_arity(args, 0, 0)?;
                Ok(Vec2 { x: 20.0, y: 20.0 })
            })
            .field("x", |v: &Vec2| v.x, |v: &mut Vec2, x| v.x = x)
            .field("y", |v: &Vec2| v.y, |v: &mut Vec2, y| v.y = y)
            .method_with(
                "normalize",
                |space, recv, _args| {
                    let v = space.native_mut::<Vec2>(recv)?;
                    v.normalize();
                    Ok(Value::VOID)
                },
                FilterChain::new().returns_self(),
            ),
    );
}

pub struct Dep {
    pub value: i64,
    log: DropLog,
}

impl Drop for Dep {
    fn drop(&mut self) {
        self.log.borrow_mut().push("dep");
    }
}

pub struct GcTest {
    pub d: Dep,
    log: DropLog,
}

impl GcTest {
    pub fn new(log: DropLog) -> Self {
        Self {
            d: Dep {
                value: 20,
                log: log.clone(),
            },
            log,
        }
    }
}

impl Drop for GcTest {
    fn drop(&mut self) {
        self.log.borrow_mut().push("gc_test");
    }
}

/// `dep` + `gc_test` classes with the member lifetime tied to the owner.
pub fn register_gc_fixtures(space: &mut ObjectSpace, log: &DropLog) {
    space.register_class(
        ClassSpec::<Dep>::new("dep").field("value", |d: &Dep| d.value, |d: &mut Dep, v| {
            d.value = v
        }),
    );
    let ctor_log = log.clone();
    space.register_class(
        ClassSpec::<GcTest>::new("gc_test")
            .ctor(move |_, args| {
                validate_arity(args, 0, 0)?;
                Ok(GcTest::new(ctor_log.clone()))
            })
            .object_field_with(
                "d",
                |g: &GcTest| &g.d,
                |g: &mut GcTest| &mut g.d,
                FilterChain::new().self_dependency(),
            ),
    );
}

/// Same shape, but the member projection carries no lifetime filter.
pub fn register_gc_fixtures_unfiltered(space: &mut ObjectSpace, log: &DropLog) {
    space.register_class(
        ClassSpec::<Dep>::new("dep").field("value", |d: &Dep| d.value, |d: &mut Dep, v| {
            d.value = v
        }),
    );
    let ctor_log = log.clone();
    space.register_class(
        ClassSpec::<GcTest>::new("gc_test")
            .ctor(move |_, args| {
                validate_arity(args, 0, 0)?;
                Ok(GcTest::new(ctor_log.clone()))
            })
            .object_field("d", |g: &GcTest| &g.d, |g: &mut GcTest| &mut g.d),
    );
}

pub struct Holder {
    pub value: i64,
    log: DropLog,
}

impl Drop for Holder {
    fn drop(&mut self) {
        self.log.borrow_mut().push("holder");
    }
}

pub struct Comp {
    pub text: String,
    log: DropLog,
}

impl Drop for Comp {
    fn drop(&mut self) {
        self.log.borrow_mut().push("composition_related");
    }
}

pub struct DependsOnRef {
    /// Handle of the holder this object was constructed against. Kept alive
    /// by the stack-dependency edge registered at construction.
    pub href: Value,
    pub comp: Comp,
    log: DropLog,
}

impl Drop for DependsOnRef {
    fn drop(&mut self) {
        self.log.borrow_mut().push("depends_on_reference");
    }
}

pub fn register_stack_fixtures(space: &mut ObjectSpace, log: &DropLog) {
    let holder_log = log.clone();
    space.register_class(
        ClassSpec::<Holder>::new("holder")
            .ctor(move |_, args| {
                validate_arity(args, 0, 0)?;
                Ok(Holder {
                    value: 20,
                    log: holder_log.clone(),
                })
            })
            .field("value", |h: &Holder| h.value, |h: &mut Holder, v| {
                h.value = v
            }),
    );
    space.register_class(ClassSpec::<Comp>::new("composition_related").field(
        "text",
        |c: &Comp| c.text.clone(),
        |c: &mut Comp, t: String| c.text = t,
    ));
    let dor_log = log.clone();
    space.register_class(
        ClassSpec::<DependsOnRef>::new("depends_on_reference")
            .ctor_with(
                move |space, args| {
                    validate_arity(args, 1, 1)?;
                    space.native_ref::<Holder>(args[0])?;
                    Ok(DependsOnRef {
                        href: args[0],
                        comp: Comp {
                            text: "bark".to_string(),
                            log: dor_log.clone(),
                        },
                        log: dor_log.clone(),
                    })
                },
                FilterChain::new().stack_dependencies(-1, [1]),
            )
            .object_field(
                "comp",
                |d: &DependsOnRef| &d.comp,
                |d: &mut DependsOnRef| &mut d.comp,
            ),
    );
}

pub struct Node {
    pub tag: &'static str,
    log: DropLog,
}

impl Node {
    pub fn new(tag: &'static str, log: &DropLog) -> Self {
        Self {
            tag,
            log: log.clone(),
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.log.borrow_mut().push(self.tag);
    }
}

pub fn register_node(space: &mut ObjectSpace) {
    space.register_class(ClassSpec::<Node>::new("node").field_readonly("tag", |n: &Node| {
        n.tag.to_string()
    }));
}
