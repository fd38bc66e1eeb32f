mod common;

use common::*;
use std::cell::Cell;
use std::rc::Rc;
use tether_bind::{Fault, FaultKind, FilterChain, IntoValue, ObjectSpace, Value};

#[test]
fn returns_self_delivers_the_receiver_handle() {
    let mut space = ObjectSpace::new();
    register_vec2(&mut space);

    let v1 = space.construct("vec2", &[]).unwrap();
    space.set_global("v1", v1);

    let v2 = space.call_method(v1, "normalize", &[]).unwrap();
    assert_eq!(v1, v2);

    // Repeated invocations keep yielding the identical handle.
    let v3 = space.call_method(v1, "normalize", &[]).unwrap();
    assert_eq!(v1, v3);

    // The underlying call still ran: the vector is normalized.
    let x = space.get_field(v2, "x").unwrap();
    assert!((x.as_f64() - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);

    // The alias keeps the object alive after the original global goes away.
    space.set_global("v2", v2);
    space.clear_global("v1");
    space.collect();
    let x = space.get_field(v2, "x").unwrap();
    assert!(x.is_f64());
}

#[test]
fn self_dependency_keeps_owner_alive_through_member_handle() {
    let log = drop_log();
    let mut space = ObjectSpace::new();
    register_gc_fixtures(&mut space, &log);

    let g = space.construct("gc_test", &[]).unwrap();
    space.set_global("g", g);
    let d = space.get_field(g, "d").unwrap();
    space.set_global("d", d);

    // Same member, same handle.
    assert_eq!(space.get_field(g, "d").unwrap(), d);
    assert_eq!(space.get_field(d, "value").unwrap().as_i64(), 20);
    assert!(log.borrow().is_empty());

    // Releasing the owner's last external handle must not finalize the
    // member while it is still reachable.
    space.clear_global("g");
    space.collect();
    assert!(log.borrow().is_empty());
    assert_eq!(space.get_field(d, "value").unwrap().as_i64(), 20);

    // Once the member goes too, both finalize in the same cycle, once each.
    space.clear_global("d");
    space.collect();
    assert_eq!(log_of(&log), vec!["gc_test", "dep"]);
}

#[test]
fn stack_dependencies_tie_argument_to_constructed_object() {
    let log = drop_log();
    let mut space = ObjectSpace::new();
    register_stack_fixtures(&mut space, &log);

    let h = space.construct("holder", &[]).unwrap();
    space.set_global("h", h);
    let dor = space.construct("depends_on_reference", &[h]).unwrap();
    space.set_global("dor", dor);
    let c = space.get_field(dor, "comp").unwrap();
    space.set_global("c", c);
    assert!(log.borrow().is_empty());

    space.clear_global("h");
    space.collect();
    assert!(log.borrow().is_empty());
    // The holder is still reachable through the constructed object's edge.
    assert_eq!(space.get_field(h, "value").unwrap().as_i64(), 20);

    space.clear_global("c");
    space.collect();
    assert!(log.borrow().is_empty());

    space.clear_global("dor");
    space.collect();
    assert_eq!(
        log_of(&log),
        vec!["holder", "depends_on_reference", "composition_related"]
    );
}

#[test]
fn stack_dependency_survives_collection_before_result_is_stored() {
    let log = drop_log();
    let mut space = ObjectSpace::new();
    register_stack_fixtures(&mut space, &log);

    let h = space.construct("holder", &[]).unwrap();
    space.set_global("h", h);
    let dor = space.construct("depends_on_reference", &[h]).unwrap();
    // The call result is the only reference; root it the way a marshaled
    // return value would be.
    space.protect(dor);
    space.clear_global("h");

    space.collect();
    assert!(log.borrow().is_empty());
    assert_eq!(space.get_field(h, "value").unwrap().as_i64(), 20);

    space.set_global("dor", dor);
    space.unprotect(dor);
    space.collect();
    assert!(log.borrow().is_empty());

    space.clear_global("dor");
    space.collect();
    assert_eq!(log_of(&log).len(), 3);
}

#[test]
fn custom_filter_replaces_the_result() {
    let mut space = ObjectSpace::new();
    space.set_function_with(
        "f",
        |space, _args| Ok("hi there".into_value(space)),
        FilterChain::new().custom(|space, window| {
            window.set_results(space, &[Value::from_i64(24)]);
            Ok(())
        }),
    );

    let value = space.call_function("f", &[]).unwrap();
    assert!(value.is_int());
    assert_eq!(value.as_i64(), 24);
}

#[test]
fn later_filter_steps_override_earlier_ones() {
    let mut space = ObjectSpace::new();
    space.set_function_with(
        "g",
        |_space, _args| Ok(Value::from_i64(1)),
        FilterChain::new()
            .custom(|space, window| {
                window.set_results(space, &[Value::from_i64(100)]);
                Ok(())
            })
            .custom(|space, window| {
                window.set_results(space, &[Value::from_i64(24)]);
                Ok(())
            }),
    );

    assert_eq!(space.call_function("g", &[]).unwrap().as_i64(), 24);
}

#[test]
fn failing_operation_runs_no_filter_step() {
    let ran = Rc::new(Cell::new(0u32));
    let observer = ran.clone();

    let mut space = ObjectSpace::new();
    space.set_function_with(
        "boom",
        |_space, _args| Err(Fault::raw("boom")),
        FilterChain::new().custom(move |_space, _window| {
            observer.set(observer.get() + 1);
            Ok(())
        }),
    );

    let err = space.call_function("boom", &[]).unwrap_err();
    assert_eq!(err.kind, FaultKind::Raw("boom".to_string()));
    assert_eq!(ran.get(), 0);
}

#[test]
fn failing_step_aborts_the_rest_of_the_chain() {
    let ran = Rc::new(Cell::new(0u32));
    let observer = ran.clone();

    let mut space = ObjectSpace::new();
    space.set_function_with(
        "halts",
        |_space, _args| Ok(Value::VOID),
        FilterChain::new()
            .custom(|_space, _window| Err(Fault::raw("step one failed")))
            .custom(move |_space, _window| {
                observer.set(observer.get() + 1);
                Ok(())
            }),
    );

    let err = space.call_function("halts", &[]).unwrap_err();
    assert_eq!(err.kind, FaultKind::Raw("step one failed".to_string()));
    assert_eq!(ran.get(), 0);
}

#[test]
fn dependency_on_primitive_slot_faults_without_registering() {
    let mut space = ObjectSpace::new();
    space.set_function_with(
        "tie",
        |_space, _args| Ok(Value::VOID),
        FilterChain::new().stack_dependencies(1, [2]),
    );

    let err = space
        .call_function("tie", &[Value::from_i64(1), Value::from_i64(2)])
        .unwrap_err();
    assert_eq!(err.kind, FaultKind::UnresolvedDependency { position: 1 });

    // A handle in slot one still cannot depend on a primitive in slot two.
    let view = space.bind_seq(vec![1i64]);
    let err = space
        .call_function("tie", &[view, Value::from_i64(2)])
        .unwrap_err();
    assert_eq!(err.kind, FaultKind::UnresolvedDependency { position: 2 });
    assert_eq!(space.heap_stats().dependency_edges, 0);
}

#[test]
fn returns_self_without_receiver_faults() {
    let mut space = ObjectSpace::new();
    space.set_function_with(
        "no_recv",
        |_space, _args| Ok(Value::VOID),
        FilterChain::new().returns_self(),
    );

    let err = space.call_function("no_recv", &[]).unwrap_err();
    assert_eq!(err.kind, FaultKind::ReceiverRequired);
}

#[test]
fn out_of_window_stack_position_faults() {
    let mut space = ObjectSpace::new();
    space.set_function_with(
        "wide",
        |_space, args| Ok(args[0]),
        FilterChain::new().stack_dependencies(-1, [7]),
    );

    let view = space.bind_seq(vec![1i64]);
    let err = space.call_function("wide", &[view]).unwrap_err();
    assert_eq!(err.kind, FaultKind::StackSlotOutOfRange { position: 7 });
}
