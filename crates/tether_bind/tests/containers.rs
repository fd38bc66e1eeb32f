use std::collections::HashMap;
use tether_bind::{fast_map_new, ClassSpec, FaultKind, ObjectSpace, Value};

#[test]
fn basic_serialization_is_one_based() {
    let mut space = ObjectSpace::new();
    let b = space.bind_seq((1..=30).collect::<Vec<i64>>());
    space.set_global("b", b);

    assert_eq!(space.seq_len(b).unwrap(), 30);
    for k in 1..=30 {
        assert_eq!(space.seq_get(b, k).unwrap().as_i64(), k);
    }
    // Past-the-end reads terminate iteration instead of faulting.
    assert!(space.seq_get(b, 31).unwrap().is_void());
    // There is no slot zero in the host convention.
    assert!(space.seq_get(b, 0).is_err());
}

#[test]
fn view_writes_alias_the_native_container() {
    let mut space = ObjectSpace::new();
    let vec1 = space.bind_seq(vec![-1i64, -1, -1]);
    space.set_global("vec1", vec1);

    for k in 1..=3 {
        space.seq_set(vec1, k, Value::from_i64(k)).unwrap();
    }
    assert_eq!(space.seq_elems::<i64>(vec1).unwrap(), vec![1, 2, 3]);
    assert_eq!(space.seq_len(vec1).unwrap(), 3);
}

#[test]
fn append_idiom_grows_by_exactly_one() {
    let mut space = ObjectSpace::new();
    let vec2 = space.bind_seq(vec![-1i64, -1, -1]);
    space.set_global("vec2", vec2);

    // vec[#vec] overwrites the last element, vec[#vec + 1] appends.
    space.seq_set(vec2, 3, Value::from_i64(-10456407)).unwrap();
    space.seq_set(vec2, 4, Value::from_i64(-54)).unwrap();
    assert_eq!(
        space.seq_elems::<i64>(vec2).unwrap(),
        vec![-1, -1, -10456407, -54]
    );

    // Writes beyond end + 1 fail without mutating the container.
    let err = space.seq_set(vec2, 6, Value::from_i64(1)).unwrap_err();
    assert_eq!(err.kind, FaultKind::IndexOutOfRange { index: 6, len: 4 });
    assert_eq!(
        space.seq_elems::<i64>(vec2).unwrap(),
        vec![-1, -1, -10456407, -54]
    );
}

#[test]
fn snapshot_table_is_disconnected() {
    let mut space = ObjectSpace::new();
    let live = space.bind_seq(vec![1i64, 2, 3]);
    space.set_global("live", live);

    let snap = space.seq_snapshot(live).unwrap();
    space.set_global("snap", snap);
    space.seq_set(live, 1, Value::from_i64(99)).unwrap();

    assert_eq!(space.list_items(snap).unwrap()[0].as_i64(), 1);
    assert_eq!(space.seq_get(live, 1).unwrap().as_i64(), 99);
}

#[test]
fn as_table_copies_without_binding() {
    let mut space = ObjectSpace::new();
    let native = vec![1i64, 2, 3];
    let t = space.as_table(&native);

    let items = space.list_items(t).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[2].as_i64(), 3);
    // The caller still owns the container.
    assert_eq!(native, vec![1, 2, 3]);
}

struct Basket {
    seq: Vec<i64>,
}

fn register_basket(space: &mut ObjectSpace) {
    space.register_class(
        ClassSpec::<Basket>::new("basket")
            .ctor(|_, _args| Ok(Basket { seq: vec![-1, -1, -1] }))
            .seq_field("seq", |b: &Basket| &b.seq, |b: &mut Basket| &mut b.seq)
            .seq_field_readonly(
                "readonly_seq",
                |b: &Basket| &b.seq,
                |b: &mut Basket| &mut b.seq,
            ),
    );
}

#[test]
fn container_fields_share_identity_and_respect_readonly() {
    let mut space = ObjectSpace::new();
    register_basket(&mut space);

    let a = space.construct("basket", &[]).unwrap();
    space.set_global("a", a);

    // Both accessors resolve to the same live view handle.
    let x = space.get_field(a, "seq").unwrap();
    let y = space.get_field(a, "readonly_seq").unwrap();
    assert_eq!(x, y);

    // Assigning through the writable member replaces the contents and the
    // view observes it (aliasing).
    let replacement = space.new_list(vec![
        Value::from_i64(7),
        Value::from_i64(8),
        Value::from_i64(9),
    ]);
    space.set_field(a, "seq", replacement).unwrap();
    assert_eq!(space.seq_elems::<i64>(x).unwrap(), vec![7, 8, 9]);
    assert_eq!(space.native_ref::<Basket>(a).unwrap().seq, vec![7, 8, 9]);

    // The readonly member rejects assignment and nothing changes.
    let err = space.set_field(a, "readonly_seq", replacement).unwrap_err();
    assert_eq!(
        err.kind,
        FaultKind::ReadonlyAssignment("readonly_seq".to_string())
    );
    assert_eq!(space.native_ref::<Basket>(a).unwrap().seq, vec![7, 8, 9]);
}

#[test]
fn field_view_supports_append_idiom() {
    let mut space = ObjectSpace::new();
    register_basket(&mut space);

    let a = space.construct("basket", &[]).unwrap();
    space.set_global("a", a);
    let view = space.get_field(a, "seq").unwrap();

    let len = space.seq_len(view).unwrap();
    space
        .seq_set(view, len as i64 + 1, Value::from_i64(42))
        .unwrap();
    assert_eq!(space.native_ref::<Basket>(a).unwrap().seq, vec![-1, -1, -1, 42]);
}

#[test]
fn string_and_float_element_containers() {
    let mut space = ObjectSpace::new();

    let s = space.bind_seq(vec!["a".to_string(), "b".to_string()]);
    space.set_global("s", s);
    let first = space.seq_get(s, 1).unwrap();
    assert_eq!(space.str_contents(first).unwrap(), "a");
    let c = space.new_str("c");
    space.seq_set(s, 3, c).unwrap();
    assert_eq!(
        space.seq_elems::<String>(s).unwrap(),
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
    // Element type mismatches are rejected.
    let err = space.seq_set(s, 1, Value::from_i64(3)).unwrap_err();
    assert!(matches!(err.kind, FaultKind::TypeMismatch { .. }));

    let f = space.bind_seq(vec![1.5f64]);
    assert_eq!(space.seq_get(f, 1).unwrap().as_f64(), 1.5);
    // Ints coerce into float containers.
    space.seq_set(f, 1, Value::from_i64(2)).unwrap();
    assert_eq!(space.seq_elems::<f64>(f).unwrap(), vec![2.0]);
}

#[test]
fn map_views_alias_and_snapshot() {
    let mut space = ObjectSpace::new();
    let mut native = HashMap::new();
    native.insert("a".to_string(), 1i64);
    let m = space.bind_map(native);
    space.set_global("m", m);

    assert_eq!(space.map_len(m).unwrap(), 1);
    assert_eq!(space.map_get(m, "a").unwrap().as_i64(), 1);
    assert!(space.map_get(m, "missing").unwrap().is_void());

    space.map_insert(m, "b", Value::from_i64(2)).unwrap();
    let mut keys = space.map_keys(m).unwrap();
    keys.sort_unstable();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

    let snap = space.map_snapshot(m).unwrap();
    space.set_global("snap", snap);
    space.map_insert(m, "c", Value::from_i64(3)).unwrap();
    assert_eq!(space.dict_len(snap).unwrap(), 2);
    assert_eq!(space.dict_get(snap, "b").unwrap().as_i64(), 2);
    assert!(space.dict_get(snap, "c").unwrap().is_void());

    let removed = space.map_remove(m, "a").unwrap();
    assert_eq!(removed.as_i64(), 1);
    assert_eq!(space.map_len(m).unwrap(), 2);
}

#[test]
fn as_table_map_copies_an_unbound_container() {
    let mut space = ObjectSpace::new();
    let mut native = fast_map_new();
    native.insert("x".to_string(), 1i64);
    let t = space.as_table_map(&native);
    assert_eq!(space.dict_get(t, "x").unwrap().as_i64(), 1);
    assert_eq!(native.len(), 1);
}

struct Inventory {
    counts: HashMap<String, i64>,
}

#[test]
fn map_field_projects_a_live_view() {
    let mut space = ObjectSpace::new();
    space.register_class(
        ClassSpec::<Inventory>::new("inventory")
            .ctor(|_, _args| {
                let mut counts = HashMap::new();
                counts.insert("arrows".to_string(), 12i64);
                Ok(Inventory { counts })
            })
            .map_field(
                "counts",
                |i: &Inventory| &i.counts,
                |i: &mut Inventory| &mut i.counts,
            ),
    );

    let inv = space.construct("inventory", &[]).unwrap();
    space.set_global("inv", inv);

    let view = space.get_field(inv, "counts").unwrap();
    assert_eq!(space.get_field(inv, "counts").unwrap(), view);
    assert_eq!(space.map_get(view, "arrows").unwrap().as_i64(), 12);

    space.map_insert(view, "bolts", Value::from_i64(3)).unwrap();
    assert_eq!(
        space
            .native_ref::<Inventory>(inv)
            .unwrap()
            .counts
            .get("bolts"),
        Some(&3)
    );
}
