use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use tether_bind::{ObjectSpace, Value};

#[derive(Debug, Clone)]
enum Op {
    Get(i64),
    Set(i64, i64),
    Push(i64),
    Len,
    Snapshot,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..12i64).prop_map(Op::Get),
        ((0..12i64), (-1000..1000i64)).prop_map(|(i, x)| Op::Set(i, x)),
        (-1000..1000i64).prop_map(Op::Push),
        Just(Op::Len),
        Just(Op::Snapshot),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32, max_shrink_iters: 200, .. ProptestConfig::default()
    })]
    #[test]
    fn seq_view_matches_model(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let mut space = ObjectSpace::new();
        let view = space.bind_seq(Vec::<i64>::new());
        space.set_global("v", view);
        let mut model: Vec<i64> = Vec::new();

        for op in ops {
            match op {
                Op::Get(i) => {
                    let got = space.seq_get(view, i);
                    if i < 1 {
                        prop_assert!(got.is_err());
                    } else {
                        let got = got.unwrap();
                        match model.get((i - 1) as usize) {
                            Some(x) => {
                                prop_assert!(got.is_int());
                                prop_assert_eq!(got.as_i64(), *x);
                            }
                            None => prop_assert!(got.is_void()),
                        }
                    }
                }
                Op::Set(i, x) => {
                    let r = space.seq_set(view, i, Value::from_i64(x));
                    if i >= 1 && (i as usize) <= model.len() {
                        prop_assert!(r.is_ok());
                        model[(i - 1) as usize] = x;
                    } else if i >= 1 && (i as usize) == model.len() + 1 {
                        prop_assert!(r.is_ok());
                        model.push(x);
                    } else {
                        prop_assert!(r.is_err());
                    }
                }
                Op::Push(x) => {
                    space.seq_push(view, Value::from_i64(x)).unwrap();
                    model.push(x);
                }
                Op::Len => prop_assert_eq!(space.seq_len(view).unwrap(), model.len()),
                Op::Snapshot => {
                    prop_assert_eq!(space.seq_elems::<i64>(view).unwrap(), model.clone());
                }
            }
        }
        prop_assert_eq!(space.seq_elems::<i64>(view).unwrap(), model);
    }
}
