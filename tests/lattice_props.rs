//! Property tests for the type lattice.
//!
//! 1. Subtyping is reflexive and bounded by `Bottom` and `Top`.
//! 2. A literal's wrapped type sits below its promotion and its general type.
//! 3. Every member of a union is below the union.
//! 4. Promotion is idempotent.

use proptest::prelude::*;
use serde_json::{Value, json};
use typesynth::synth::{Type, promote, subtype};

const LABEL_POOL: &[&str] = &["a", "b", "k", "name"];

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-50i64..50).prop_map(Value::from),
        (-50i32..50).prop_map(|n| json!(f64::from(n) + 0.25)),
        prop::sample::select(&["", "a", "abc", "k=v"][..]).prop_map(Value::from),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        3 => arb_scalar(),
        1 => prop::collection::vec(arb_scalar(), 0..3).prop_map(Value::Array),
        1 => prop::collection::btree_map(
            prop::sample::select(LABEL_POOL).prop_map(str::to_string),
            arb_scalar(),
            0..3,
        )
        .prop_map(|fields| Value::Object(fields.into_iter().collect())),
    ]
}

fn arb_leaf_type() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::Top),
        Just(Type::Bottom),
        Just(Type::int()),
        Just(Type::float()),
        Just(Type::nominal("num")),
        Just(Type::string()),
        Just(Type::bool()),
        Just(Type::null()),
        Just(Type::nominal("record")),
        prop::sample::select(LABEL_POOL).prop_map(Type::var),
        arb_scalar().prop_map(|value| Type::wrap(&value)),
    ]
}

/// Types of bounded depth. Depth 0 = leaf types only.
fn arb_type(depth: u32) -> BoxedStrategy<Type> {
    if depth == 0 {
        return arb_leaf_type().boxed();
    }
    let inner = arb_type(depth - 1);
    prop_oneof![
        4 => arb_leaf_type(),
        1 => inner.clone().prop_map(Type::array_of),
        1 => prop::collection::btree_map(
            prop::sample::select(LABEL_POOL).prop_map(str::to_string),
            inner.clone(),
            1..3,
        )
        .prop_map(Type::FiniteRecord),
        1 => prop::collection::vec(inner, 2..=3).prop_map(Type::union),
    ]
    .boxed()
}

proptest! {
    #[test]
    fn subtype_is_reflexive(ty in arb_type(2)) {
        prop_assert!(subtype(&ty, &ty));
    }

    #[test]
    fn bottom_and_top_bound_every_type(ty in arb_type(2)) {
        prop_assert!(subtype(&Type::Bottom, &ty));
        prop_assert!(subtype(&ty, &Type::Top));
    }

    #[test]
    fn top_is_only_below_itself(ty in arb_type(2)) {
        prop_assume!(ty != Type::Top);
        prop_assert!(!subtype(&Type::Top, &ty));
    }
}

proptest! {
    #[test]
    fn wrapped_literal_is_below_its_promotion(value in arb_value()) {
        let wrapped = Type::wrap(&value);
        prop_assert!(subtype(&wrapped, &promote(&wrapped)));
        prop_assert!(subtype(&wrapped, &Type::general_type_of(&value)));
    }

    #[test]
    fn exact_literal_recovers_scalars(value in arb_scalar()) {
        prop_assert_eq!(Type::wrap(&value).exact_literal(), Some(value));
    }
}

proptest! {
    #[test]
    fn members_are_below_their_union(a in arb_type(1), b in arb_type(1)) {
        let joined = Type::union(vec![a.clone(), b.clone()]);
        prop_assert!(subtype(&a, &joined), "{} </= {}", a, joined);
        prop_assert!(subtype(&b, &joined), "{} </= {}", b, joined);
    }

    #[test]
    fn promotion_is_idempotent(ty in arb_type(2)) {
        let once = promote(&ty);
        prop_assert_eq!(promote(&once), once.clone());
    }
}
