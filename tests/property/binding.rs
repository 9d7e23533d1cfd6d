//! Argument binding is independent of how a call spells its arguments.

use covenant::{Call, CallError, Signature, Value};
use proptest::prelude::*;

/// `f(a, b, c=10, *rest, k=20)`
fn shape() -> Signature {
    Signature::new()
        .param("a")
        .param("b")
        .param_default("c", 10)
        .variadic("rest")
        .keyword_only_default("k", 20)
}

proptest! {
    #[test]
    fn prop_positional_and_named_bind_alike(
        a in any::<i64>(),
        b in any::<i64>(),
        c in any::<i64>(),
    ) {
        let positional = shape().bind("f", Call::positional([a, b, c])).unwrap();
        let named = shape()
            .bind("f", Call::new().named("c", c).named("b", b).named("a", a))
            .unwrap();
        prop_assert_eq!(positional, named);
    }

    #[test]
    fn prop_overflow_goes_to_catch_all(values in prop::collection::vec(any::<i64>(), 3..12)) {
        let args = shape().bind("f", Call::positional(values.clone())).unwrap();

        let rest: Vec<Value> = values[3..].iter().copied().map(Value::Int).collect();
        prop_assert_eq!(args.list("rest"), Some(&rest[..]));
        prop_assert_eq!(args.int("k"), Some(20));
        prop_assert_eq!(args.len(), 5);
    }

    #[test]
    fn prop_explicit_values_beat_defaults(c in any::<i64>(), k in any::<i64>()) {
        let args = shape()
            .bind("f", Call::positional([1, 2]).named("k", k).named("c", c))
            .unwrap();
        prop_assert_eq!(args.int("c"), Some(c));
        prop_assert_eq!(args.int("k"), Some(k));
    }

    #[test]
    fn prop_missing_names_first_unbound(bound_b in any::<bool>()) {
        let call = if bound_b { Call::new().named("b", 1) } else { Call::new() };
        let err = shape().bind("f", call).unwrap_err();
        prop_assert!(matches!(err, CallError::MissingArgument(ref m) if m.name == "a"));
    }
}
