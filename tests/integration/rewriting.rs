//! Argument rewriting and preserved snapshots.

use std::sync::Arc;

use anyhow::anyhow;
use covenant::{
    ensures, preserve, requires, rewrite, transform, Args, Call, CallError, Function, Signature,
    Snapshot, Value,
};
use parking_lot::Mutex;

use crate::common::{assert_postcondition, iota};

type Shared = Arc<Mutex<Vec<i64>>>;

fn shared(args: &Args) -> anyhow::Result<&Shared> {
    args.object::<Shared>("l")
        .ok_or_else(|| anyhow!("l must be a shared list"))
}

/// `append(l, v)` pushes `v` onto the shared list in place and returns its new length.
fn append() -> Function {
    Function::new("append", Signature::new().param("l").param("v"), |args: Args| {
        let v = args.int("v").ok_or_else(|| anyhow!("v must be an int"))?;
        let mut items = shared(&args)?.lock();
        items.push(v);
        Ok(i64::try_from(items.len())?)
    })
    .unwrap()
}

#[test]
fn test_snapshot_sees_pre_call_state() {
    let append = append()
        .attach(
            ensures(|args: &Args, _: &Value, old: &Snapshot| {
                let now = args.object::<Shared>("l").map(|l| l.lock().clone());
                let before = old.list("l").map(|l| l.len());
                matches!((now, before), (Some(now), Some(before)) if now.len() == before + 1)
            })
            .describe("grows by exactly one"),
        )
        .and_then(|f| {
            // Deep copy: the body mutates the list in place.
            f.attach(preserve(|args: &Args| {
                let items: Vec<Value> = args
                    .object::<Shared>("l")
                    .map(|l| l.lock().iter().copied().map(Value::Int).collect())
                    .unwrap_or_default();
                Snapshot::new().with("l", items)
            }))
        })
        .unwrap();

    let list: Shared = Arc::new(Mutex::new(vec![1, 2]));
    let len = append
        .call(Call::positional([Value::object(Arc::clone(&list))]).arg(3))
        .unwrap();
    assert_eq!(len, Value::Int(3));
    assert_eq!(*list.lock(), [1, 2, 3]);
}

#[test]
fn test_shallow_snapshot_sees_mutation() {
    // Preserving the handle rather than its contents observes the mutation.
    let append = append()
        .attach(
            ensures(|args: &Args, _: &Value, old: &Snapshot| {
                let now = args.object::<Shared>("l").map(|l| l.lock().len());
                let before = old
                    .get("l")
                    .and_then(|v| v.as_object::<Shared>())
                    .map(|l| l.lock().len());
                now.zip(before).is_some_and(|(now, before)| now == before + 1)
            })
            .describe("grows by exactly one"),
        )
        .and_then(|f| {
            f.attach(preserve(|args: &Args| Snapshot::new().with("l", args["l"].clone())))
        })
        .unwrap();

    let list: Shared = Arc::new(Mutex::new(vec![]));
    assert_postcondition(
        append.call(Call::positional([Value::object(list)]).arg(1)),
        "grows by exactly one",
    );
}

#[test]
fn test_preservers_merge() {
    let both_captured = ensures(|_: &Args, _: &Value, old: &Snapshot| {
        old.int("a") == Some(1) && old.int("b") == Some(2) && old.len() == 2
    })
    .describe("both captured");
    let keep_a = preserve(|args: &Args| Snapshot::new().with("a", args["a"].clone()));
    let keep_b = preserve(|args: &Args| Snapshot::new().with("b", args["b"].clone()));

    let f = Function::new("f", Signature::new().param("a").param("b"), |_: Args| Ok(()))
        .and_then(|f| f.attach(both_captured))
        .and_then(|f| f.attach(keep_a))
        .and_then(|f| f.attach(keep_b))
        .unwrap();

    assert!(f.call(Call::positional([1, 2])).is_ok());
}

/// `first_n(l, n)`: sum of the first `n` elements, traversing `l` twice.
fn first_n() -> Function {
    Function::new("first_n", Signature::new().param("l").param("n"), |args: Args| {
        let n = usize::try_from(args.int("n").unwrap_or(0))?;
        let once: Vec<i64> = args["l"].elements().take(n).filter_map(|v| v.as_int()).collect();
        let twice: Vec<i64> = args["l"].elements().take(n).filter_map(|v| v.as_int()).collect();
        anyhow::ensure!(once == twice, "argument exhausted by the first traversal");
        Ok(once.iter().sum::<i64>())
    })
    .unwrap()
}

#[test]
fn test_transform_materializes_stream_before_checks() {
    let f = first_n()
        .attach(
            requires(|args: &Args| args["l"].elements().all(|v| v.as_int() >= Some(0)))
                .describe("all elements non-negative"),
        )
        .and_then(|f| {
            f.attach(transform(|args: &Args| {
                let bound = usize::try_from(args.int("n").unwrap_or(0)).unwrap_or(0);
                let items: Value = args["l"].elements().take(bound).collect();
                rewrite(args, [("l", items)])
            }))
        })
        .unwrap();

    let total = f.call(Call::positional([iota(), Value::Int(5)])).unwrap();
    assert_eq!(total, Value::Int(10));
}

#[test]
fn test_transform_drains_finite_stream_into_list() {
    let f = first_n()
        .attach(
            requires(|args: &Args| args["l"].elements().all(|v| v.as_int() >= Some(0)))
                .describe("all elements non-negative"),
        )
        .and_then(|f| {
            f.attach(transform(|args: &Args| match &args["l"] {
                Value::Stream(stream) => rewrite(args, [("l", Value::List(stream.materialize()))]),
                _ => Ok(args.clone()),
            }))
        })
        .unwrap();

    let countdown = Value::stream((0..4).rev().map(Value::Int));
    let total = f.call(Call::positional([countdown, Value::Int(4)])).unwrap();
    assert_eq!(total, Value::Int(6));
}

#[test]
fn test_stream_without_transform_is_exhausted_by_inspection() {
    let f = first_n()
        .attach(
            requires(|args: &Args| args["l"].elements().take(3).all(|v| v.as_int() >= Some(0)))
                .describe("leading elements non-negative"),
        )
        .unwrap();

    // The check consumes 0, 1, 2 and the first traversal 3, 4, so the
    // second traversal sees 5, 6 and the body refuses.
    let err = f.call(Call::positional([iota(), Value::Int(2)])).unwrap_err();
    assert!(matches!(err, CallError::Body(_)));
    assert!(err.to_string().contains("exhausted"));
}

#[test]
fn test_rewrite_of_unknown_parameter_fails_the_call() {
    let f = first_n()
        .attach(transform(|args: &Args| rewrite(args, [("m", 1)])))
        .unwrap();
    let err = f
        .call(Call::positional([Value::List(vec![]), Value::Int(0)]))
        .unwrap_err();
    assert!(matches!(err, CallError::UnknownParameter { name } if name == "m"));
}
