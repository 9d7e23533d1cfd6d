//! Stacked attachments: evaluation order and failure selection.

use std::sync::Arc;

use covenant::{ensures, requires, Args, Call, Function, Signature, Value};
use parking_lot::Mutex;

use crate::common::assert_precondition;

type Log = Arc<Mutex<Vec<String>>>;

fn logged_body(log: &Log) -> Function {
    let log = Arc::clone(log);
    Function::new("body", Signature::new().param("x"), move |args: Args| {
        log.lock().push("body".to_string());
        Ok(args["x"].clone())
    })
    .unwrap()
}

/// Precondition `i` that fails when `x == i`, recording each evaluation.
fn guard(log: &Log, i: i64) -> covenant::Requires {
    let log = Arc::clone(log);
    requires(move |args: &Args| {
        log.lock().push(format!("pre{i}"));
        args.int("x") != Some(i)
    })
    .describe(format!("x is not {i}"))
}

/// Postcondition `i`, recording each evaluation.
fn check(log: &Log, i: i64) -> covenant::Ensures {
    let log = Arc::clone(log);
    ensures(move |_: &Args, _: &Value| {
        log.lock().push(format!("post{i}"));
        true
    })
    .describe(format!("post {i}"))
}

#[test]
fn test_outer_preconditions_run_first_postconditions_unwind() {
    let log: Log = Arc::default();
    let f = logged_body(&log)
        .attach(check(&log, 1))
        .and_then(|f| f.attach(guard(&log, 1)))
        .and_then(|f| f.attach(check(&log, 2)))
        .and_then(|f| f.attach(guard(&log, 2)))
        .unwrap();

    f.call(Call::positional([0])).unwrap();
    assert_eq!(
        *log.lock(),
        ["pre2", "pre1", "body", "post1", "post2"].map(String::from)
    );
}

#[test]
fn test_kth_precondition_failure_is_reported() {
    const N: i64 = 5;
    let log: Log = Arc::default();
    let mut f = logged_body(&log).attach(check(&log, 0)).unwrap();
    for i in 1..=N {
        f = f.attach(guard(&log, i)).unwrap();
    }
    assert_eq!(f.depth(), 1 + N as usize);

    for k in 1..=N {
        log.lock().clear();
        assert_precondition(f.call(Call::positional([k])), &format!("x is not {k}"));

        let seen = log.lock().clone();
        assert!(!seen.contains(&"body".to_string()));
        assert!(!seen.iter().any(|entry| entry.starts_with("post")));
        // Everything attached after the failing guard ran, nothing before it.
        let expected: Vec<String> = (k..=N).rev().map(|i| format!("pre{i}")).collect();
        assert_eq!(seen, expected);
    }
}

#[test]
fn test_inner_failure_passes_through_outer_layers() {
    let log: Log = Arc::default();
    let not_three =
        ensures(|_: &Args, result: &Value| result.as_int() != Some(3)).describe("not three");
    let f = logged_body(&log)
        .attach(not_three)
        .and_then(|f| f.attach(check(&log, 1)))
        .and_then(|f| f.attach(guard(&log, 9)))
        .unwrap();

    let err = f.call(Call::positional([3])).unwrap_err();
    assert_eq!(err.postcondition().unwrap().description, "not three");
    // The outer postcondition never ran: the inner failure ended the call.
    assert!(!log.lock().contains(&"post1".to_string()));
}

#[test]
fn test_wrapping_keeps_identity() {
    let log: Log = Arc::default();
    let plain = logged_body(&log);
    let wrapped = plain
        .clone()
        .attach(guard(&log, 1))
        .and_then(|f| f.attach(check(&log, 1)))
        .unwrap();

    assert_eq!(wrapped.name(), plain.name());
    assert_eq!(wrapped.signature(), plain.signature());
    assert_eq!(wrapped.is_async(), plain.is_async());
}
