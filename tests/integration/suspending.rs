//! Suspending callables: one await per call, checks on either side of it.

use std::sync::Arc;
use std::time::Duration;

use covenant::{ensures, requires, Args, Call, CallError, Function, Signature, Value};
use parking_lot::Mutex;

use crate::common::{assert_postcondition, assert_precondition, counter_type, Counter};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn slow_double(log: &Log) -> Function {
    let log = Arc::clone(log);
    Function::new_async("slow_double", Signature::new().param("x"), move |args: Args| {
        let log = Arc::clone(&log);
        async move {
            log.lock().push("body start");
            tokio::time::sleep(Duration::from_millis(1)).await;
            log.lock().push("body end");
            Ok(args.int("x").unwrap_or(0) * 2)
        }
    })
    .unwrap()
}

fn checked_slow_double(log: &Log) -> Function {
    let pre_log = Arc::clone(log);
    let post_log = Arc::clone(log);
    slow_double(log)
        .attach(
            ensures(move |_: &Args, result: &Value| {
                post_log.lock().push("post");
                result.as_int() < Some(100)
            })
            .describe("result below 100"),
        )
        .and_then(|f| {
            f.attach(
                requires(move |args: &Args| {
                    pre_log.lock().push("pre");
                    args.int("x") > Some(0)
                })
                .describe("x positive"),
            )
        })
        .unwrap()
}

#[tokio::test]
async fn test_checks_bracket_the_await() {
    let log: Log = Arc::default();
    let f = checked_slow_double(&log);

    assert_eq!(f.call_async(Call::positional([4])).await.unwrap(), Value::Int(8));
    assert_eq!(*log.lock(), ["pre", "body start", "body end", "post"]);
}

#[tokio::test]
async fn test_suspending_failures() {
    let log: Log = Arc::default();
    let f = checked_slow_double(&log);

    assert_precondition(f.call_async(Call::positional([-4])).await, "x positive");
    assert!(!log.lock().contains(&"body start"));

    assert_postcondition(f.call_async(Call::positional([60])).await, "result below 100");
}

#[tokio::test]
async fn test_blocking_call_is_refused() {
    let log: Log = Arc::default();
    let f = checked_slow_double(&log);

    assert!(matches!(
        f.call(Call::positional([1])),
        Err(CallError::RequiresAwait { .. })
    ));
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_blocking_functions_run_on_the_async_path() {
    let add = crate::common::add2()
        .attach(requires(|args: &Args| args.int("i") > Some(0)).describe("i positive"))
        .unwrap();
    assert_eq!(add.call_async(Call::positional([2, 3])).await.unwrap(), Value::Int(5));
    assert_precondition(add.call_async(Call::positional([0, 3])).await, "i positive");
}

#[tokio::test]
async fn test_cancelled_call_skips_postcondition() {
    let log: Log = Arc::default();
    let f = checked_slow_double(&log);

    let pending = f.call_async(Call::positional([1]));
    let outcome = tokio::time::timeout(Duration::ZERO, pending).await;
    assert!(outcome.is_err());

    let seen = log.lock().clone();
    assert!(!seen.contains(&"post"));
    assert!(!seen.contains(&"body end"));
}

#[tokio::test]
async fn test_async_methods_keep_the_invariant() {
    let slow_add = Function::new_async(
        "slow_add",
        Signature::method().param("v"),
        |args: Args| async move {
            let v = args.int("v").unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(1)).await;
            let counter = crate::common::counter_of(&args)?;
            Ok::<_, anyhow::Error>(counter.write(|c| {
                c.value += v;
                c.value
            }))
        },
    )
    .unwrap();
    let counter_def = counter_type()
        .method("slow_add", slow_add)
        .unwrap()
        .attach(covenant::invariant(|c: &Counter| c.value >= 0).describe("counter >= 0"))
        .unwrap();

    let counter = counter_def.instantiate_async(Call::positional([1])).await.unwrap();
    assert_eq!(
        counter.call_async("slow_add", Call::positional([2])).await.unwrap(),
        Value::Int(3)
    );
    assert_postcondition(
        counter.call_async("slow_add", Call::positional([-10])).await,
        "counter >= 0",
    );
}
