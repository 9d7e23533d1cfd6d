//! Shared test utilities and fixtures.

#![allow(dead_code)]

use anyhow::anyhow;
use covenant::{
    hooks, Args, AttachmentError, CallError, Function, Instance, Signature, TypeDef, Value,
};

// Re-export canonical fixtures from covenant::testing
pub use covenant::testing::{add2, counter_of, counter_type, iota, Counter};

// ============================================================================
// NONEMPTY LIST FIXTURE
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Items {
    pub items: Vec<i64>,
}

fn items_of(args: &Args) -> anyhow::Result<&Instance<Items>> {
    args.receiver::<Items>()
        .ok_or_else(|| anyhow!("receiver is not a list"))
}

/// A list type that starts with one element:
/// `__init__(self, first)`, `push(self, v)`, `pop(self)`,
/// `__getitem__(self, i)`, `__len__(self)`.
pub fn nonempty_list_type() -> TypeDef<Items> {
    list_methods().expect("every fixture method takes self")
}

fn list_methods() -> Result<TypeDef<Items>, AttachmentError> {
    let init = Function::new(
        hooks::INIT,
        Signature::method().param("first"),
        |args: Args| {
            let first = args.int("first").ok_or_else(|| anyhow!("first must be an int"))?;
            items_of(&args)?.write(|l| l.items.push(first));
            Ok(())
        },
    )?;
    let push = Function::new("push", Signature::method().param("v"), |args: Args| {
        let v = args.int("v").ok_or_else(|| anyhow!("v must be an int"))?;
        items_of(&args)?.write(|l| l.items.push(v));
        Ok(())
    })?;
    let pop = Function::new("pop", Signature::method(), |args: Args| {
        let popped = items_of(&args)?.write(|l| l.items.pop());
        popped.ok_or_else(|| anyhow!("pop from empty list"))
    })?;
    let get = Function::new(hooks::INDEX_GET, Signature::method().param("i"), |args: Args| {
        let i = args.int("i").ok_or_else(|| anyhow!("i must be an int"))?;
        let i = usize::try_from(i)?;
        let item = items_of(&args)?.read(|l| l.items.get(i).copied());
        item.ok_or_else(|| anyhow!("index {i} out of range"))
    })?;
    let len = Function::new("__len__", Signature::method(), |args: Args| {
        let len = items_of(&args)?.read(|l| l.items.len());
        Ok(i64::try_from(len)?)
    })?;

    TypeDef::new("NonemptyList")
        .method(hooks::INIT, init)
        .and_then(|def| def.method("push", push))
        .and_then(|def| def.method("pop", pop))
        .and_then(|def| def.method(hooks::INDEX_GET, get))
        .and_then(|def| def.method("__len__", len))
}

// ============================================================================
// ASSERTIONS
// ============================================================================

/// Assert that `result` failed a precondition described by `description`.
pub fn assert_precondition<T: std::fmt::Debug>(result: Result<T, CallError>, description: &str) {
    match result {
        Err(err) => match err.precondition() {
            Some(failure) => assert_eq!(failure.description, description),
            None => panic!("expected precondition failure, got {err}"),
        },
        Ok(value) => panic!("expected precondition failure, got {value:?}"),
    }
}

/// Assert that `result` failed a postcondition described by `description`.
pub fn assert_postcondition<T: std::fmt::Debug>(result: Result<T, CallError>, description: &str) {
    match result {
        Err(err) => match err.postcondition() {
            Some(failure) => assert_eq!(failure.description, description),
            None => panic!("expected postcondition failure, got {err}"),
        },
        Ok(value) => panic!("expected postcondition failure, got {value:?}"),
    }
}

/// The integers of a list value.
pub fn ints(value: &Value) -> Vec<i64> {
    value.elements().filter_map(|v| v.as_int()).collect()
}
