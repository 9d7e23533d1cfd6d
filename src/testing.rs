//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides canonical fixtures so every suite exercises the same shapes.

#![doc(hidden)]

use std::sync::Arc;

use anyhow::anyhow;
use indexmap::IndexMap;

use crate::error::AttachmentError;
use crate::function::Function;
use crate::invariant::{hooks, Instance, Member, TypeDef};
use crate::record::Args;
use crate::signature::{Call, Signature};
use crate::value::{Stream, Value};

/// `add2(i, j) = i + j`.
pub fn add2() -> Function {
    Function::new("add2", Signature::new().param("i").param("j"), |args: Args| {
        let i = args.int("i").ok_or_else(|| anyhow!("i must be an int"))?;
        let j = args.int("j").ok_or_else(|| anyhow!("j must be an int"))?;
        Ok(i + j)
    })
    .expect("add2 declares distinct parameters")
}

/// The naturals 0, 1, 2, … as a single-pass stream.
pub fn iota() -> Value {
    Value::Stream(Stream::new((0..).map(Value::Int)))
}

/// State of the counter fixture.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Counter {
    pub value: i64,
}

/// Borrow the receiver of a counter method.
pub fn counter_of(args: &Args) -> anyhow::Result<&Instance<Counter>> {
    args.receiver::<Counter>()
        .ok_or_else(|| anyhow!("receiver is not a Counter"))
}

fn int_arg(args: &Args, name: &str) -> anyhow::Result<i64> {
    args.int(name)
        .ok_or_else(|| anyhow!("{name} must be an int"))
}

/// A counter type with one member of every kind:
///
/// - `__init__(self, start=0)`
/// - `increment(self, v)`, `get(self)`, `bump_twice(self, v)`
/// - `__lt__(self, other)`, an allow-listed hook
/// - `__force__(self, v)`, a private method that sets the value
/// - `describe()`, a type method
pub fn counter_type() -> TypeDef<Counter> {
    let members = counter_members().expect("counter methods declare distinct parameters");
    TypeDef::from_members(Arc::from("Counter"), members)
}

fn counter_members() -> Result<IndexMap<String, Member>, AttachmentError> {
    let mut members = IndexMap::new();
    members.insert(
        hooks::INIT.to_string(),
        Member::Method(Function::new(
            hooks::INIT,
            Signature::method().param_default("start", 0),
            |args: Args| {
                let start = int_arg(&args, "start")?;
                counter_of(&args)?.write(|c| c.value = start);
                Ok(())
            },
        )?),
    );
    members.insert(
        "increment".to_string(),
        Member::Method(Function::new(
            "increment",
            Signature::method().param("v"),
            |args: Args| {
                let v = int_arg(&args, "v")?;
                Ok(counter_of(&args)?.write(|c| {
                    c.value += v;
                    c.value
                }))
            },
        )?),
    );
    members.insert(
        "get".to_string(),
        Member::Method(Function::new("get", Signature::method(), |args: Args| {
            Ok(counter_of(&args)?.read(|c| c.value))
        })?),
    );
    members.insert(
        "bump_twice".to_string(),
        Member::Method(Function::new(
            "bump_twice",
            Signature::method().param("v"),
            |args: Args| {
                let v = int_arg(&args, "v")?;
                let counter = counter_of(&args)?;
                counter.call("increment", Call::positional([v]))?;
                counter.call("increment", Call::positional([v]))
                    .map_err(anyhow::Error::from)
            },
        )?),
    );
    members.insert(
        hooks::LT.to_string(),
        Member::Method(Function::new(
            hooks::LT,
            Signature::method().param("other"),
            |args: Args| {
                let other = int_arg(&args, "other")?;
                Ok(counter_of(&args)?.read(|c| c.value < other))
            },
        )?),
    );
    members.insert(
        "__force__".to_string(),
        Member::Method(Function::new(
            "__force__",
            Signature::method().param("v"),
            |args: Args| {
                let v = int_arg(&args, "v")?;
                counter_of(&args)?.write(|c| c.value = v);
                Ok(())
            },
        )?),
    );
    members.insert(
        "describe".to_string(),
        Member::TypeMethod(Function::new("describe", Signature::new(), |_: Args| {
            Ok("counter")
        })?),
    );
    Ok(members)
}
