// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Argument binding under arbitrary shapes and calls.
//!
//! Callers can spell a call any way they like: too many positionals, names
//! that do not exist, the same name twice. Binding must answer every one of
//! them with a record or an error, never a panic. Shapes that declare a name
//! twice must be refused outright.

#![no_main]

use arbitrary::Arbitrary;
use covenant::{Call, CallError, Signature, Value};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Shape {
    positional: Vec<(u8, Option<i64>)>,
    variadic: Option<u8>,
    keyword_only: Vec<(u8, Option<i64>)>,
}

#[derive(Debug, Arbitrary)]
struct Input {
    shape: Shape,
    positional: Vec<i64>,
    named: Vec<(u8, i64)>,
}

/// Small name space so generated names collide often.
fn name(id: u8) -> String {
    format!("p{}", id % 8)
}

fn signature(shape: &Shape) -> Signature {
    let mut signature = Signature::new();
    for (id, default) in &shape.positional {
        signature = match default {
            Some(value) => signature.param_default(name(*id), *value),
            None => signature.param(name(*id)),
        };
    }
    if let Some(id) = shape.variadic {
        signature = signature.variadic(name(id));
    }
    for (id, default) in &shape.keyword_only {
        signature = match default {
            Some(value) => signature.keyword_only_default(name(*id), *value),
            None => signature.keyword_only(name(*id)),
        };
    }
    signature
}

fuzz_target!(|input: Input| {
    let signature = signature(&input.shape);
    let mut call = Call::positional(input.positional.iter().copied());
    for (id, value) in &input.named {
        call = call.named(name(*id), *value);
    }

    if let Some(repeated) = signature.duplicate() {
        // INVARIANT: a shape with a repeated name is refused, never bound
        assert!(signature.validate("fuzzed").is_err());
        match signature.bind("fuzzed", call) {
            Err(CallError::DuplicateParameter { name, .. }) => assert_eq!(name, repeated),
            other => panic!("bound a shape that repeats {repeated}: {other:?}"),
        }
        return;
    }
    assert!(signature.validate("fuzzed").is_ok());

    match signature.bind("fuzzed", call) {
        Ok(args) => {
            // INVARIANT: exactly the declared names are bound, and the catch-all is a list
            assert_eq!(args.len(), signature.arity());
            for name in args.names() {
                assert!(signature.declares(name), "bound undeclared parameter {name}");
            }
            if let Some(rest) = signature.variadic_name() {
                assert!(matches!(args.get(rest), Some(Value::List(_))));
            }
            // INVARIANT: a record rebinds to itself
            let again = signature.bind("fuzzed", Call::from(args.clone()));
            if let Ok(again) = again {
                assert_eq!(again, args);
            }
        }
        Err(CallError::MissingArgument(missing)) => {
            assert!(signature.declares(&missing.name));
        }
        Err(_) => {}
    }
});
