// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Record rewriting through a transform layer.
//!
//! Whatever overrides a transformer asks for, the record that reaches the
//! body keeps the declared parameter names in declaration order.

#![no_main]

use covenant::{rewrite, transform, Args, Call, Contracts, Function, Signature};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<(u8, i64)>, [i64; 3])| {
    let (overrides, values) = input;
    let overrides: Vec<(String, i64)> = overrides
        .into_iter()
        .map(|(id, value)| (format!("p{}", id % 5), value))
        .collect();

    let body = Function::new(
        "body",
        Signature::new().param("p0").param("p1").param("p2"),
        |args: Args| {
            let names: Vec<&str> = args.names().collect();
            assert_eq!(names, ["p0", "p1", "p2"]);
            Ok(())
        },
    );
    let rewriter = transform(move |args: &Args| {
        rewrite(args, overrides.iter().map(|(n, v)| (n.as_str(), *v)))
    });
    let Ok(f) = body.and_then(|body| Contracts::default().apply(body, rewriter)) else {
        return;
    };

    let _ = f.call(Call::positional(values));
});
