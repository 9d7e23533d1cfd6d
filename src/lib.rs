// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Design-by-contract checks at call boundaries.
//!
//! Preconditions, postconditions and type invariants are attached to
//! callables and checked every time they run. A failed check is an error
//! value carrying the condition's description and an error number; the
//! callable's own behavior is otherwise unchanged.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  value.rs   │────▶│ signature.rs │────▶│  record.rs   │
//! │ (Value,     │     │ (Signature,  │     │ (Args,       │
//! │  Kind)      │     │  Call, bind) │     │  Snapshot)   │
//! └─────────────┘     └──────────────┘     └──────────────┘
//!                                                 │
//!        ┌────────────────────┬───────────────────┤
//!        ▼                    ▼                   ▼
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ describe.rs │────▶│ condition.rs │     │  rewrite.rs  │
//! │ (synthesize)│     │ (requires,   │     │ (transform,  │
//! │             │     │  ensures)    │     │  preserve)   │
//! └─────────────┘     └──────────────┘     └──────────────┘
//!                             │                   │
//!                             ▼                   ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      function.rs                         │
//! │  (Function: layers over the innermost callable,          │
//! │   blocking and suspending check sequences)               │
//! └─────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      invariant/                          │
//! │  (TypeDef, Instance, invariant derivation)               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! `config.rs` decides, once per process, whether attachments do anything.
//!
//! # Usage
//!
//! ```
//! use covenant::{requires, Args, Call, Function, Signature, Value};
//!
//! let add2 = Function::new("add2", Signature::new().param("i").param("j"), |args: Args| {
//!     Ok(args.int("i").unwrap_or(0) + args.int("j").unwrap_or(0))
//! })?;
//! let add2 = add2.attach(requires(|args: &Args| args.int("i") > Some(0)).describe("i positive"))?;
//!
//! assert_eq!(add2.call(Call::positional([1, 2]))?, Value::Int(3));
//!
//! let err = add2.call(Call::positional([-1, 2])).unwrap_err();
//! assert_eq!(err.to_string(), "i positive");
//! assert_eq!(err.precondition().map(|failure| failure.errno), Some(0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Without an explicit description, the attachment macros describe a
//! condition by its own source text:
//!
//! ```
//! use covenant::{ensures, Args, Call, Function, Signature, Value};
//!
//! let sub = Function::new("sub", Signature::new().param("x").param("y"), |args: Args| {
//!     Ok(args.int("x").unwrap_or(0) - args.int("y").unwrap_or(0))
//! })?;
//! let sub = sub.attach(ensures!(|_: &Args, result: &Value| result.as_int() > Some(0)))?;
//!
//! let err = sub.call(Call::positional([1, 5])).unwrap_err();
//! let description = err.to_string();
//! assert!(description.starts_with("@ensures(|_: &Args, result: &Value|"));
//! assert!(description.ends_with(") failed"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod condition;
pub mod config;
pub mod describe;
pub mod error;
pub mod function;
pub mod invariant;
pub mod record;
pub mod rewrite;
pub mod signature;
pub mod testing;
pub mod value;

pub use condition::{
    ensures, requires, type_check, ConditionKind, Ensures, IntoPredicate, Predicate, Requires,
    TypeCheck, TYPE_CHECK_DESCRIPTION,
};
pub use config::{Config, ConfigError, Contracts};
pub use error::{
    AssertionFailure, AttachmentError, CallError, MissingArgumentError, PostconditionFailure,
    PreconditionFailure,
};
pub use function::{Attach, BoxFuture, Function};
pub use invariant::{hooks, invariant, Eligibility, Instance, Invariant, Member, TypeDef};
pub use record::{rewrite, Args, Snapshot, RECEIVER};
pub use rewrite::{preserve, transform, Preserve, Transform};
pub use signature::{Call, Param, Signature};
pub use value::{Kind, Object, Stream, TypeTag, Value};

/// Precondition, described by its own source text unless a description
/// comes first.
///
/// ```
/// use covenant::{requires, Args};
///
/// let described = requires!("x positive", |a: &Args| a.int("x") > Some(0));
/// let synthesized = requires!(|a: &Args| a.int("x") > Some(0));
/// ```
#[macro_export]
macro_rules! requires {
    ($description:expr, $predicate:expr $(,)?) => {
        $crate::requires($predicate).describe($description)
    };
    ($predicate:expr $(,)?) => {
        $crate::requires($predicate).source(stringify!($predicate))
    };
}

/// Postcondition; see [`requires!`].
#[macro_export]
macro_rules! ensures {
    ($description:expr, $predicate:expr $(,)?) => {
        $crate::ensures($predicate).describe($description)
    };
    ($predicate:expr $(,)?) => {
        $crate::ensures($predicate).source(stringify!($predicate))
    };
}

/// Type invariant; see [`requires!`].
#[macro_export]
macro_rules! invariant {
    ($description:expr, $predicate:expr $(,)?) => {
        $crate::invariant($predicate).describe($description)
    };
    ($predicate:expr $(,)?) => {
        $crate::invariant($predicate).source(stringify!($predicate))
    };
}
