// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The error surface.
//!
//! Two families. [`AttachmentError`] is raised while contracts are being
//! attached: malformed descriptions, predicates of the wrong shape. It happens
//! at definition time and the only sensible response is to fix the code.
//! [`CallError`] is everything a contracted call can signal, with the contract
//! failures grouped under [`AssertionFailure`] so callers can catch either one
//! kind specifically or "some contract failed" generically.

use thiserror::Error;

use crate::condition::ConditionKind;

/// A contract was attached with malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    /// Every condition needs a human-readable description.
    #[error("contracts must have nonempty descriptions")]
    EmptyDescription,

    /// Predicate shape does not fit the condition kind.
    #[error("{kind} predicates must take {expected} argument(s), got {found}")]
    Arity {
        kind: ConditionKind,
        expected: &'static str,
        found: usize,
    },

    /// Predicates run inside the check sequence and must not suspend.
    #[error("contract predicates cannot be suspending functions (`{predicate}`)")]
    SuspendingPredicate { predicate: String },

    /// A type check or attachment named a parameter the callable does not declare.
    #[error("`{callable}` has no parameter `{name}`")]
    UnknownParameter { callable: String, name: String },

    /// A parameter shape declares the same name twice.
    #[error("`{callable}` declares parameter `{name}` more than once")]
    DuplicateParameter { callable: String, name: String },

    /// Methods of a type definition must take the receiver first.
    #[error("method `{method}` must declare `self` as its first parameter")]
    MissingReceiver { method: String },
}

/// A precondition did not hold; the underlying callable never ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct PreconditionFailure {
    pub description: String,
    pub errno: i32,
}

/// A postcondition or invariant did not hold after the callable returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct PostconditionFailure {
    pub description: String,
    pub errno: i32,
}

/// Generic "a contract was violated" kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionFailure {
    #[error(transparent)]
    Precondition(#[from] PreconditionFailure),
    #[error(transparent)]
    Postcondition(#[from] PostconditionFailure),
}

impl AssertionFailure {
    pub fn description(&self) -> &str {
        match self {
            AssertionFailure::Precondition(failure) => &failure.description,
            AssertionFailure::Postcondition(failure) => &failure.description,
        }
    }

    pub fn errno(&self) -> i32 {
        match self {
            AssertionFailure::Precondition(failure) => failure.errno,
            AssertionFailure::Postcondition(failure) => failure.errno,
        }
    }
}

/// A required parameter received no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{callable} missing required argument: '{name}'")]
pub struct MissingArgumentError {
    pub callable: String,
    pub name: String,
}

/// Everything a contracted call can signal.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error(transparent)]
    MissingArgument(#[from] MissingArgumentError),

    #[error("{callable} takes {expected} positional argument(s) but {given} were given")]
    TooManyPositional {
        callable: String,
        expected: usize,
        given: usize,
    },

    #[error("{callable} got an unexpected argument '{name}'")]
    UnexpectedArgument { callable: String, name: String },

    #[error("{callable} got multiple values for argument '{name}'")]
    DuplicateArgument { callable: String, name: String },

    /// The callable's own shape declares `name` twice, so nothing can bind.
    #[error("`{callable}` declares parameter `{name}` more than once")]
    DuplicateParameter { callable: String, name: String },

    /// A record rewrite named a parameter the record does not have.
    #[error("cannot rewrite unknown parameter '{name}'")]
    UnknownParameter { name: String },

    /// A transformer returned a record with a different set of parameters.
    #[error("transformer for {callable} renamed or dropped parameters")]
    RecordShape { callable: String },

    /// The receiver argument was missing or of another type.
    #[error("receiver of {callable} is not a `{expected}`")]
    Receiver {
        callable: String,
        expected: &'static str,
    },

    #[error("`{type_name}` has no method '{name}'")]
    NoSuchMethod { type_name: String, name: String },

    /// A suspending callable was invoked through the blocking path.
    #[error("{callable} suspends and must be awaited through `call_async`")]
    RequiresAwait { callable: String },

    /// The callable body itself failed.
    #[error(transparent)]
    Body(anyhow::Error),
}

impl CallError {
    /// Turn a body error back into a `CallError`.
    ///
    /// A contracted call made from inside another body travels out as an
    /// `anyhow::Error`; its original failure is recovered as-is.
    pub fn from_body(error: anyhow::Error) -> Self {
        match error.downcast::<CallError>() {
            Ok(inner) => inner,
            Err(error) => CallError::Body(error),
        }
    }

    pub fn assertion(&self) -> Option<&AssertionFailure> {
        match self {
            CallError::Assertion(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn precondition(&self) -> Option<&PreconditionFailure> {
        match self {
            CallError::Assertion(AssertionFailure::Precondition(failure)) => Some(failure),
            _ => None,
        }
    }

    pub fn postcondition(&self) -> Option<&PostconditionFailure> {
        match self {
            CallError::Assertion(AssertionFailure::Postcondition(failure)) => Some(failure),
            _ => None,
        }
    }
}

impl From<PreconditionFailure> for CallError {
    fn from(failure: PreconditionFailure) -> Self {
        CallError::Assertion(failure.into())
    }
}

impl From<PostconditionFailure> for CallError {
    fn from(failure: PostconditionFailure) -> Self {
        CallError::Assertion(failure.into())
    }
}
