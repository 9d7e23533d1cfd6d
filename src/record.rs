// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Normalized call records and preserved snapshots.
//!
//! An [`Args`] binds every declared parameter of a callable to a value for one
//! invocation. It is immutable and cheap to clone; transformers produce new
//! records through [`rewrite`], which only ever replaces values of parameters
//! the record already has.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::CallError;
use crate::invariant::Instance;
use crate::value::Value;

/// Name of the receiver parameter of instance methods.
pub const RECEIVER: &str = "self";

/// Canonical name→value mapping for one invocation.
#[derive(Clone, Default, PartialEq)]
pub struct Args {
    fields: Arc<IndexMap<String, Value>>,
}

impl Args {
    pub(crate) fn from_fields(fields: IndexMap<String, Value>) -> Self {
        Self {
            fields: Arc::new(fields),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    pub fn object<T: Any>(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(Value::as_object)
    }

    /// The receiver of an instance method call.
    pub fn receiver<T: Send + 'static>(&self) -> Option<&Instance<T>> {
        self.object(RECEIVER)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Same parameter names, in the same order.
    pub(crate) fn same_shape(&self, other: &Args) -> bool {
        self.fields.len() == other.fields.len()
            && self.fields.keys().zip(other.fields.keys()).all(|(a, b)| a == b)
    }

    /// The record as a plain map value, for callables used as predicates.
    pub(crate) fn to_value(&self) -> Value {
        Value::Map(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }
}

impl std::ops::Index<&str> for Args {
    type Output = Value;

    /// Panics if the record has no such parameter.
    fn index(&self, name: &str) -> &Value {
        match self.fields.get(name) {
            Some(value) => value,
            None => panic!("call record has no parameter `{name}`"),
        }
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

/// Produce a modified record with some parameters replaced.
///
/// Parameters cannot be added, renamed or dropped; overriding a name the
/// record does not have is an error.
pub fn rewrite<I, K, V>(args: &Args, overrides: I) -> Result<Args, CallError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    let mut fields = (*args.fields).clone();
    for (name, value) in overrides {
        let name = name.as_ref();
        match fields.get_mut(name) {
            Some(slot) => *slot = value.into(),
            None => {
                return Err(CallError::UnknownParameter {
                    name: name.to_string(),
                })
            }
        }
    }
    Ok(Args::from_fields(fields))
}

/// Values captured before a call body runs, handed to ternary postconditions.
#[derive(Clone, Default, PartialEq)]
pub struct Snapshot {
    values: BTreeMap<String, Value>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fold another snapshot in. Keys present in both take `other`'s value.
    pub fn merge(mut self, other: Snapshot) -> Self {
        self.values.extend(other.values);
        self
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::Map(self.values.clone())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}
