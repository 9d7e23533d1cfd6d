// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Parameter shapes and argument binding.
//!
//! [`Signature::bind`] turns one [`Call`] into the canonical [`Args`] record
//! every predicate, preserver and transformer sees. Precedence, highest first:
//!
//! 1. explicit positional values
//! 2. explicit named values
//! 3. keyword-only defaults
//! 4. positional defaults
//!
//! Positional values beyond the declared names go to the catch-all parameter
//! when there is one. Anything that still has no value is a
//! [`MissingArgumentError`] naming the first such parameter.
//!
//! Parameter names are unique across the whole shape. The builders keep the
//! first repeated name; [`Signature::validate`] reports it and `bind` refuses
//! to run on such a shape.

use indexmap::IndexMap;

use crate::error::{AttachmentError, CallError, MissingArgumentError};
use crate::record::{Args, RECEIVER};
use crate::value::Value;

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

/// Declared parameter shape of a callable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    positional: Vec<Param>,
    variadic: Option<String>,
    keyword_only: Vec<Param>,
    duplicate: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape of an instance method: receiver first.
    pub fn method() -> Self {
        Self::new().param(RECEIVER)
    }

    pub fn param(mut self, name: impl Into<String>) -> Self {
        let param = self.declare(Param::required(name));
        self.positional.push(param);
        self
    }

    pub fn param_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        let param = self.declare(Param::optional(name, default));
        self.positional.push(param);
        self
    }

    /// Catch-all for overflow positional arguments. There is only one; a
    /// second call reports the first catch-all as repeated.
    pub fn variadic(mut self, name: impl Into<String>) -> Self {
        let param = self.declare(Param::required(name));
        if let Some(previous) = self.variadic.replace(param.name) {
            self.record_duplicate(previous);
        }
        self
    }

    pub fn keyword_only(mut self, name: impl Into<String>) -> Self {
        let param = self.declare(Param::required(name));
        self.keyword_only.push(param);
        self
    }

    pub fn keyword_only_default(
        mut self,
        name: impl Into<String>,
        default: impl Into<Value>,
    ) -> Self {
        let param = self.declare(Param::optional(name, default));
        self.keyword_only.push(param);
        self
    }

    fn declare(&mut self, param: Param) -> Param {
        if self.declares(&param.name) {
            self.record_duplicate(param.name.clone());
        }
        param
    }

    fn record_duplicate(&mut self, name: String) {
        self.duplicate.get_or_insert(name);
    }

    /// First name declared more than once, if any.
    pub fn duplicate(&self) -> Option<&str> {
        self.duplicate.as_deref()
    }

    /// Refuse shapes that declare a name twice.
    pub fn validate(&self, callable: &str) -> Result<(), AttachmentError> {
        match &self.duplicate {
            Some(name) => Err(AttachmentError::DuplicateParameter {
                callable: callable.to_string(),
                name: name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn positional(&self) -> &[Param] {
        &self.positional
    }

    pub fn variadic_name(&self) -> Option<&str> {
        self.variadic.as_deref()
    }

    pub fn keyword_params(&self) -> &[Param] {
        &self.keyword_only
    }

    /// Number of parameters a caller can bind, counting the catch-all as one.
    pub fn arity(&self) -> usize {
        self.positional.len() + self.keyword_only.len() + usize::from(self.variadic.is_some())
    }

    /// Whether `name` is any declared parameter.
    pub fn declares(&self, name: &str) -> bool {
        self.positional.iter().any(|p| p.name == name)
            || self.keyword_only.iter().any(|p| p.name == name)
            || self.variadic.as_deref() == Some(name)
    }

    /// Whether the first positional parameter is the receiver.
    pub fn takes_receiver(&self) -> bool {
        self.positional.first().is_some_and(|p| p.name == RECEIVER)
    }

    /// Bind one call's arguments to this shape.
    pub fn bind(&self, callable: &str, call: Call) -> Result<Args, CallError> {
        if let Some(name) = &self.duplicate {
            return Err(CallError::DuplicateParameter {
                callable: callable.to_string(),
                name: name.clone(),
            });
        }
        let Call { positional, named } = call;
        let given = positional.len();

        if self.variadic.is_none() && given > self.positional.len() {
            return Err(CallError::TooManyPositional {
                callable: callable.to_string(),
                expected: self.positional.len(),
                given,
            });
        }

        let mut slots: IndexMap<String, Option<Value>> = IndexMap::new();
        for param in &self.positional {
            slots.insert(param.name.clone(), None);
        }
        if let Some(name) = &self.variadic {
            slots.insert(name.clone(), None);
        }
        for param in &self.keyword_only {
            slots.insert(param.name.clone(), None);
        }

        let mut overflow = Vec::new();
        for (index, value) in positional.into_iter().enumerate() {
            match self.positional.get(index) {
                Some(param) => {
                    slots.insert(param.name.clone(), Some(value));
                }
                None => overflow.push(value),
            }
        }
        if let Some(name) = &self.variadic {
            slots.insert(name.clone(), Some(Value::List(overflow)));
        }

        for (name, value) in named {
            let bound_positionally = self
                .positional
                .iter()
                .take(given)
                .any(|param| param.name == name);
            if bound_positionally {
                return Err(CallError::DuplicateArgument {
                    callable: callable.to_string(),
                    name,
                });
            }
            if self.variadic.as_deref() == Some(name.as_str()) {
                return Err(CallError::UnexpectedArgument {
                    callable: callable.to_string(),
                    name,
                });
            }
            match slots.get_mut(&name) {
                Some(slot) if slot.is_some() => {
                    return Err(CallError::DuplicateArgument {
                        callable: callable.to_string(),
                        name,
                    })
                }
                Some(slot) => *slot = Some(value),
                None => {
                    return Err(CallError::UnexpectedArgument {
                        callable: callable.to_string(),
                        name,
                    })
                }
            }
        }

        for param in self.keyword_only.iter().chain(&self.positional) {
            let Some(default) = &param.default else {
                continue;
            };
            if let Some(slot) = slots.get_mut(&param.name) {
                if slot.is_none() {
                    *slot = Some(default.clone());
                }
            }
        }

        let mut fields = IndexMap::with_capacity(slots.len());
        for (name, value) in slots {
            match value {
                Some(value) => {
                    fields.insert(name, value);
                }
                None => {
                    return Err(MissingArgumentError {
                        callable: callable.to_string(),
                        name,
                    }
                    .into())
                }
            }
        }
        Ok(Args::from_fields(fields))
    }
}

/// The actual arguments of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Call {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl Call {
    pub fn new() -> Self {
        Self::default()
    }

    /// A call with only positional arguments.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            named: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    /// Put `value` in front of the positional arguments (the receiver slot).
    pub(crate) fn prepend(mut self, value: Value) -> Self {
        self.positional.insert(0, value);
        self
    }

    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    pub fn named_values(&self) -> &[(String, Value)] {
        &self.named
    }
}

impl From<Args> for Call {
    /// Re-issue a bound record as a fully named call.
    fn from(args: Args) -> Self {
        Self {
            positional: Vec::new(),
            named: args
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        }
    }
}
