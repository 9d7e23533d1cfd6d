// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Type definitions as explicit member tables, and their instances.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::{hooks, Invariant};
use crate::config::Contracts;
use crate::error::{AttachmentError, CallError};
use crate::function::Function;
use crate::signature::{Call, Signature};
use crate::value::Value;

/// One entry of a type's member table.
#[derive(Clone)]
pub enum Member {
    /// Takes the receiver as its first parameter.
    Method(Function),
    /// Belongs to the type; never sees a receiver.
    TypeMethod(Function),
    /// Static data shared by every instance.
    Attribute(Value),
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Method(function) => f.debug_tuple("Method").field(function).finish(),
            Member::TypeMethod(function) => f.debug_tuple("TypeMethod").field(function).finish(),
            Member::Attribute(value) => f.debug_tuple("Attribute").field(value).finish(),
        }
    }
}

/// A type: a name, a blank-state constructor and an ordered member table.
///
/// Deriving a checked type never touches this value; it builds a new table.
pub struct TypeDef<T> {
    name: Arc<str>,
    members: Arc<IndexMap<String, Member>>,
    state: PhantomData<fn() -> T>,
}

impl<T> Clone for TypeDef<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            members: Arc::clone(&self.members),
            state: PhantomData,
        }
    }
}

impl<T: Default + Send + 'static> TypeDef<T> {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self::from_members(Arc::from(name), IndexMap::new())
    }

    pub(crate) fn from_members(name: Arc<str>, members: IndexMap<String, Member>) -> Self {
        Self {
            name,
            members: Arc::new(members),
            state: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an instance method. Its signature must start with `self`.
    pub fn method(
        mut self,
        name: impl Into<String>,
        function: Function,
    ) -> Result<Self, AttachmentError> {
        let name = name.into();
        if !function.signature().takes_receiver() {
            return Err(AttachmentError::MissingReceiver { method: name });
        }
        Arc::make_mut(&mut self.members).insert(name, Member::Method(function));
        Ok(self)
    }

    pub fn type_method(mut self, name: impl Into<String>, function: Function) -> Self {
        Arc::make_mut(&mut self.members).insert(name.into(), Member::TypeMethod(function));
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.members).insert(name.into(), Member::Attribute(value.into()));
        self
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(name, member)| (name.as_str(), member))
    }

    /// Derive a type whose eligible methods check `invariant`, under the
    /// process-wide configuration.
    pub fn attach(self, invariant: Invariant<T>) -> Result<TypeDef<T>, AttachmentError> {
        Contracts::global().derive(self, invariant)
    }

    /// Blank state, then the initializer with `call`'s arguments.
    ///
    /// Without an initializer the call must be empty.
    pub fn instantiate(&self, call: Call) -> Result<Instance<T>, CallError> {
        let instance = self.blank();
        match self.members.get(hooks::INIT) {
            Some(Member::Method(init)) => {
                init.call(call.prepend(instance.as_value()))?;
            }
            _ => {
                Signature::new().bind(&self.name, call)?;
            }
        }
        Ok(instance)
    }

    /// [`TypeDef::instantiate`] for initializers that suspend.
    pub async fn instantiate_async(&self, call: Call) -> Result<Instance<T>, CallError> {
        let instance = self.blank();
        match self.members.get(hooks::INIT) {
            Some(Member::Method(init)) => {
                init.call_async(call.prepend(instance.as_value())).await?;
            }
            _ => {
                Signature::new().bind(&self.name, call)?;
            }
        }
        Ok(instance)
    }

    pub fn call_type_method(&self, name: &str, call: Call) -> Result<Value, CallError> {
        match self.members.get(name) {
            Some(Member::TypeMethod(function)) => function.call(call),
            _ => Err(self.no_such_method(name)),
        }
    }

    fn blank(&self) -> Instance<T> {
        Instance {
            state: Arc::new(Mutex::new(T::default())),
            members: Arc::clone(&self.members),
            type_name: Arc::clone(&self.name),
        }
    }

    fn no_such_method(&self, name: &str) -> CallError {
        CallError::NoSuchMethod {
            type_name: self.name.to_string(),
            name: name.to_string(),
        }
    }
}

impl<T> fmt::Debug for TypeDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Shared handle to one object.
///
/// Clones refer to the same state. Methods are looked up in the table of the
/// type the instance was built from, so calls made from inside a method body
/// go through the same checks as calls from outside.
pub struct Instance<T> {
    state: Arc<Mutex<T>>,
    members: Arc<IndexMap<String, Member>>,
    type_name: Arc<str>,
}

impl<T> Clone for Instance<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            members: Arc::clone(&self.members),
            type_name: Arc::clone(&self.type_name),
        }
    }
}

impl<T: Send + 'static> Instance<T> {
    /// Run `f` with the state locked. Do not call methods from inside `f`.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.lock())
    }

    /// Run `f` with the state locked for writing.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.state.lock())
    }

    /// Call a method by name: instance methods get this instance as receiver.
    pub fn call(&self, name: &str, call: Call) -> Result<Value, CallError> {
        match self.members.get(name) {
            Some(Member::Method(function)) => function.call(call.prepend(self.as_value())),
            Some(Member::TypeMethod(function)) => function.call(call),
            _ => Err(self.no_such_method(name)),
        }
    }

    pub async fn call_async(&self, name: &str, call: Call) -> Result<Value, CallError> {
        match self.members.get(name) {
            Some(Member::Method(function)) => {
                function.call_async(call.prepend(self.as_value())).await
            }
            Some(Member::TypeMethod(function)) => function.call_async(call).await,
            _ => Err(self.no_such_method(name)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        match self.members.get(name) {
            Some(Member::Attribute(value)) => Some(value),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Instance<T>) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// This instance as an argument value.
    pub fn as_value(&self) -> Value {
        Value::object(self.clone())
    }

    fn no_such_method(&self, name: &str) -> CallError {
        CallError::NoSuchMethod {
            type_name: self.type_name.to_string(),
            name: name.to_string(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_lock() {
            Some(state) => f
                .debug_struct("Instance")
                .field("type", &self.type_name)
                .field("state", &*state)
                .finish(),
            None => f
                .debug_struct("Instance")
                .field("type", &self.type_name)
                .finish_non_exhaustive(),
        }
    }
}
