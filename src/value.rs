// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Dynamic argument values.
//!
//! Contracted callables take their arguments as [`Value`]s so that one check
//! sequence can serve every parameter shape. Most variants are plain data.
//! Two are handles with sharing semantics:
//!
//! - [`Stream`]: a single-pass sequence. Iterating it consumes it, and clones
//!   share the same cursor. A predicate that walks a stream leaves nothing for
//!   the body, which is exactly what a transformer is for.
//! - [`Object`]: a type-erased shared handle. Cloning it aliases the same
//!   object, so a preserver that wants the *old* state of an object has to copy
//!   that state out itself.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// A single argument, result, or preserved value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Stream(Stream),
    Object(Object),
}

impl Value {
    /// Wrap an iterator as a single-pass stream.
    pub fn stream<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Value::Stream(Stream::new(iter))
    }

    /// Wrap any shareable value as an object handle.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Value::Object(Object::new(value))
    }

    /// The runtime kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Unit => Kind::Unit,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            Value::Stream(_) => Kind::Stream,
            Value::Object(object) => Kind::Object(object.tag),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the object payload if it is a `T`.
    pub fn as_object<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object(object) => object.downcast_ref(),
            _ => None,
        }
    }

    /// Iterate the elements of a list or stream.
    ///
    /// Lists yield clones and can be walked any number of times. Streams are
    /// drained: whatever this iterator consumes is gone for every other holder.
    /// Other values yield nothing.
    pub fn elements(&self) -> Elements<'_> {
        match self {
            Value::List(items) => Elements::List(items.iter()),
            Value::Stream(stream) => Elements::Stream(stream),
            _ => Elements::Empty,
        }
    }

    /// Truthiness used when a contracted function serves as a predicate.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Unit => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Stream(_) | Value::Object(_) => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Stream(a), Value::Stream(b)) => Arc::ptr_eq(&a.inner, &b.inner),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map).finish(),
            Value::Stream(_) => f.write_str("<stream>"),
            Value::Object(object) => write!(f, "<{}>", object.tag.name),
        }
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::List(iter.into_iter().collect())
    }
}

/// Iterator returned by [`Value::elements`].
pub enum Elements<'a> {
    List(std::slice::Iter<'a, Value>),
    Stream(&'a Stream),
    Empty,
}

impl Iterator for Elements<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            Elements::List(iter) => iter.next().cloned(),
            Elements::Stream(stream) => stream.pull(),
            Elements::Empty => None,
        }
    }
}

/// A single-pass, possibly unbounded sequence of values.
#[derive(Clone)]
pub struct Stream {
    inner: Arc<Mutex<Box<dyn Iterator<Item = Value> + Send>>>,
}

impl Stream {
    pub fn new<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(iter.into_iter()))),
        }
    }

    /// Pull the next element, consuming it for every clone of this stream.
    pub fn pull(&self) -> Option<Value> {
        self.inner.lock().next()
    }

    /// Drain everything that is left into a list.
    pub fn materialize(&self) -> Vec<Value> {
        let mut cursor = self.inner.lock();
        let remaining: &mut (dyn Iterator<Item = Value> + Send) = &mut **cursor;
        remaining.collect()
    }
}

/// Identity of a concrete object type, used by [`Kind::Object`].
#[derive(Debug, Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

/// A shared, type-erased object handle.
#[derive(Clone)]
pub struct Object {
    payload: Arc<dyn Any + Send + Sync>,
    tag: TypeTag,
}

impl Object {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            payload: Arc::new(value),
            tag: TypeTag::of::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }

    pub fn type_name(&self) -> &'static str {
        self.tag.name
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

/// Runtime kind of a [`Value`], the unit of comparison for type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Unit,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Stream,
    Object(TypeTag),
}

impl Kind {
    /// The kind of an object holding a `T`.
    pub fn of<T: Any>() -> Self {
        Kind::Object(TypeTag::of::<T>())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Unit => f.write_str("unit"),
            Kind::Bool => f.write_str("bool"),
            Kind::Int => f.write_str("int"),
            Kind::Float => f.write_str("float"),
            Kind::Str => f.write_str("str"),
            Kind::List => f.write_str("list"),
            Kind::Map => f.write_str("map"),
            Kind::Stream => f.write_str("stream"),
            Kind::Object(tag) => f.write_str(tag.name),
        }
    }
}
