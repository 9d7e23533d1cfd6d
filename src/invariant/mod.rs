// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Invariants over type definitions.
//!
//! An invariant is a predicate over an object's state. Attaching one to a
//! [`TypeDef`] builds a new type whose eligible methods check it around
//! every call:
//!
//! ```text
//!   TypeDef ──attach(invariant)──▶ TypeDef'
//!     __init__   ─────────────▶  __init__   (checked after)
//!     push       ─────────────▶  push       (checked before and after)
//!     __lt__     ─────────────▶  __lt__     (allow-listed hook: checked)
//!     __grow__   ─────────────▶  __grow__   (private: untouched)
//!     fresh      ─────────────▶  fresh      (type method: untouched)
//!     unit       ─────────────▶  unit       (attribute: untouched)
//! ```
//!
//! The derivation runs once. Members added to the derived type afterwards
//! are not checked, and the source type keeps its unchecked table.
//!
//! Methods that call other methods on the same receiver go through the
//! instance's table, so the invariant is checked again at every nested
//! boundary. Checks on one object are not exclusive across concurrent calls:
//! a suspended method can leave the state for another task to observe.

mod types;

pub use types::{Instance, Member, TypeDef};

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::condition::{resolve_description, Condition, ConditionKind, SubjectFn};
use crate::error::{AttachmentError, CallError};
use crate::function::Layer;
use crate::record::Args;

/// Names of the private-style hooks that still get checked.
pub mod hooks {
    pub const INDEX_GET: &str = "__getitem__";
    pub const INDEX_SET: &str = "__setitem__";
    pub const LT: &str = "__lt__";
    pub const LE: &str = "__le__";
    pub const EQ: &str = "__eq__";
    pub const NE: &str = "__ne__";
    pub const GT: &str = "__gt__";
    pub const GE: &str = "__ge__";
    /// The initializer, run by [`TypeDef::instantiate`](super::TypeDef::instantiate).
    pub const INIT: &str = "__init__";

    pub const ALLOW_LIST: [&str; 9] = [INDEX_GET, INDEX_SET, LT, LE, EQ, NE, GT, GE, INIT];
}

/// How a member is treated when an invariant is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Checked before and after every call.
    Checked,
    /// The initializer: checked after only.
    Initializer,
    /// Private-style name outside the allow-list.
    Private,
    TypeLevel,
    Attribute,
}

impl Eligibility {
    pub fn is_checked(self) -> bool {
        matches!(self, Eligibility::Checked | Eligibility::Initializer)
    }
}

/// `__name__`.
pub fn is_private_name(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

pub fn eligibility(name: &str, member: &Member) -> Eligibility {
    match member {
        Member::Attribute(_) => Eligibility::Attribute,
        Member::TypeMethod(_) => Eligibility::TypeLevel,
        Member::Method(_) if name == hooks::INIT => Eligibility::Initializer,
        Member::Method(_) if is_private_name(name) && !hooks::ALLOW_LIST.contains(&name) => {
            Eligibility::Private
        }
        Member::Method(_) => Eligibility::Checked,
    }
}

/// Invariant builder returned by [`invariant`].
pub struct Invariant<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
    description: Option<String>,
    source: Option<&'static str>,
    tag: Option<String>,
    type_name: &'static str,
}

/// An invariant over `T`; attach it with [`TypeDef::attach`].
pub fn invariant<T, F>(predicate: F) -> Invariant<T>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Invariant {
        predicate: Arc::new(predicate),
        description: None,
        source: None,
        tag: None,
        type_name: std::any::type_name::<F>(),
    }
}

impl<T: Default + Send + 'static> Invariant<T> {
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Declaration text, captured by [`invariant!`](crate::invariant!).
    #[doc(hidden)]
    pub fn source(mut self, text: &'static str) -> Self {
        self.source = Some(text);
        self
    }

    /// Build the checked member table. `def` itself is left as it was.
    pub(crate) fn apply(self, def: TypeDef<T>) -> Result<TypeDef<T>, AttachmentError> {
        let description = resolve_description(
            ConditionKind::Invariant,
            self.description.as_deref(),
            self.source,
            self.tag.as_deref(),
            self.type_name,
        )?;

        let mut members = IndexMap::new();
        for (name, member) in def.members() {
            let eligibility = eligibility(name, member);
            let member = match member {
                Member::Method(function) if eligibility.is_checked() => {
                    let condition = Condition::invariant(
                        description.clone(),
                        self.subject(name),
                        eligibility != Eligibility::Initializer,
                    );
                    Member::Method(function.clone().push_layer(Layer::Check(Arc::new(condition))))
                }
                other => other.clone(),
            };
            trace!(type_name = def.name(), member = name, ?eligibility, "deriving member");
            members.insert(name.to_string(), member);
        }
        trace!(type_name = def.name(), description = %description, "invariant attached");
        Ok(TypeDef::from_members(Arc::from(def.name()), members))
    }

    /// The test run around `method`: the predicate over the receiver's state.
    fn subject(&self, method: &str) -> SubjectFn {
        let predicate = Arc::clone(&self.predicate);
        let method = method.to_string();
        Arc::new(move |args: &Args| {
            let receiver = args.receiver::<T>().ok_or_else(|| CallError::Receiver {
                callable: method.clone(),
                expected: std::any::type_name::<T>(),
            })?;
            Ok(receiver.read(|state| predicate(state)))
        })
    }
}

impl<T> fmt::Debug for Invariant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invariant")
            .field("description", &self.description)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}
