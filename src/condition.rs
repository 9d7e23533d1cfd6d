// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Conditions and the combinators that attach them.
//!
//! A condition pairs a description with a predicate. Predicates come in three
//! explicit shapes, picked when the predicate is built and checked against
//! the condition kind when it is attached:
//!
//! | Shape     | Sees                          | Valid for                 |
//! |-----------|-------------------------------|---------------------------|
//! | `Unary`   | call record                   | preconditions, invariants |
//! | `Binary`  | call record, result           | postconditions            |
//! | `Ternary` | call record, result, snapshot | postconditions            |
//!
//! A contracted [`Function`] can also serve as a predicate. Its shape is read
//! off its signature, and a suspending function is refused: a check that
//! yields to the scheduler could interleave with unrelated work mid-check.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::describe::{self, Origin};
use crate::error::{AttachmentError, CallError, PostconditionFailure, PreconditionFailure};
use crate::function::{Attach, Function, Layer};
use crate::record::{Args, Snapshot};
use crate::signature::Call;
use crate::value::{Kind, Value};

/// Description used by [`type_check`] conditions.
pub const TYPE_CHECK_DESCRIPTION: &str = "the types of arguments must be valid";

/// What a condition guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Precondition,
    Postcondition,
    Invariant,
}

impl ConditionKind {
    /// Name of the combinator that attaches this kind.
    pub fn attachment_name(self) -> &'static str {
        match self {
            ConditionKind::Precondition => "requires",
            ConditionKind::Postcondition => "ensures",
            ConditionKind::Invariant => "invariant",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConditionKind::Precondition => "precondition",
            ConditionKind::Postcondition => "postcondition",
            ConditionKind::Invariant => "invariant",
        })
    }
}

type UnaryFn = Arc<dyn Fn(&Args) -> bool + Send + Sync>;
type BinaryFn = Arc<dyn Fn(&Args, &Value) -> bool + Send + Sync>;
type TernaryFn = Arc<dyn Fn(&Args, &Value, &Snapshot) -> bool + Send + Sync>;
pub(crate) type SubjectFn = Arc<dyn Fn(&Args) -> Result<bool, CallError> + Send + Sync>;
pub(crate) type Cleanup = Arc<dyn Fn(&Args) -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone)]
enum Shape {
    Unary(UnaryFn),
    Binary(BinaryFn),
    Ternary(TernaryFn),
    Callable(Function),
}

/// A condition's test, tagged with its shape.
#[derive(Clone)]
pub struct Predicate {
    shape: Shape,
    tag: Option<String>,
    type_name: &'static str,
}

impl Predicate {
    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        Self::with_shape(Shape::Unary(Arc::new(f)), describe::anonymous_name::<F>())
    }

    pub fn binary<F>(f: F) -> Self
    where
        F: Fn(&Args, &Value) -> bool + Send + Sync + 'static,
    {
        Self::with_shape(Shape::Binary(Arc::new(f)), describe::anonymous_name::<F>())
    }

    pub fn ternary<F>(f: F) -> Self
    where
        F: Fn(&Args, &Value, &Snapshot) -> bool + Send + Sync + 'static,
    {
        Self::with_shape(Shape::Ternary(Arc::new(f)), describe::anonymous_name::<F>())
    }

    /// Use a contracted function as the predicate; its result's truthiness decides.
    pub fn callable(function: Function) -> Self {
        let tag = function.name().to_string();
        Self {
            shape: Shape::Callable(function),
            tag: Some(tag),
            type_name: describe::anonymous_name::<Function>(),
        }
    }

    /// Register a stable name used when no description is given.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    fn with_shape(shape: Shape, type_name: &'static str) -> Self {
        Self {
            shape,
            tag: None,
            type_name,
        }
    }

    /// Number of arguments the predicate takes.
    pub fn arity(&self) -> usize {
        match &self.shape {
            Shape::Unary(_) => 1,
            Shape::Binary(_) => 2,
            Shape::Ternary(_) => 3,
            Shape::Callable(function) => function.signature().arity(),
        }
    }

    /// Whether evaluating the predicate would suspend.
    pub fn is_suspending(&self) -> bool {
        matches!(&self.shape, Shape::Callable(function) if function.is_async())
    }

    fn label(&self) -> &str {
        self.tag.as_deref().unwrap_or(self.type_name)
    }

    fn compile(self, kind: ConditionKind) -> Result<Test, AttachmentError> {
        if self.is_suspending() {
            return Err(AttachmentError::SuspendingPredicate {
                predicate: self.label().to_string(),
            });
        }
        let arity = self.arity();
        let (fits, expected) = match kind {
            ConditionKind::Precondition | ConditionKind::Invariant => (arity == 1, "1"),
            ConditionKind::Postcondition => ((2..=3).contains(&arity), "2 or 3"),
        };
        if !fits {
            return Err(AttachmentError::Arity {
                kind,
                expected,
                found: arity,
            });
        }
        Ok(match self.shape {
            Shape::Unary(f) => Test::Unary(f),
            Shape::Binary(f) => Test::Binary(f),
            Shape::Ternary(f) => Test::Ternary(f),
            Shape::Callable(function) => Test::Callable { function, arity },
        })
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("arity", &self.arity())
            .field("label", &self.label())
            .finish()
    }
}

#[doc(hidden)]
pub mod markers {
    pub struct Unary;
    pub struct Binary;
    pub struct Ternary;
}

/// Conversion of closures and functions into tagged predicates.
///
/// The marker parameter only disambiguates the closure shapes; callers never
/// name it.
pub trait IntoPredicate<Marker> {
    fn into_predicate(self) -> Predicate;
}

impl<F> IntoPredicate<markers::Unary> for F
where
    F: Fn(&Args) -> bool + Send + Sync + 'static,
{
    fn into_predicate(self) -> Predicate {
        Predicate::unary(self)
    }
}

impl<F> IntoPredicate<markers::Binary> for F
where
    F: Fn(&Args, &Value) -> bool + Send + Sync + 'static,
{
    fn into_predicate(self) -> Predicate {
        Predicate::binary(self)
    }
}

impl<F> IntoPredicate<markers::Ternary> for F
where
    F: Fn(&Args, &Value, &Snapshot) -> bool + Send + Sync + 'static,
{
    fn into_predicate(self) -> Predicate {
        Predicate::ternary(self)
    }
}

impl IntoPredicate<Predicate> for Predicate {
    fn into_predicate(self) -> Predicate {
        self
    }
}

impl IntoPredicate<Function> for Function {
    fn into_predicate(self) -> Predicate {
        Predicate::callable(self)
    }
}

/// A compiled predicate, ready to run inside the check sequence.
#[derive(Clone)]
pub(crate) enum Test {
    Unary(UnaryFn),
    Binary(BinaryFn),
    Ternary(TernaryFn),
    Callable { function: Function, arity: usize },
    /// Fallible test over the record, used for receiver-based invariants.
    Subject(SubjectFn),
}

impl Test {
    fn wants_snapshot(&self) -> bool {
        match self {
            Test::Ternary(_) => true,
            Test::Callable { arity, .. } => *arity == 3,
            _ => false,
        }
    }

    fn holds(&self, args: &Args, result: &Value, snapshot: &Snapshot) -> Result<bool, CallError> {
        match self {
            Test::Unary(f) => Ok(f(args)),
            Test::Binary(f) => Ok(f(args, result)),
            Test::Ternary(f) => Ok(f(args, result, snapshot)),
            Test::Subject(f) => f(args),
            Test::Callable { function, arity } => {
                let mut call = Call::new().arg(args.to_value());
                if *arity >= 2 {
                    call = call.arg(result.clone());
                }
                if *arity == 3 {
                    call = call.arg(snapshot.to_value());
                }
                Ok(function.call(call)?.truthy())
            }
        }
    }
}

/// One attached condition as the evaluator runs it.
pub(crate) struct Condition {
    kind: ConditionKind,
    description: String,
    errno: i32,
    test: Test,
    before: bool,
    after: bool,
    cleanup: Option<Cleanup>,
}

impl Condition {
    /// Invariant over the receiver: checked after every call, and before
    /// unless `before` is false (initializers).
    pub(crate) fn invariant(description: String, test: SubjectFn, before: bool) -> Self {
        Self {
            kind: ConditionKind::Invariant,
            description,
            errno: 0,
            test: Test::Subject(test),
            before,
            after: true,
            cleanup: None,
        }
    }

    pub(crate) fn kind(&self) -> ConditionKind {
        self.kind
    }

    pub(crate) fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn check_before(&self, callable: &str, args: &Args) -> Result<(), CallError> {
        if !self.before || self.test.holds(args, &Value::Unit, &Snapshot::default())? {
            return Ok(());
        }
        debug!(
            callable,
            kind = %self.kind,
            description = %self.description,
            errno = self.errno,
            "precondition failed"
        );
        Err(PreconditionFailure {
            description: self.description.clone(),
            errno: self.errno,
        }
        .into())
    }

    pub(crate) fn wants_snapshot(&self) -> bool {
        self.after && self.test.wants_snapshot()
    }

    pub(crate) fn check_after(
        &self,
        callable: &str,
        args: &Args,
        result: &Value,
        snapshot: &Snapshot,
    ) -> Result<(), CallError> {
        if !self.after || self.test.holds(args, result, snapshot)? {
            return Ok(());
        }
        let mut description = self.description.clone();
        if let Some(cleanup) = &self.cleanup {
            if let Err(error) = cleanup(args) {
                warn!(callable, error = %error, "clean up after failed postcondition failed");
                description = format!("{description}. Clean up failed: {error}");
            }
        }
        debug!(
            callable,
            kind = %self.kind,
            description = %description,
            errno = self.errno,
            "postcondition failed"
        );
        Err(PostconditionFailure {
            description,
            errno: self.errno,
        }
        .into())
    }
}

/// Shared part of the precondition and postcondition builders.
struct Draft {
    predicate: Predicate,
    description: Option<String>,
    source: Option<&'static str>,
    errno: i32,
}

impl Draft {
    fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            description: None,
            source: None,
            errno: 0,
        }
    }

    fn resolve_description(&self, kind: ConditionKind) -> Result<String, AttachmentError> {
        resolve_description(
            kind,
            self.description.as_deref(),
            self.source,
            self.predicate.tag.as_deref(),
            self.predicate.type_name,
        )
    }
}

/// Explicit description if given (must not be empty), else a synthesized one.
pub(crate) fn resolve_description(
    kind: ConditionKind,
    explicit: Option<&str>,
    source: Option<&str>,
    tag: Option<&str>,
    type_name: &str,
) -> Result<String, AttachmentError> {
    if let Some(description) = explicit {
        if description.is_empty() {
            return Err(AttachmentError::EmptyDescription);
        }
        return Ok(description.to_string());
    }
    let origin = match (source, tag) {
        (Some(text), _) if !text.trim().is_empty() => Origin::Source(text),
        (_, Some(tag)) => Origin::Tag(tag),
        _ => Origin::Anonymous(type_name),
    };
    Ok(describe::synthesize(kind, origin))
}

/// Precondition builder returned by [`requires`].
pub struct Requires {
    draft: Draft,
}

/// Attach a precondition: checked before the callable runs.
pub fn requires<M>(predicate: impl IntoPredicate<M>) -> Requires {
    Requires {
        draft: Draft::new(predicate.into_predicate()),
    }
}

impl Requires {
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.draft.description = Some(description.into());
        self
    }

    pub fn errno(mut self, errno: i32) -> Self {
        self.draft.errno = errno;
        self
    }

    /// Declaration text of the predicate, captured by [`requires!`](crate::requires!).
    #[doc(hidden)]
    pub fn source(mut self, text: &'static str) -> Self {
        self.draft.source = Some(text);
        self
    }
}

impl Attach for Requires {
    fn attach_to(self, function: Function) -> Result<Function, AttachmentError> {
        let kind = ConditionKind::Precondition;
        let description = self.draft.resolve_description(kind)?;
        let test = self.draft.predicate.compile(kind)?;
        let condition = Condition {
            kind,
            description,
            errno: self.draft.errno,
            test,
            before: true,
            after: false,
            cleanup: None,
        };
        Ok(function.push_condition(condition))
    }
}

/// Postcondition builder returned by [`ensures`].
pub struct Ensures {
    draft: Draft,
    cleanup: Option<Cleanup>,
}

/// Attach a postcondition: checked after the callable returns.
pub fn ensures<M>(predicate: impl IntoPredicate<M>) -> Ensures {
    Ensures {
        draft: Draft::new(predicate.into_predicate()),
        cleanup: None,
    }
}

impl Ensures {
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.draft.description = Some(description.into());
        self
    }

    pub fn errno(mut self, errno: i32) -> Self {
        self.draft.errno = errno;
        self
    }

    /// Action run when the postcondition fails, before the failure is signaled.
    pub fn cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: Fn(&Args) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.cleanup = Some(Arc::new(cleanup));
        self
    }

    #[doc(hidden)]
    pub fn source(mut self, text: &'static str) -> Self {
        self.draft.source = Some(text);
        self
    }
}

impl Attach for Ensures {
    fn attach_to(self, function: Function) -> Result<Function, AttachmentError> {
        let kind = ConditionKind::Postcondition;
        let description = self.draft.resolve_description(kind)?;
        let test = self.draft.predicate.compile(kind)?;
        let condition = Condition {
            kind,
            description,
            errno: self.draft.errno,
            test,
            before: false,
            after: true,
            cleanup: self.cleanup,
        };
        Ok(function.push_condition(condition))
    }
}

/// Precondition validating the runtime kind of named parameters.
pub struct TypeCheck {
    fields: Vec<(String, Vec<Kind>)>,
    errno: i32,
}

/// Start a type-check precondition; add fields with [`TypeCheck::field`].
pub fn type_check() -> TypeCheck {
    TypeCheck {
        fields: Vec::new(),
        errno: 0,
    }
}

impl TypeCheck {
    /// `name` must hold a value of one of `kinds`.
    pub fn field(mut self, name: impl Into<String>, kinds: impl IntoIterator<Item = Kind>) -> Self {
        self.fields.push((name.into(), kinds.into_iter().collect()));
        self
    }

    pub fn errno(mut self, errno: i32) -> Self {
        self.errno = errno;
        self
    }
}

impl Attach for TypeCheck {
    fn attach_to(self, function: Function) -> Result<Function, AttachmentError> {
        if let Some((name, _)) = self
            .fields
            .iter()
            .find(|(name, _)| !function.signature().declares(name))
        {
            return Err(AttachmentError::UnknownParameter {
                callable: function.name().to_string(),
                name: name.clone(),
            });
        }
        let fields = self.fields;
        let predicate = move |args: &Args| {
            fields.iter().all(|(name, kinds)| {
                args.get(name)
                    .is_some_and(|value| kinds.contains(&value.kind()))
            })
        };
        trace!(callable = function.name(), "attaching type check");
        requires(predicate)
            .describe(TYPE_CHECK_DESCRIPTION)
            .errno(self.errno)
            .attach_to(function)
    }
}

impl Function {
    fn push_condition(self, condition: Condition) -> Function {
        trace!(
            callable = self.name(),
            kind = %condition.kind,
            description = %condition.description,
            "attaching condition"
        );
        self.push_layer(Layer::Check(Arc::new(condition)))
    }
}
