// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Contracted callables and the check sequence.
//!
//! A [`Function`] is the innermost callable (name, signature, body, attached
//! preservers) plus a stack of layers. Every attachment pushes one layer on
//! top, so later attachments wrap earlier ones:
//!
//! ```text
//!   call ──▶ bind ──▶ layer N ──▶ layer N-1 ──▶ … ──▶ layer 1 ──▶ body
//!                      │ before                          │ before
//!   result ◀────────── │ after ◀─────────── … ◀───────── │ after ◀──┘
//! ```
//!
//! Per condition layer: check before (preconditions, invariants), gather the
//! snapshot if a postcondition wants one, run the inner layers, check after.
//! Transform layers rewrite the record on its way in, so every layer below
//! them sees the rewritten values.
//!
//! Bodies are either blocking or suspending. Both paths share the same layer
//! steps; the suspending path differs only in awaiting the body, which is the
//! single suspension point a contracted call introduces. Dropping the future
//! before the body resolves skips every pending postcondition.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::condition::Condition;
use crate::error::{AttachmentError, CallError};
use crate::record::{Args, Snapshot};
use crate::signature::{Call, Signature};
use crate::value::Value;

/// Boxed, sendable future, as returned by suspending bodies.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub(crate) type Transformer = Arc<dyn Fn(&Args) -> Result<Args, CallError> + Send + Sync>;
pub(crate) type Preserver = Arc<dyn Fn(&Args) -> Snapshot + Send + Sync>;

type BlockingBody = Arc<dyn Fn(Args) -> anyhow::Result<Value> + Send + Sync>;
type SuspendingBody = Arc<dyn Fn(Args) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

#[derive(Clone)]
enum Body {
    Blocking(BlockingBody),
    Suspending(SuspendingBody),
}

/// The original callable, reachable through any number of layers.
#[derive(Clone)]
struct Innermost {
    name: String,
    signature: Signature,
    body: Body,
    preservers: Vec<Preserver>,
}

impl Innermost {
    fn snapshot(&self, args: &Args) -> Snapshot {
        self.preservers
            .iter()
            .fold(Snapshot::new(), |snapshot, preserver| snapshot.merge(preserver(args)))
    }
}

#[derive(Clone)]
pub(crate) enum Layer {
    Check(Arc<Condition>),
    Transform(Transformer),
}

/// Anything that can be attached to a [`Function`].
pub trait Attach {
    fn attach_to(self, function: Function) -> Result<Function, AttachmentError>;
}

/// A callable with contracts attached.
#[derive(Clone)]
pub struct Function {
    innermost: Arc<Innermost>,
    layers: Vec<Layer>,
}

impl Function {
    /// A blocking callable. Fails if `signature` declares a name twice.
    pub fn new<F, R>(
        name: impl Into<String>,
        signature: Signature,
        body: F,
    ) -> Result<Self, AttachmentError>
    where
        F: Fn(Args) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Value>,
    {
        let body: BlockingBody = Arc::new(move |args: Args| -> anyhow::Result<Value> {
            body(args).map(Into::<Value>::into)
        });
        Self::from_body(name.into(), signature, Body::Blocking(body))
    }

    /// A suspending callable; call it through [`Function::call_async`].
    pub fn new_async<F, Fut, R>(
        name: impl Into<String>,
        signature: Signature,
        body: F,
    ) -> Result<Self, AttachmentError>
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<Value>,
    {
        let body: SuspendingBody =
            Arc::new(move |args: Args| -> BoxFuture<'static, anyhow::Result<Value>> {
                let pending = body(args);
                Box::pin(async move { pending.await.map(Into::<Value>::into) })
            });
        Self::from_body(name.into(), signature, Body::Suspending(body))
    }

    fn from_body(name: String, signature: Signature, body: Body) -> Result<Self, AttachmentError> {
        signature.validate(&name)?;
        Ok(Self {
            innermost: Arc::new(Innermost {
                name,
                signature,
                body,
                preservers: Vec::new(),
            }),
            layers: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.innermost.name
    }

    /// Signature of the original callable, whatever is layered on top.
    pub fn signature(&self) -> &Signature {
        &self.innermost.signature
    }

    pub fn is_async(&self) -> bool {
        matches!(self.innermost.body, Body::Suspending(_))
    }

    /// Number of wrapping layers (conditions and transforms).
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Attach a condition, transform or preserver under the process-wide
    /// configuration. With contracts disabled this returns `self` unchanged.
    ///
    /// Each attachment wraps everything attached before it, so in
    /// `f.attach(a)?.attach(b)?` the layer `b` is outermost. A call checks
    /// the precondition of `b` before that of `a`, and on the way out checks
    /// the postcondition of `a` before that of `b`. This is the order of
    /// stacked attributes read top to bottom over the innermost body.
    pub fn attach<A: Attach>(self, attachment: A) -> Result<Function, AttachmentError> {
        crate::config::Contracts::global().apply(self, attachment)
    }

    pub(crate) fn push_layer(mut self, layer: Layer) -> Function {
        self.layers.push(layer);
        self
    }

    pub(crate) fn add_preserver(mut self, preserver: Preserver) -> Function {
        Arc::make_mut(&mut self.innermost).preservers.push(preserver);
        self
    }

    /// Call a blocking function.
    pub fn call(&self, call: Call) -> Result<Value, CallError> {
        if self.is_async() {
            return Err(CallError::RequiresAwait {
                callable: self.name().to_string(),
            });
        }
        let args = self.bind(call)?;
        self.invoke(self.layers.len(), args)
    }

    /// Call a function of either kind, awaiting the body if it suspends.
    pub async fn call_async(&self, call: Call) -> Result<Value, CallError> {
        let args = self.bind(call)?;
        self.invoke_async(self.layers.len(), args).await
    }

    fn bind(&self, call: Call) -> Result<Args, CallError> {
        self.signature().bind(self.name(), call)
    }

    fn invoke(&self, depth: usize, args: Args) -> Result<Value, CallError> {
        let Some(index) = depth.checked_sub(1) else {
            return self.run_blocking(args);
        };
        match &self.layers[index] {
            Layer::Transform(transformer) => {
                let args = self.transform(transformer, &args)?;
                self.invoke(index, args)
            }
            Layer::Check(condition) => {
                let snapshot = self.enter(condition, &args)?;
                let result = self.invoke(index, args.clone())?;
                self.leave(condition, &args, &result, &snapshot)?;
                Ok(result)
            }
        }
    }

    fn invoke_async(&self, depth: usize, args: Args) -> BoxFuture<'_, Result<Value, CallError>> {
        Box::pin(async move {
            let Some(index) = depth.checked_sub(1) else {
                return self.run_suspending(args).await;
            };
            match &self.layers[index] {
                Layer::Transform(transformer) => {
                    let args = self.transform(transformer, &args)?;
                    self.invoke_async(index, args).await
                }
                Layer::Check(condition) => {
                    let snapshot = self.enter(condition, &args)?;
                    let result = self.invoke_async(index, args.clone()).await?;
                    self.leave(condition, &args, &result, &snapshot)?;
                    Ok(result)
                }
            }
        })
    }

    /// Before the inner call: check, then capture the snapshot if needed.
    fn enter(&self, condition: &Condition, args: &Args) -> Result<Snapshot, CallError> {
        condition.check_before(self.name(), args)?;
        Ok(if condition.wants_snapshot() {
            self.innermost.snapshot(args)
        } else {
            Snapshot::new()
        })
    }

    fn leave(
        &self,
        condition: &Condition,
        args: &Args,
        result: &Value,
        snapshot: &Snapshot,
    ) -> Result<(), CallError> {
        condition.check_after(self.name(), args, result, snapshot)
    }

    fn transform(&self, transformer: &Transformer, args: &Args) -> Result<Args, CallError> {
        let rewritten = transformer(args)?;
        if !rewritten.same_shape(args) {
            return Err(CallError::RecordShape {
                callable: self.name().to_string(),
            });
        }
        Ok(rewritten)
    }

    fn run_blocking(&self, args: Args) -> Result<Value, CallError> {
        match &self.innermost.body {
            Body::Blocking(body) => body(args).map_err(CallError::from_body),
            Body::Suspending(_) => Err(CallError::RequiresAwait {
                callable: self.name().to_string(),
            }),
        }
    }

    async fn run_suspending(&self, args: Args) -> Result<Value, CallError> {
        match &self.innermost.body {
            Body::Blocking(body) => body(args).map_err(CallError::from_body),
            Body::Suspending(body) => body(args).await.map_err(CallError::from_body),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditions: Vec<String> = self
            .layers
            .iter()
            .map(|layer| match layer {
                Layer::Check(condition) => {
                    format!("{}: {}", condition.kind(), condition.description())
                }
                Layer::Transform(_) => "transform".to_string(),
            })
            .collect();
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("signature", self.signature())
            .field("async", &self.is_async())
            .field("layers", &conditions)
            .finish()
    }
}
