// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Argument rewriting and old-value capture.
//!
//! [`transform`] rewrites the call record on its way in. It sits wherever it
//! was attached in the layer stack, so every condition attached before it
//! (and the body) sees the rewritten record. Attach it last to have it run
//! before everything else.
//!
//! [`preserve`] attaches to the innermost callable instead, so the snapshot
//! it contributes reaches ternary postconditions however many layers are
//! added on top, before or after it.

use std::sync::Arc;

use tracing::trace;

use crate::error::{AttachmentError, CallError};
use crate::function::{Attach, Function, Layer};
use crate::record::{Args, Snapshot};

/// Record rewrite step returned by [`transform`].
pub struct Transform {
    transformer: Arc<dyn Fn(&Args) -> Result<Args, CallError> + Send + Sync>,
}

/// Rewrite the call record before the conditions below it and the body run.
///
/// Build the new record with [`rewrite`](crate::rewrite()). A record with
/// renamed or dropped parameters fails the call with
/// [`CallError::RecordShape`].
pub fn transform<F>(transformer: F) -> Transform
where
    F: Fn(&Args) -> Result<Args, CallError> + Send + Sync + 'static,
{
    Transform {
        transformer: Arc::new(transformer),
    }
}

impl Attach for Transform {
    fn attach_to(self, function: Function) -> Result<Function, AttachmentError> {
        trace!(callable = function.name(), "attaching transform");
        Ok(function.push_layer(Layer::Transform(self.transformer)))
    }
}

/// Old-value capture step returned by [`preserve`].
pub struct Preserve {
    preserver: Arc<dyn Fn(&Args) -> Snapshot + Send + Sync>,
}

/// Capture values before the body runs, for ternary postconditions.
///
/// Copies are shallow: a preserver that needs the old contents of a shared
/// structure has to copy them itself.
pub fn preserve<F>(preserver: F) -> Preserve
where
    F: Fn(&Args) -> Snapshot + Send + Sync + 'static,
{
    Preserve {
        preserver: Arc::new(preserver),
    }
}

impl Attach for Preserve {
    fn attach_to(self, function: Function) -> Result<Function, AttachmentError> {
        trace!(callable = function.name(), "attaching preserver");
        Ok(function.add_preserver(self.preserver))
    }
}
