// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Descriptions for conditions attached without one.
//!
//! The attachment macros capture the predicate's declaration text with
//! `stringify!`, so `requires!(|a: &Args| a.int("x") > Some(0))` is described
//! as `@requires(|a: &Args| a.int("x") > Some(0)) failed`. Predicates built
//! without macros can carry a registered tag instead. With neither, the
//! predicate's type name stands in: not pretty, but printable and stable for
//! one build.

use crate::condition::ConditionKind;

/// Where a synthesized description comes from, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin<'a> {
    /// Declaration text captured at the attachment site.
    Source(&'a str),
    /// A name registered with the predicate.
    Tag(&'a str),
    /// Printable identifier of the predicate value.
    Anonymous(&'a str),
}

/// Suffix appended to every synthesized description.
pub const FAILED_SUFFIX: &str = " failed";

/// Build a description for a `kind` condition from the best available origin.
pub fn synthesize(kind: ConditionKind, origin: Origin<'_>) -> String {
    let text = match origin {
        Origin::Source(text) | Origin::Tag(text) => collapse_whitespace(text),
        Origin::Anonymous(name) => name.to_string(),
    };
    let text = if text.is_empty() {
        "<predicate>".to_string()
    } else {
        text
    };
    format!("@{}({}){}", kind.attachment_name(), text, FAILED_SUFFIX)
}

/// Collapse whitespace runs, trimming both ends.
///
/// Multi-line predicates keep their tokens but lose their layout, which keeps
/// descriptions on one line in logs and error messages.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Printable identifier for a predicate of type `F`.
pub(crate) fn anonymous_name<F>() -> &'static str {
    std::any::type_name::<F>()
}
