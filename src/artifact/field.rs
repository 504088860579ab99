// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Field paths into document trees.
//!
//! A __field path__ addresses one node of a YAML or JSON document. It is a
//! sequence of segments, each one stepping into an object key, an array
//! index, or the array element whose `name` field equals a given value. The
//! last form exists because datasources, dashboard variables, and
//! access-control roles identify list entries by name rather than position, and a hand-edit that reorders
//! such a list must not move ownership onto the wrong element.
//!
//! Field paths display as `templating.list[name=repository].options`.

use serde_json::Value;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// One step of a [`FieldPath`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member.
    Key(&'static str),

    /// Array element by position.
    Index(usize),

    /// Array element whose `name` field equals the value.
    Named(&'static str),
}

/// Address of a node inside a document tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(pub &'static [Segment]);

impl FieldPath {
    /// Split into parent path and final segment.
    pub fn split_last(&self) -> Option<(FieldPath, Segment)> {
        self.0
            .split_last()
            .map(|(last, parent)| (FieldPath(parent), *last))
    }

    /// Resolve path inside document tree.
    ///
    /// # Errors
    ///
    /// - Return [`FieldError`] naming the first segment that is missing or
    ///   walks into a node of the wrong type.
    pub fn resolve<'a>(&self, mut node: &'a Value) -> Result<&'a Value> {
        for (depth, segment) in self.0.iter().enumerate() {
            node = match step(node, *segment) {
                Ok(next) => next,
                Err(kind) => return Err(self.error_at(depth, kind)),
            };
        }

        Ok(node)
    }

    /// Resolve path inside document tree for mutation.
    ///
    /// # Errors
    ///
    /// - Return [`FieldError`] naming the first segment that is missing or
    ///   walks into a node of the wrong type.
    pub fn resolve_mut<'a>(&self, mut node: &'a mut Value) -> Result<&'a mut Value> {
        for (depth, segment) in self.0.iter().enumerate() {
            node = match step_mut(node, *segment) {
                Ok(next) => next,
                Err(kind) => return Err(self.error_at(depth, kind)),
            };
        }

        Ok(node)
    }

    /// Set or remove the node at this path.
    ///
    /// The parent of the node must already exist and be an object. Setting
    /// `None` removes the member. Returns whether the tree changed.
    ///
    /// # Errors
    ///
    /// - Return [`FieldError`] if parent cannot be resolved, is not an object,
    ///   or if the path does not end in an object key.
    pub fn assign(&self, root: &mut Value, value: Option<Value>) -> Result<bool> {
        let depth = self.0.len().saturating_sub(1);
        let Some((parent, Segment::Key(key))) = self.split_last() else {
            return Err(self.error_at(depth, FieldErrorKind::NotAssignable));
        };

        let Some(object) = parent.resolve_mut(root)?.as_object_mut() else {
            return Err(self.error_at(depth, FieldErrorKind::WrongType("object")));
        };

        let changed = match value {
            Some(value) if object.get(key) == Some(&value) => false,
            Some(value) => {
                object.insert(key.to_string(), value);
                true
            }
            None => object.shift_remove(key).is_some(),
        };

        Ok(changed)
    }

    fn error_at(&self, depth: usize, kind: FieldErrorKind) -> FieldError {
        FieldError {
            at: FieldPath(&self.0[..=depth.min(self.0.len().saturating_sub(1))]).to_string(),
            kind,
        }
    }
}

impl Display for FieldPath {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        for (depth, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if depth == 0 => write!(fmt, "{key}")?,
                Segment::Key(key) => write!(fmt, ".{key}")?,
                Segment::Index(index) => write!(fmt, "[{index}]")?,
                Segment::Named(name) => write!(fmt, "[name={name}]")?,
            }
        }

        Ok(())
    }
}

fn step(node: &Value, segment: Segment) -> Result<&Value, FieldErrorKind> {
    match segment {
        Segment::Key(key) => node
            .as_object()
            .ok_or(FieldErrorKind::WrongType("object"))?
            .get(key)
            .ok_or(FieldErrorKind::Missing),
        Segment::Index(index) => node
            .as_array()
            .ok_or(FieldErrorKind::WrongType("array"))?
            .get(index)
            .ok_or(FieldErrorKind::Missing),
        Segment::Named(name) => node
            .as_array()
            .ok_or(FieldErrorKind::WrongType("array"))?
            .iter()
            .find(|entry| has_name(entry, name))
            .ok_or(FieldErrorKind::Missing),
    }
}

fn step_mut(node: &mut Value, segment: Segment) -> Result<&mut Value, FieldErrorKind> {
    match segment {
        Segment::Key(key) => node
            .as_object_mut()
            .ok_or(FieldErrorKind::WrongType("object"))?
            .get_mut(key)
            .ok_or(FieldErrorKind::Missing),
        Segment::Index(index) => node
            .as_array_mut()
            .ok_or(FieldErrorKind::WrongType("array"))?
            .get_mut(index)
            .ok_or(FieldErrorKind::Missing),
        Segment::Named(name) => node
            .as_array_mut()
            .ok_or(FieldErrorKind::WrongType("array"))?
            .iter_mut()
            .find(|entry| has_name(entry, name))
            .ok_or(FieldErrorKind::Missing),
    }
}

fn has_name(entry: &Value, name: &str) -> bool {
    entry.get("name").and_then(Value::as_str) == Some(name)
}

/// Field path cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {at}")]
pub struct FieldError {
    /// Path up to and including the failing segment.
    pub at: String,
    pub kind: FieldErrorKind,
}

/// Reason a field path cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldErrorKind {
    #[error("missing field")]
    Missing,

    #[error("expected {0}")]
    WrongType(&'static str),

    #[error("path does not end in an object key")]
    NotAssignable,
}

/// Friendly result alias :3
type Result<T, E = FieldError> = std::result::Result<T, E>;
