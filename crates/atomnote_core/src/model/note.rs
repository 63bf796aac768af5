//! Note tree value used for views and desired updates.
//!
//! # Invariants
//! - A `Note` is transient and never persisted directly.
//! - `id == None` means "no persisted atom yet": an instruction to create one.
//! - Two notes denote the same persisted position only if both ids are set
//!   and equal. Id-less notes never match anything, not even each other.

use crate::model::atom::{Atom, AtomId};
use serde::{Deserialize, Serialize};

/// Caller-facing tree node mirroring a subset of atom attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AtomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharability: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Note>,
}

impl Note {
    /// Creates an id-less note carrying only a value.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Creates a note referring to an existing atom id.
    pub fn with_id(id: impl Into<AtomId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Projects an atom's scalar attributes into a childless note.
    pub fn from_atom(atom: &Atom) -> Self {
        Self {
            id: Some(atom.id.clone()),
            value: atom.value.clone(),
            alias: atom.alias.clone(),
            weight: atom.weight,
            sharability: atom.sharability,
            created: Some(atom.created),
            children: Vec::new(),
        }
    }

    /// Appends one child and returns `self` for chaining.
    pub fn child(mut self, child: Note) -> Self {
        self.children.push(child);
        self
    }

    /// Returns whether both notes denote the same persisted position.
    pub fn same_position(&self, other: &Note) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
