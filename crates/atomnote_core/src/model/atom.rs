//! Atom domain model.
//!
//! # Responsibility
//! - Define the canonical knowledge node shared by views and updates.
//! - Validate scalar properties before they reach storage.
//!
//! # Invariants
//! - `id` is stable and never reused for another atom.
//! - `created` is stamped once at creation and never mutated.
//! - `notes` is owned exclusively by this atom: no other atom or cell points
//!   at the same head cell.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque, graph-assigned identifier of an atom.
pub type AtomId = String;

/// Opaque identifier of one list cell.
pub type CellId = String;

/// Validation errors for atom scalar properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomValidationError {
    /// Id is empty or whitespace only.
    BlankId,
    /// A float property is NaN or infinite.
    NonFiniteProperty(&'static str),
    /// `created` is negative.
    InvalidCreated(i64),
}

impl Display for AtomValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "atom id must not be blank"),
            Self::NonFiniteProperty(field) => write!(f, "atom {field} must be a finite number"),
            Self::InvalidCreated(value) => {
                write!(f, "atom created timestamp must be >= 0, got {value}")
            }
        }
    }
}

impl Error for AtomValidationError {}

/// Knowledge node with scalar attributes and an ordered child list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub id: AtomId,
    pub value: Option<String>,
    /// IRI-like alias. Replaced on update, never cleared.
    pub alias: Option<String>,
    /// Unix epoch milliseconds.
    pub created: i64,
    pub priority: Option<f32>,
    pub sharability: Option<f32>,
    pub weight: Option<f32>,
    pub shortcut: Option<String>,
    /// Head cell of this atom's ordered notes. `None` when childless.
    pub notes: Option<CellId>,
}

impl Atom {
    /// Creates a bare atom with the given id and creation time.
    pub fn new(id: impl Into<AtomId>, created: i64) -> Self {
        Self {
            id: id.into(),
            value: None,
            alias: None,
            created,
            priority: None,
            sharability: None,
            weight: None,
            shortcut: None,
            notes: None,
        }
    }

    /// Validates identity and numeric properties.
    ///
    /// Ranges of `weight`, `sharability` and `priority` are application
    /// defined and are not checked here.
    pub fn validate(&self) -> Result<(), AtomValidationError> {
        if self.id.trim().is_empty() {
            return Err(AtomValidationError::BlankId);
        }
        if self.created < 0 {
            return Err(AtomValidationError::InvalidCreated(self.created));
        }
        for (field, value) in [
            ("priority", self.priority),
            ("sharability", self.sharability),
            ("weight", self.weight),
        ] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(AtomValidationError::NonFiniteProperty(field));
            }
        }
        Ok(())
    }

    /// Returns whether this atom currently owns a child list.
    pub fn has_notes(&self) -> bool {
        self.notes.is_some()
    }
}

/// Generates a fresh opaque id for atoms and cells.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
