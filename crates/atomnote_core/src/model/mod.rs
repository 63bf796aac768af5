//! Domain model for the atom graph.
//!
//! # Responsibility
//! - Define the persisted entities (`Atom`, `AtomListCell`).
//! - Define the transient `Note` tree used by views and updates.
//!
//! # Invariants
//! - Every persisted object is identified by a stable opaque string id.
//! - Child order lives only in list cells, never on atoms themselves.

pub mod atom;
pub mod cell;
pub mod note;
