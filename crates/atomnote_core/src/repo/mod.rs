//! Graph entity layer and ordered child lists.
//!
//! # Responsibility
//! - Define the graph store contract consumed by every higher layer.
//! - Isolate SQLite query details from view and reconcile logic.
//! - Provide cons-chain list operations over the cell arena.
//!
//! # Invariants
//! - No code outside this module issues SQL against `atoms` or
//!   `atom_list_cells`.
//! - Structural errors (`CorruptList`) propagate; they are never repaired.

pub mod atom_list;
pub mod graph_repo;
