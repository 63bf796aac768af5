//! Candidate sources for result listings.
//!
//! # Responsibility
//! - Keep the FTS5 index in step with atom values.
//! - Turn keyword or property queries into candidate atom ids.
//!
//! Ranking and materialization of candidates live in the service layer.

pub mod fts;
pub mod query;
