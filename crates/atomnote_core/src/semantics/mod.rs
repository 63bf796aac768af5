//! Tree semantics over the atom graph: views, updates and their policies.
//!
//! # Responsibility
//! - Project a graph neighbourhood into a bounded `Note` tree.
//! - Reconcile a desired `Note` tree into minimal list edits.
//! - Host the pluggable visibility filter and adjacency style.
//!
//! # Invariants
//! - Views never sort; ordering follows the persisted list.
//! - Updates edit only the forward `notes` chain, whatever style scoped them.
//! - Structural graph errors propagate unchanged inside `NotesError::Graph`.

use crate::model::atom::AtomId;
use crate::repo::graph_repo::GraphError;
use crate::search::fts::SearchError;
use crate::search::query::QueryError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod adjacency;
pub mod filter;
pub mod lcs;
pub mod ranking;
pub mod reconcile;
pub mod view;

/// Result type for view, update and search operations.
pub type NotesResult<T> = Result<T, NotesError>;

/// Errors from view materialization, reconciliation and result listing.
#[derive(Debug)]
pub enum NotesError {
    /// A view was requested without a root atom.
    NullRoot,
    /// Desired tree is malformed or ambiguous.
    InvalidUpdate(String),
    /// Explicitly listed atom does not exist.
    AtomNotFound(AtomId),
    /// Adjacency style name is not recognised.
    UnknownStyle(String),
    /// Graph entity or list failure.
    Graph(GraphError),
    /// Full-text search failure.
    Search(SearchError),
    /// Query engine failure.
    Query(QueryError),
}

impl Display for NotesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NullRoot => write!(f, "view root is missing"),
            Self::InvalidUpdate(message) => write!(f, "invalid update: {message}"),
            Self::AtomNotFound(id) => write!(f, "no such atom: {id}"),
            Self::UnknownStyle(name) => write!(f, "unknown adjacency style: {name}"),
            Self::Graph(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotesError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Search(err) => Some(err),
            Self::Query(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for NotesError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

impl From<SearchError> for NotesError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

impl From<QueryError> for NotesError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}
