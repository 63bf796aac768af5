//! Core domain logic for AtomNote: an outline-style note graph.
//! Atoms own ordered child lists; views and updates move between the graph
//! and caller-facing `Note` trees.

pub mod activity;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod semantics;
pub mod service;

pub use activity::{ActivityEvent, ActivityLog, LogActivityLog, RecordingActivityLog};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from_env, logging_status};
pub use model::atom::{Atom, AtomId, AtomValidationError};
pub use model::cell::AtomListCell;
pub use model::note::Note;
pub use repo::graph_repo::{
    AtomDefaults, GraphError, GraphRepository, GraphResult, SqliteGraphRepository,
};
pub use search::fts::{
    FullTextIndex, SearchError, SearchQuery, SearchResult, SqliteFullTextIndex,
};
pub use search::query::{PropertyQueryEngine, QueryEngine, QueryError};
pub use semantics::adjacency::AdjacencyStyle;
pub use semantics::filter::{Filter, FilterError, NoFilter, RangeFilter};
pub use semantics::reconcile::ReconcileStats;
pub use semantics::{NotesError, NotesResult};
pub use service::notes_service::NotesService;

