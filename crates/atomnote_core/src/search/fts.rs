//! SQLite FTS5-based index over atom values.
//!
//! # Responsibility
//! - Accept value changes as fire-and-forget index writes.
//! - Resolve keyword queries to candidate atom ids.
//!
//! # Invariants
//! - At most one index row exists per atom id.
//! - Hits are returned by bm25 rank, ties by atom id.

use crate::db::DbError;
use crate::model::atom::{Atom, AtomId};
use crate::repo::graph_repo::{GraphRepository, GraphResult};
use log::{debug, warn};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    /// User-provided query cannot be parsed by FTS5 syntax.
    InvalidQuery {
        query: String,
        message: String,
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search options for full-text query behavior.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// User query text.
    pub text: String,
    /// Maximum number of hits to return.
    pub limit: u32,
    /// Whether to pass text directly as raw FTS5 expression.
    ///
    /// Default is `false` so partial input never trips FTS5 syntax errors.
    pub raw_fts_syntax: bool,
}

impl SearchQuery {
    /// Creates a query with the default hit limit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: 50,
            raw_fts_syntax: false,
        }
    }
}

/// External full-text index consumed by updates and search.
pub trait FullTextIndex {
    /// Records `text` as the searchable value of `atom`.
    ///
    /// Fire-and-forget: failures are logged, never returned.
    fn index_for_search(&self, atom: &Atom, text: &str);

    /// Returns ids of atoms whose indexed value matches `query`.
    fn search(&self, query: &SearchQuery) -> SearchResult<Vec<AtomId>>;
}

/// [`FullTextIndex`] backed by the `atom_search` FTS5 table.
pub struct SqliteFullTextIndex<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFullTextIndex<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write_entry(&self, atom_id: &str, text: &str) -> SearchResult<()> {
        self.conn
            .execute("DELETE FROM atom_search WHERE atom_id = ?1;", [atom_id])?;
        self.conn.execute(
            "INSERT INTO atom_search (atom_id, value) VALUES (?1, ?2);",
            params![atom_id, text],
        )?;
        Ok(())
    }
}

impl FullTextIndex for SqliteFullTextIndex<'_> {
    fn index_for_search(&self, atom: &Atom, text: &str) {
        match self.write_entry(&atom.id, text) {
            Ok(()) => debug!(
                "event=search_index module=search status=ok atom_id={}",
                atom.id
            ),
            Err(err) => warn!(
                "event=search_index module=search status=error atom_id={} error={err}",
                atom.id
            ),
        }
    }

    fn search(&self, query: &SearchQuery) -> SearchResult<Vec<AtomId>> {
        let Some(match_expr) = build_match_expression(query) else {
            return Ok(Vec::new());
        };
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT atom_id
             FROM atom_search
             WHERE atom_search MATCH ?1
             ORDER BY bm25(atom_search), atom_id ASC
             LIMIT ?2;",
        )?;
        let mut rows = stmt
            .query(params![match_expr, i64::from(query.limit)])
            .map_err(|err| map_query_error(err, &match_expr))?;
        let mut ids = Vec::new();

        while let Some(row) = rows
            .next()
            .map_err(|err| map_query_error(err, &match_expr))?
        {
            let atom_id: String = row.get(0)?;
            if atom_id.trim().is_empty() {
                return Err(SearchError::InvalidData("blank atom id".to_string()));
            }
            ids.push(atom_id);
        }

        debug!(
            "event=search_query module=search status=ok hits={}",
            ids.len()
        );
        Ok(ids)
    }
}

/// Re-indexes every atom that carries a value.
///
/// Returns the number of atoms handed to the index.
pub fn reindex_all<G, X>(graph: &G, index: &X) -> GraphResult<usize>
where
    G: GraphRepository + ?Sized,
    X: FullTextIndex + ?Sized,
{
    let mut count = 0;
    for atom in graph.list_atoms()? {
        if let Some(value) = atom.value.as_deref() {
            index.index_for_search(&atom, value);
            count += 1;
        }
    }
    debug!("event=search_reindex module=search status=ok atoms={count}");
    Ok(count)
}

fn build_match_expression(query: &SearchQuery) -> Option<String> {
    let text = query.text.trim();
    if text.is_empty() {
        return None;
    }

    if query.raw_fts_syntax {
        return Some(text.to_string());
    }

    let terms = text
        .split_whitespace()
        .map(escape_fts_term)
        .collect::<Vec<_>>();

    if terms.is_empty() {
        return None;
    }

    Some(terms.join(" AND "))
}

fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }

    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_match_expression, SearchQuery};

    #[test]
    fn terms_are_quoted_and_anded() {
        let query = SearchQuery::new("  rust  \"graph\" ");
        assert_eq!(
            build_match_expression(&query).as_deref(),
            Some("\"rust\" AND \"\"\"graph\"\"\"")
        );
    }

    #[test]
    fn blank_query_has_no_expression() {
        assert_eq!(build_match_expression(&SearchQuery::new("   ")), None);
    }

    #[test]
    fn raw_syntax_passes_through() {
        let mut query = SearchQuery::new("rust OR graph");
        query.raw_fts_syntax = true;
        assert_eq!(
            build_match_expression(&query).as_deref(),
            Some("rust OR graph")
        );
    }
}
