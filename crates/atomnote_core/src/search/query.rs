//! Property query engine.
//!
//! Understands conjunctions of `field="text"` terms, joined by whitespace
//! or an optional `and`, e.g. `value="rust" and alias="lang"`. Matching is a
//! case-insensitive substring test on `value`, `alias` or `shortcut`.

use crate::model::atom::{Atom, AtomId};
use crate::repo::graph_repo::{GraphError, GraphRepository};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static TERM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([A-Za-z_]+)\s*=\s*"([^"]*)""#).expect("term regex must compile")
});
static AND_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:and)\s+").expect("and regex must compile"));

/// Query-engine failure.
#[derive(Debug)]
pub enum QueryError {
    /// Query text does not follow the term grammar at byte `position`.
    InvalidSyntax { query: String, position: usize },
    /// Term names a property the engine does not search.
    UnknownField(String),
    Graph(GraphError),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSyntax { query, position } => {
                write!(f, "invalid query `{query}` at byte {position}")
            }
            Self::UnknownField(field) => write!(f, "unknown query field: {field}"),
            Self::Graph(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for QueryError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

/// Source of candidate atom ids for a query string.
pub trait QueryEngine {
    /// Returns candidate ids; order and duplicates are not significant.
    fn candidates(&self, query: &str) -> Result<Vec<AtomId>, QueryError>;
}

/// Searchable atom property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryField {
    Value,
    Alias,
    Shortcut,
}

impl QueryField {
    fn parse(name: &str) -> Result<Self, QueryError> {
        match name.to_ascii_lowercase().as_str() {
            "value" => Ok(Self::Value),
            "alias" => Ok(Self::Alias),
            "shortcut" => Ok(Self::Shortcut),
            _ => Err(QueryError::UnknownField(name.to_string())),
        }
    }

    fn read(self, atom: &Atom) -> Option<&str> {
        match self {
            Self::Value => atom.value.as_deref(),
            Self::Alias => atom.alias.as_deref(),
            Self::Shortcut => atom.shortcut.as_deref(),
        }
    }
}

/// One `field="text"` term, with the needle already lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub field: QueryField,
    pub needle: String,
}

impl QueryTerm {
    fn matches(&self, atom: &Atom) -> bool {
        self.field
            .read(atom)
            .is_some_and(|text| text.to_lowercase().contains(&self.needle))
    }
}

/// Parses `query` into its terms. A blank query has no terms.
pub fn parse_query(query: &str) -> Result<Vec<QueryTerm>, QueryError> {
    let mut terms = Vec::new();
    let mut rest = query.trim_start();

    while !rest.is_empty() {
        if !terms.is_empty() {
            if let Some(joiner) = AND_PATTERN.find(rest) {
                rest = &rest[joiner.end()..];
            }
        }
        let position = query.len() - rest.len();
        let captures = TERM_PATTERN
            .captures(rest)
            .ok_or_else(|| QueryError::InvalidSyntax {
                query: query.to_string(),
                position,
            })?;

        terms.push(QueryTerm {
            field: QueryField::parse(&captures[1])?,
            needle: captures[2].to_lowercase(),
        });
        let consumed = captures.get(0).map_or(rest.len(), |m| m.end());
        rest = rest[consumed..].trim_start();
    }

    Ok(terms)
}

/// [`QueryEngine`] scanning atom properties in the graph store.
pub struct PropertyQueryEngine<'a, G: ?Sized> {
    graph: &'a G,
}

impl<'a, G: GraphRepository + ?Sized> PropertyQueryEngine<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        Self { graph }
    }
}

impl<G: GraphRepository + ?Sized> QueryEngine for PropertyQueryEngine<'_, G> {
    fn candidates(&self, query: &str) -> Result<Vec<AtomId>, QueryError> {
        let terms = parse_query(query)?;
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<AtomId> = self
            .graph
            .list_atoms()?
            .into_iter()
            .filter(|atom| terms.iter().all(|term| term.matches(atom)))
            .map(|atom| atom.id)
            .collect();
        debug!(
            "event=query_candidates module=search status=ok terms={} hits={}",
            terms.len(),
            ids.len()
        );
        Ok(ids)
    }
}
