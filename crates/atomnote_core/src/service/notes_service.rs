//! Notes use-case service.
//!
//! # Responsibility
//! - Resolve ids to atoms and drive view materialization and reconciliation.
//! - Render unordered candidate sets (search, roots, queries) as ranked trees.
//!
//! # Invariants
//! - Result listings are wrapped in a synthetic root note without an id.
//! - Candidate listings hide atoms the filter rejects; views never do.
//! - Transactions stay with the caller.

use crate::activity::ActivityLog;
use crate::model::atom::{Atom, AtomId};
use crate::model::note::Note;
use crate::repo::graph_repo::GraphRepository;
use crate::search::fts::{reindex_all, FullTextIndex, SearchQuery};
use crate::search::query::QueryEngine;
use crate::semantics::adjacency::AdjacencyStyle;
use crate::semantics::filter::Filter;
use crate::semantics::ranking::rank_notes;
use crate::semantics::reconcile::{reconcile, ReconcileStats};
use crate::semantics::view::materialize;
use crate::semantics::{NotesError, NotesResult};
use log::info;
use std::collections::HashSet;

/// Notes service facade over a graph repository and a full-text index.
pub struct NotesService<G: GraphRepository, X: FullTextIndex> {
    graph: G,
    index: X,
}

impl<G: GraphRepository, X: FullTextIndex> NotesService<G, X> {
    /// Creates a service using the provided repository and index.
    pub fn new(graph: G, index: X) -> Self {
        Self { graph, index }
    }

    /// Borrows the underlying graph repository for direct entity access.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Materializes the atom `root_id` down to `height` levels.
    ///
    /// # Errors
    /// - `NullRoot` when no atom has that id.
    pub fn view<F: Filter + ?Sized>(
        &self,
        root_id: &str,
        height: i32,
        filter: &F,
        style: AdjacencyStyle,
        log: Option<&mut dyn ActivityLog>,
    ) -> NotesResult<Note> {
        let root = self.graph.get_atom(root_id)?;
        let note = materialize(&self.graph, root.as_ref(), None, height, filter, style)?;
        if let (Some(log), Some(root)) = (log, root.as_ref()) {
            log.log_view(root);
        }
        info!(
            "event=notes_view module=service status=ok root_id={root_id} height={height} style={style} children={}",
            note.children.len()
        );
        Ok(note)
    }

    /// Reconciles `desired` onto the atom `root_id`.
    ///
    /// Only the forward child lists are edited; `style` and `filter` scope
    /// the call. A hidden atom's children can be viewed, since views always
    /// expand the root, but they cannot be written back: send such an atom
    /// with no children, or at depth 0, to update only its properties.
    ///
    /// # Errors
    /// - `InvalidUpdate` when no atom has that id, for malformed input, or
    ///   when children are supplied for an atom the filter hides at depth > 0.
    /// - `Graph` wrapping `CorruptList` when a stored chain is broken.
    pub fn update<F: Filter + ?Sized>(
        &self,
        root_id: &str,
        desired: &mut Note,
        depth: i32,
        filter: &F,
        style: AdjacencyStyle,
        log: Option<&mut dyn ActivityLog>,
    ) -> NotesResult<ReconcileStats> {
        let root = self.graph.get_atom(root_id)?;
        if root.is_none() {
            return Err(NotesError::InvalidUpdate(format!("no such root atom: {root_id}")));
        }
        reconcile(
            &self.graph,
            &self.index,
            root.as_ref(),
            None,
            desired,
            depth,
            filter,
            style,
            log,
        )
    }

    /// Lists the given atoms, in order, as depth-0 leaves of a synthetic root.
    ///
    /// # Errors
    /// - `AtomNotFound` for the first unknown id.
    pub fn custom_view<F: Filter + ?Sized>(&self, ids: &[AtomId], filter: &F) -> NotesResult<Note> {
        let mut root = Note::default();
        for id in ids {
            let atom = self.require_atom(id)?;
            root.children.push(materialize(
                &self.graph,
                Some(&atom),
                None,
                0,
                filter,
                AdjacencyStyle::Forward,
            )?);
        }
        Ok(root)
    }

    /// Full-text search over atom values.
    ///
    /// Each visible hit is materialized at `depth - 1` and the hits ranked.
    pub fn search<F: Filter + ?Sized>(
        &self,
        query: &SearchQuery,
        depth: i32,
        filter: &F,
        style: AdjacencyStyle,
    ) -> NotesResult<Note> {
        let ids = self.index.search(query)?;
        let mut root = self.render_candidates(ids, depth - 1, filter, style)?;
        root.value = Some(format!("full text search results for \"{}\"", query.text));
        info!(
            "event=notes_search module=service status=ok hits={}",
            root.children.len()
        );
        Ok(root)
    }

    /// Lists visible atoms that no list references, ranked, as leaves.
    pub fn find_roots<F: Filter + ?Sized>(
        &self,
        filter: &F,
        style: AdjacencyStyle,
    ) -> NotesResult<Note> {
        let ids = self
            .graph
            .list_unreferenced_atoms()?
            .into_iter()
            .map(|atom| atom.id)
            .collect();
        self.render_candidates(ids, 0, filter, style)
    }

    /// Renders the candidates of `engine` for `query` like a search.
    pub fn run_query<E, F>(
        &self,
        engine: &E,
        query: &str,
        depth: i32,
        filter: &F,
        style: AdjacencyStyle,
    ) -> NotesResult<Note>
    where
        E: QueryEngine + ?Sized,
        F: Filter + ?Sized,
    {
        let ids = engine.candidates(query)?;
        let mut root = self.render_candidates(ids, depth - 1, filter, style)?;
        root.value = Some(format!("query results for \"{query}\""));
        info!(
            "event=notes_query module=service status=ok hits={}",
            root.children.len()
        );
        Ok(root)
    }

    /// Re-indexes every valued atom; returns how many were indexed.
    pub fn reindex(&self) -> NotesResult<usize> {
        Ok(reindex_all(&self.graph, &self.index)?)
    }

    fn render_candidates<F: Filter + ?Sized>(
        &self,
        ids: Vec<AtomId>,
        height: i32,
        filter: &F,
        style: AdjacencyStyle,
    ) -> NotesResult<Note> {
        let mut seen = HashSet::new();
        let mut children = Vec::new();
        for id in ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            // Index rows can outlive their atom until the next reindex.
            let Some(atom) = self.graph.get_atom(&id)? else {
                continue;
            };
            if !filter.is_visible(&atom) {
                continue;
            }
            children.push(materialize(
                &self.graph,
                Some(&atom),
                None,
                height,
                filter,
                style,
            )?);
        }
        rank_notes(&mut children);
        Ok(Note {
            children,
            ..Note::default()
        })
    }

    fn require_atom(&self, id: &str) -> NotesResult<Atom> {
        self.graph
            .get_atom(id)?
            .ok_or_else(|| NotesError::AtomNotFound(id.to_string()))
    }
}
