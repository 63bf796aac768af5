//! Reconciliation of a desired `Note` tree into the persisted graph.
//!
//! # Responsibility
//! - Sync scalar properties from the desired tree onto atoms.
//! - Turn child-list differences into the minimal insert/delete script.
//! - Resolve or create atoms backing newly inserted notes.
//!
//! # Invariants
//! - Only the forward `notes` chain is edited; the style only scopes the call.
//! - Kept children are never re-created; matching is by id only.
//! - Omitted desired properties leave stored values unchanged.

use crate::activity::ActivityLog;
use crate::model::atom::Atom;
use crate::model::note::Note;
use crate::repo::atom_list::{delete_at, insert_at};
use crate::repo::graph_repo::{GraphError, GraphRepository};
use crate::search::fts::FullTextIndex;
use crate::semantics::adjacency::AdjacencyStyle;
use crate::semantics::filter::Filter;
use crate::semantics::lcs::{edit_script, Edit};
use crate::semantics::view::materialize;
use crate::semantics::{NotesError, NotesResult};
use log::{debug, info};
use serde::Serialize;

/// Structural work done by one [`reconcile`] call, summed over the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Cells inserted into child lists.
    pub inserted: usize,
    /// Cells removed from child lists.
    pub deleted: usize,
    /// Atoms created to back inserted notes.
    pub created: usize,
}

/// Applies `desired` onto `root` down to `depth` levels of children.
///
/// Notes inserted without an id get the id of their new atom written back,
/// so the caller's tree mirrors the store afterwards.
///
/// # Errors
/// - `InvalidUpdate` when `root` is `None`, or when children are supplied
///   for an atom the filter hides.
/// - `Graph` for store failures and structural corruption; the caller is
///   expected to roll back its transaction.
#[allow(clippy::too_many_arguments)]
pub fn reconcile<G, F>(
    graph: &G,
    index: &dyn FullTextIndex,
    root: Option<&Atom>,
    parent: Option<&Atom>,
    desired: &mut Note,
    depth: i32,
    filter: &F,
    style: AdjacencyStyle,
    log: Option<&mut dyn ActivityLog>,
) -> NotesResult<ReconcileStats>
where
    G: GraphRepository + ?Sized,
    F: Filter + ?Sized,
{
    let root = root.ok_or_else(|| NotesError::InvalidUpdate("null update root".to_string()))?;

    let mut reconciler = Reconciler {
        graph,
        index,
        filter,
        style,
        log,
        stats: ReconcileStats::default(),
    };
    reconciler.reconcile_atom(root, parent, desired, depth)?;

    let stats = reconciler.stats;
    info!(
        "event=notes_update module=semantics status=ok root_id={} depth={depth} style={style} inserted={} deleted={} created={}",
        root.id, stats.inserted, stats.deleted, stats.created
    );
    Ok(stats)
}

struct Reconciler<'a, 'l, G: ?Sized, F: ?Sized> {
    graph: &'a G,
    index: &'a dyn FullTextIndex,
    filter: &'a F,
    style: AdjacencyStyle,
    log: Option<&'l mut dyn ActivityLog>,
    stats: ReconcileStats,
}

impl<G, F> Reconciler<'_, '_, G, F>
where
    G: GraphRepository + ?Sized,
    F: Filter + ?Sized,
{
    fn reconcile_atom(
        &mut self,
        root: &Atom,
        parent: Option<&Atom>,
        desired: &mut Note,
        depth: i32,
    ) -> NotesResult<()> {
        let root = self.sync_properties(root, desired)?;
        if depth <= 0 {
            return Ok(());
        }
        if !self.filter.is_visible(&root) {
            if desired.children.is_empty() {
                return Ok(());
            }
            return Err(NotesError::InvalidUpdate(format!(
                "children supplied for hidden atom {}",
                root.id
            )));
        }

        debug!(
            "event=notes_update_level module=semantics root_id={} parent_id={} depth={depth} style={}",
            root.id,
            parent.map_or("-", |p| p.id.as_str()),
            self.style
        );

        let before = materialize(
            self.graph,
            Some(&root),
            None,
            1,
            self.filter,
            AdjacencyStyle::Forward,
        )?
        .children;
        let script = edit_script(&before, &desired.children, Note::same_position);

        let mut inserted = vec![false; desired.children.len()];
        for edit in script {
            match edit {
                Edit::Delete { position, .. } => {
                    let child_id = delete_at(self.graph, &root.id, position)?;
                    if let Some(log) = self.log.as_deref_mut() {
                        log.log_unlink(&root, &child_id);
                    }
                    self.stats.deleted += 1;
                }
                Edit::Insert { position, index } => {
                    let note = &mut desired.children[index];
                    let child = self.resolve_or_create(note)?;
                    insert_at(self.graph, &root.id, position, &child.id)?;
                    if note.id.is_none() {
                        note.id = Some(child.id.clone());
                    }
                    inserted[index] = true;
                    if let Some(log) = self.log.as_deref_mut() {
                        log.log_link(&root, &child);
                    }
                    self.stats.inserted += 1;
                }
            }
        }

        for (note, fresh) in desired.children.iter_mut().zip(inserted) {
            let child = self.require_backing_atom(note)?;
            let child_depth = if fresh { 0 } else { depth - 1 };
            self.reconcile_atom(&child, Some(&root), note, child_depth)?;
        }

        Ok(())
    }

    /// Copies set desired properties onto the atom; returns the stored atom.
    fn sync_properties(&mut self, root: &Atom, desired: &Note) -> NotesResult<Atom> {
        let mut atom = self
            .graph
            .get_atom(&root.id)?
            .ok_or_else(|| GraphError::AtomNotFound(root.id.clone()))?;

        let mut value_changed = false;
        if let Some(value) = desired.value.as_deref() {
            if atom.value.as_deref() != Some(value) {
                atom.value = Some(value.to_string());
                value_changed = true;
            }
        }

        let mut properties_changed = false;
        if let Some(alias) = desired.alias.as_deref() {
            if atom.alias.as_deref() != Some(alias) {
                atom.alias = Some(alias.to_string());
                properties_changed = true;
            }
        }
        if desired.weight.is_some() && atom.weight != desired.weight {
            atom.weight = desired.weight;
            properties_changed = true;
        }
        if desired.sharability.is_some() && atom.sharability != desired.sharability {
            atom.sharability = desired.sharability;
            properties_changed = true;
        }

        if value_changed || properties_changed {
            self.graph.update_atom(&atom)?;
        }
        if value_changed {
            if let Some(log) = self.log.as_deref_mut() {
                log.log_update(&atom);
            }
            if let Some(value) = atom.value.as_deref() {
                self.index.index_for_search(&atom, value);
            }
        }
        if properties_changed {
            if let Some(log) = self.log.as_deref_mut() {
                log.log_set_properties(&atom);
            }
        }

        Ok(atom)
    }

    fn resolve_or_create(&mut self, note: &Note) -> NotesResult<Atom> {
        let existing = match note.id.as_deref() {
            Some(id) => self.graph.get_atom(id)?,
            None => None,
        };
        if let Some(atom) = existing {
            return Ok(atom);
        }

        let atom = self
            .graph
            .create_atom(note.id.as_deref(), &self.filter.defaults())?;
        if let Some(log) = self.log.as_deref_mut() {
            log.log_create(&atom);
        }
        self.stats.created += 1;
        Ok(atom)
    }

    fn require_backing_atom(&self, note: &Note) -> NotesResult<Atom> {
        let id = note.id.as_deref().ok_or_else(|| {
            NotesError::InvalidUpdate("child note left without an atom id".to_string())
        })?;
        Ok(self
            .graph
            .get_atom(id)?
            .ok_or_else(|| GraphError::AtomNotFound(id.to_string()))?)
    }
}
