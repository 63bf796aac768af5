//! Bounded, filtered projection of the graph into a `Note` tree.

use crate::model::atom::Atom;
use crate::model::note::Note;
use crate::repo::graph_repo::{GraphRepository, GraphResult};
use crate::semantics::adjacency::AdjacencyStyle;
use crate::semantics::filter::Filter;
use crate::semantics::{NotesError, NotesResult};

/// Materializes `root` and its neighbourhood down to `height` levels.
///
/// A height of 0 yields the root alone; 1 adds its neighbours, and so on.
/// Neighbours the filter hides are still listed, as childless leaves: the
/// filter bounds expansion, not membership. No sorting is applied.
///
/// # Errors
/// - `NullRoot` when `root` is `None`.
pub fn materialize<G, F>(
    graph: &G,
    root: Option<&Atom>,
    parent: Option<&Atom>,
    height: i32,
    filter: &F,
    style: AdjacencyStyle,
) -> NotesResult<Note>
where
    G: GraphRepository + ?Sized,
    F: Filter + ?Sized,
{
    let root = root.ok_or(NotesError::NullRoot)?;
    Ok(materialize_atom(graph, root, parent, height, filter, style)?)
}

fn materialize_atom<G, F>(
    graph: &G,
    root: &Atom,
    parent: Option<&Atom>,
    height: i32,
    filter: &F,
    style: AdjacencyStyle,
) -> GraphResult<Note>
where
    G: GraphRepository + ?Sized,
    F: Filter + ?Sized,
{
    let mut note = Note::from_atom(root);
    if height <= 0 {
        return Ok(note);
    }

    for target in style.linked(graph, root, parent)? {
        let child_height = if filter.is_visible(&target) {
            height - 1
        } else {
            0
        };
        note.children.push(materialize_atom(
            graph,
            &target,
            Some(root),
            child_height,
            filter,
            style,
        )?);
    }

    Ok(note)
}
