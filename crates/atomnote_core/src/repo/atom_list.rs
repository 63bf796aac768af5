//! Ordered child lists as cons chains over the cell arena.
//!
//! # Responsibility
//! - Walk an atom's `notes` chain into an ordered sequence.
//! - Splice cells in and out at a position without re-linking the rest.
//!
//! # Invariants
//! - The chain reachable from `notes` via `rest` is finite and acyclic; a
//!   revisited cell aborts with `CorruptList`.
//! - A new cell is linked before the operation that created it returns.
//! - A removed cell is unlinked from `rest`, its predecessor and its owner
//!   before deletion. The atom it held is never deleted here.

use crate::model::atom::Atom;
use crate::model::cell::AtomListCell;
use crate::repo::graph_repo::{GraphError, GraphRepository, GraphResult};
use log::debug;
use std::collections::HashSet;

/// Walks the chain owned by `owner` and returns its cells in order.
///
/// # Errors
/// - `CorruptList` when a cell is revisited or a `rest` pointer dangles.
pub fn chain_cells<G>(graph: &G, owner: &Atom) -> GraphResult<Vec<AtomListCell>>
where
    G: GraphRepository + ?Sized,
{
    let mut cells = Vec::new();
    let mut visited = HashSet::new();
    let mut cursor = owner.notes.clone();

    while let Some(cell_id) = cursor {
        if !visited.insert(cell_id.clone()) {
            return Err(GraphError::CorruptList {
                owner: owner.id.clone(),
                cell: cell_id,
            });
        }
        let cell = graph
            .get_cell(&cell_id)?
            .ok_or_else(|| GraphError::CorruptList {
                owner: owner.id.clone(),
                cell: cell_id.clone(),
            })?;
        cursor = cell.rest.clone();
        cells.push(cell);
    }

    Ok(cells)
}

/// Returns the atoms held by `owner`'s chain, in list order.
pub fn to_sequence<G>(graph: &G, owner: &Atom) -> GraphResult<Vec<Atom>>
where
    G: GraphRepository + ?Sized,
{
    chain_cells(graph, owner)?
        .into_iter()
        .map(|cell| {
            graph
                .get_atom(&cell.first)?
                .ok_or_else(|| GraphError::InvalidData(format!(
                    "cell `{}` holds missing atom `{}`",
                    cell.id, cell.first
                )))
        })
        .collect()
}

/// Inserts `child_id` at `position` in the list owned by `owner_id`.
///
/// `position == len` appends.
///
/// # Errors
/// - `IndexOutOfRange` when `position > len`.
/// - `AtomNotFound` when the owner or the child does not exist.
pub fn insert_at<G>(
    graph: &G,
    owner_id: &str,
    position: usize,
    child_id: &str,
) -> GraphResult<AtomListCell>
where
    G: GraphRepository + ?Sized,
{
    let owner = require_atom(graph, owner_id)?;
    let cells = chain_cells(graph, &owner)?;
    if position > cells.len() {
        return Err(GraphError::IndexOutOfRange {
            position,
            len: cells.len(),
        });
    }

    let mut cell = graph.create_cell(child_id)?;
    // Link the new cell into its slot before it takes over the successor, so
    // no two cells ever share a `rest`.
    let successor = if position == 0 {
        graph.set_notes(owner_id, Some(&cell.id))?;
        owner.notes.clone()
    } else {
        let prev = &cells[position - 1];
        graph.set_rest(&prev.id, Some(&cell.id))?;
        prev.rest.clone()
    };
    if let Some(next) = successor.as_deref() {
        graph.set_rest(&cell.id, Some(next))?;
    }
    cell.rest = successor;

    debug!(
        "event=list_insert module=list status=ok owner_id={owner_id} position={position} len={}",
        cells.len() + 1
    );
    Ok(cell)
}

/// Removes the cell at `position` from the list owned by `owner_id`.
///
/// Returns the id of the atom the removed cell held.
///
/// # Errors
/// - `IndexOutOfRange` when the list is shorter than `position + 1`.
pub fn delete_at<G>(graph: &G, owner_id: &str, position: usize) -> GraphResult<String>
where
    G: GraphRepository + ?Sized,
{
    let owner = require_atom(graph, owner_id)?;
    let cells = chain_cells(graph, &owner)?;
    let Some(target) = cells.get(position) else {
        return Err(GraphError::IndexOutOfRange {
            position,
            len: cells.len(),
        });
    };

    if target.rest.is_some() {
        graph.set_rest(&target.id, None)?;
    }
    if position == 0 {
        graph.set_notes(owner_id, target.rest.as_deref())?;
    } else {
        graph.set_rest(&cells[position - 1].id, target.rest.as_deref())?;
    }
    graph.remove_cell(&target.id)?;

    debug!(
        "event=list_delete module=list status=ok owner_id={owner_id} position={position} len={}",
        cells.len() - 1
    );
    Ok(target.first.clone())
}

/// Returns the number of cells in the list owned by `owner`.
pub fn len<G>(graph: &G, owner: &Atom) -> GraphResult<usize>
where
    G: GraphRepository + ?Sized,
{
    Ok(chain_cells(graph, owner)?.len())
}

fn require_atom<G>(graph: &G, id: &str) -> GraphResult<Atom>
where
    G: GraphRepository + ?Sized,
{
    graph
        .get_atom(id)?
        .ok_or_else(|| GraphError::AtomNotFound(id.to_string()))
}
