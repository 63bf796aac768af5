//! Adjacency styles: which relation counts as "children" in a view.

use crate::model::atom::Atom;
use crate::repo::atom_list::to_sequence;
use crate::repo::graph_repo::{GraphError, GraphRepository, GraphResult};
use crate::semantics::{NotesError, NotesResult};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Strategy selecting the neighbour relation walked as children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AdjacencyStyle {
    /// The atom's own `notes` chain, in list order.
    #[default]
    Forward,
    /// Atoms whose `notes` chain contains this atom.
    Backward,
    /// Backward neighbours followed by forward ones, minus the parent.
    Undirected,
}

impl AdjacencyStyle {
    /// Stable wire name of this style.
    pub fn name(self) -> &'static str {
        match self {
            Self::Forward => "directed-forward",
            Self::Backward => "directed-backward",
            Self::Undirected => "undirected",
        }
    }

    /// Resolves a style by its wire name.
    pub fn from_name(name: &str) -> NotesResult<Self> {
        match name {
            "directed-forward" => Ok(Self::Forward),
            "directed-backward" => Ok(Self::Backward),
            "undirected" => Ok(Self::Undirected),
            other => Err(NotesError::UnknownStyle(other.to_string())),
        }
    }

    /// Returns the neighbours of `root` under this style, in natural order.
    ///
    /// `parent` is the atom the walk arrived from, if any; only the
    /// undirected style uses it, to avoid walking straight back.
    pub fn linked<G>(self, graph: &G, root: &Atom, parent: Option<&Atom>) -> GraphResult<Vec<Atom>>
    where
        G: GraphRepository + ?Sized,
    {
        match self {
            Self::Forward => to_sequence(graph, root),
            Self::Backward => owners_of(graph, root),
            Self::Undirected => {
                let mut linked = owners_of(graph, root)?;
                linked.extend(to_sequence(graph, root)?);
                if let Some(parent) = parent {
                    linked.retain(|atom| atom.id != parent.id);
                }
                Ok(linked)
            }
        }
    }
}

impl Display for AdjacencyStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdjacencyStyle {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Atoms whose child list contains `atom`, ordered by `(created, id)`.
///
/// Walks `restOf` back from every cell holding `atom` to its list head and
/// asks who owns that head.
fn owners_of<G>(graph: &G, atom: &Atom) -> GraphResult<Vec<Atom>>
where
    G: GraphRepository + ?Sized,
{
    let mut owners: Vec<Atom> = Vec::new();
    let mut seen = HashSet::new();

    for cell in graph.first_of(&atom.id)? {
        let mut head = cell;
        let mut visited = HashSet::from([head.id.clone()]);
        while let Some(prev) = graph.rest_of(&head.id)? {
            if !visited.insert(prev.id.clone()) {
                return Err(GraphError::CorruptList {
                    owner: atom.id.clone(),
                    cell: prev.id,
                });
            }
            head = prev;
        }

        let owner = graph
            .notes_of(&head.id)?
            .ok_or_else(|| GraphError::CorruptList {
                owner: atom.id.clone(),
                cell: head.id.clone(),
            })?;
        if seen.insert(owner.id.clone()) {
            owners.push(owner);
        }
    }

    owners.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
    Ok(owners)
}
