//! Cons cell of an atom's ordered child list.

use crate::model::atom::{AtomId, CellId};
use serde::{Deserialize, Serialize};

/// One arena row of an ordered child list.
///
/// `first` is mandatory: a cell without an atom is unrepresentable.
/// `rest == None` marks the end of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomListCell {
    pub id: CellId,
    pub first: AtomId,
    pub rest: Option<CellId>,
}
