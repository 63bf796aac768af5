//! Presentation order for unordered result sets.
//!
//! Applied to search hits, query hits and the root listing only; views of a
//! persisted list keep list order.

use crate::model::note::Note;
use std::cmp::Ordering;

/// Orders by `weight` descending, then `created` descending (newer first).
///
/// Notes without a weight or creation time sort after those that have one.
pub fn compare_ranked(a: &Note, b: &Note) -> Ordering {
    compare_weight(b.weight, a.weight).then_with(|| b.created.cmp(&a.created))
}

/// Sorts notes in place by [`compare_ranked`]. The sort is stable.
pub fn rank_notes(notes: &mut [Note]) {
    notes.sort_by(compare_ranked);
}

fn compare_weight(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::rank_notes;
    use crate::model::note::Note;

    fn note(id: &str, weight: Option<f32>, created: Option<i64>) -> Note {
        Note {
            weight,
            created,
            ..Note::with_id(id)
        }
    }

    #[test]
    fn heavier_first_then_newer_first() {
        let mut notes = vec![
            note("t1", Some(0.2), Some(1)),
            note("t2", Some(0.9), Some(2)),
            note("t3", Some(0.9), Some(3)),
        ];
        rank_notes(&mut notes);
        let ids: Vec<_> = notes.iter().map(|n| n.id.as_deref().unwrap()).collect();
        assert_eq!(ids, ["t3", "t2", "t1"]);
    }

    #[test]
    fn unweighted_notes_sort_last() {
        let mut notes = vec![note("none", None, Some(9)), note("low", Some(0.0), Some(1))];
        rank_notes(&mut notes);
        assert_eq!(notes[0].id.as_deref(), Some("low"));
    }
}
