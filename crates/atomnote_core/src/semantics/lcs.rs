//! Longest common subsequence and the edit script derived from it.
//!
//! Equality is caller supplied and need not be reflexive: note positions
//! without an id never match, not even themselves.

/// One structural edit against a list being mutated left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Remove the element at `position`; it was `before[index]`.
    Delete { position: usize, index: usize },
    /// Insert `after[index]` at `position`.
    Insert { position: usize, index: usize },
}

/// Returns index pairs `(i, j)` of a longest common subsequence, with
/// `before[i]` matching `after[j]`, in increasing order.
pub fn longest_common_subsequence<T, F>(before: &[T], after: &[T], eq: F) -> Vec<(usize, usize)>
where
    F: Fn(&T, &T) -> bool,
{
    let (n, m) = (before.len(), after.len());
    // lengths[i][j] = LCS length of before[i..] and after[j..]
    let mut lengths = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i][j] = if eq(&before[i], &after[j]) {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(lengths[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if eq(&before[i], &after[j]) && lengths[i][j] == lengths[i + 1][j + 1] + 1 {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

/// Builds the minimal edit script turning `before` into `after`.
///
/// Positions refer to the list as already mutated by every earlier edit, so
/// the script must be applied in order. Within each gap between kept
/// elements, deletions precede insertions.
pub fn edit_script<T, F>(before: &[T], after: &[T], eq: F) -> Vec<Edit>
where
    F: Fn(&T, &T) -> bool,
{
    let kept = longest_common_subsequence(before, after, eq);
    let sentinel = (before.len(), after.len());
    let mut edits = Vec::new();
    let (mut i, mut j, mut position) = (0, 0, 0);

    for (bi, aj) in kept.into_iter().chain(std::iter::once(sentinel)) {
        edits.extend((i..bi).map(|index| Edit::Delete { position, index }));
        edits.extend((j..aj).enumerate().map(|(offset, index)| Edit::Insert {
            position: position + offset,
            index,
        }));
        // Skip past the inserted run and the kept element.
        position += aj - j + 1;
        i = bi + 1;
        j = aj + 1;
    }

    edits
}
