//! Visibility filters.
//!
//! A filter bounds how far a view or update may expand; it never decides
//! whether a neighbour is listed at all.

use crate::model::atom::Atom;
use crate::repo::graph_repo::AtomDefaults;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Visibility predicate over atoms.
///
/// Implementations hold no per-call state.
pub trait Filter {
    /// Returns whether `atom` may be expanded into.
    fn is_visible(&self, atom: &Atom) -> bool;

    /// Property defaults for atoms created under this filter.
    fn defaults(&self) -> AtomDefaults {
        AtomDefaults::default()
    }
}

/// Filter under which every atom is visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoFilter;

impl Filter for NoFilter {
    fn is_visible(&self, _atom: &Atom) -> bool {
        true
    }
}

/// Invalid bounds passed to [`RangeFilter::try_new`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterError {
    pub field: &'static str,
    pub min: f32,
    pub default: f32,
    pub max: f32,
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} bounds must satisfy 0 <= min ({}) <= default ({}) <= max ({}) <= 1",
            self.field, self.min, self.default, self.max
        )
    }
}

impl Error for FilterError {}

/// Inclusive sharability/weight window.
///
/// Unset atom properties fall back to the defaults before the range check,
/// and the defaults seed atoms created through this filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter {
    min_sharability: f32,
    max_sharability: f32,
    default_sharability: f32,
    min_weight: f32,
    max_weight: f32,
    default_weight: f32,
}

impl RangeFilter {
    /// Builds a filter after checking `0 <= min <= default <= max <= 1` for
    /// both dimensions.
    pub fn try_new(
        (min_sharability, default_sharability, max_sharability): (f32, f32, f32),
        (min_weight, default_weight, max_weight): (f32, f32, f32),
    ) -> Result<Self, FilterError> {
        check_bounds("sharability", min_sharability, default_sharability, max_sharability)?;
        check_bounds("weight", min_weight, default_weight, max_weight)?;
        Ok(Self {
            min_sharability,
            max_sharability,
            default_sharability,
            min_weight,
            max_weight,
            default_weight,
        })
    }
}

impl Filter for RangeFilter {
    fn is_visible(&self, atom: &Atom) -> bool {
        let sharability = atom.sharability.unwrap_or(self.default_sharability);
        let weight = atom.weight.unwrap_or(self.default_weight);
        (self.min_sharability..=self.max_sharability).contains(&sharability)
            && (self.min_weight..=self.max_weight).contains(&weight)
    }

    fn defaults(&self) -> AtomDefaults {
        AtomDefaults {
            weight: Some(self.default_weight),
            sharability: Some(self.default_sharability),
        }
    }
}

fn check_bounds(field: &'static str, min: f32, default: f32, max: f32) -> Result<(), FilterError> {
    let ordered = 0.0 <= min && min <= default && default <= max && max <= 1.0;
    if ordered {
        Ok(())
    } else {
        Err(FilterError {
            field,
            min,
            default,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Filter, NoFilter, RangeFilter};
    use crate::model::atom::Atom;

    fn atom_with(sharability: Option<f32>, weight: Option<f32>) -> Atom {
        let mut atom = Atom::new("a", 0);
        atom.sharability = sharability;
        atom.weight = weight;
        atom
    }

    #[test]
    fn no_filter_shows_everything() {
        assert!(NoFilter.is_visible(&atom_with(Some(0.0), Some(0.0))));
    }

    #[test]
    fn range_filter_checks_both_dimensions() {
        let filter = RangeFilter::try_new((0.5, 0.5, 1.0), (0.0, 0.5, 1.0)).unwrap();
        assert!(filter.is_visible(&atom_with(Some(0.75), Some(0.1))));
        assert!(!filter.is_visible(&atom_with(Some(0.25), Some(0.1))));
        assert!(filter.is_visible(&atom_with(None, None)));
    }

    #[test]
    fn range_filter_rejects_default_outside_window() {
        let err = RangeFilter::try_new((0.5, 0.25, 1.0), (0.0, 0.5, 1.0)).unwrap_err();
        assert_eq!(err.field, "sharability");
    }

    #[test]
    fn range_filter_defaults_seed_new_atoms() {
        let filter = RangeFilter::try_new((0.0, 0.5, 1.0), (0.0, 0.75, 1.0)).unwrap();
        let defaults = filter.defaults();
        assert_eq!(defaults.sharability, Some(0.5));
        assert_eq!(defaults.weight, Some(0.75));
    }
}
