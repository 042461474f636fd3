//! Logical ↔ display name maps.
//!
//! Backing schemas name fields with stable logical names; users see display
//! names. A [`DisplayNameMap`] is a 1:1 mapping between the two.

use fxl_core::Name;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayNameMap {
    logical_to_display: IndexMap<Name, Name>,
    display_to_logical: FxHashMap<Name, Name>,
}

impl DisplayNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair. Fails without changing the map when either side is
    /// already mapped.
    pub fn insert(&mut self, logical: Name, display: Name) -> bool {
        if self.logical_to_display.contains_key(&logical)
            || self.display_to_logical.contains_key(&display)
        {
            return false;
        }
        self.display_to_logical.insert(display.clone(), logical.clone());
        self.logical_to_display.insert(logical, display);
        true
    }

    pub fn display_of(&self, logical: &str) -> Option<&Name> {
        self.logical_to_display.get(logical)
    }

    pub fn logical_of(&self, display: &str) -> Option<&Name> {
        self.display_to_logical.get(display)
    }

    pub fn len(&self) -> usize {
        self.logical_to_display.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logical_to_display.is_empty()
    }

    /// Pairs in insertion order, as `(logical, display)`.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Name)> {
        self.logical_to_display.iter()
    }

    /// Build a map with unique display names from proposed
    /// `(logical, display)` pairs, in document order.
    ///
    /// Returns `None` when a logical name is invalid or repeated. An empty
    /// display name falls back to the logical name. When a display name is
    /// claimed twice, the second claimant takes it and the first is renamed
    /// to `"<display> (<logical>)"`; from then on the name is settled and
    /// later claimants rename themselves the same way. Renamed forms go
    /// through the same process until every display name is unique.
    pub fn make_unique(pairs: impl IntoIterator<Item = (Name, Name)>) -> Option<Self> {
        let pairs: Vec<(Name, Name)> = pairs.into_iter().collect();

        let mut logicals = FxHashSet::default();
        for (logical, _) in &pairs {
            if !logical.is_valid() || !logicals.insert(logical.clone()) {
                return None;
            }
        }

        let mut assigned: Vec<Name> = vec![Name::empty(); pairs.len()];
        // display name -> (holder index, settled)
        let mut holders: FxHashMap<Name, (usize, bool)> = FxHashMap::default();

        for (index, (logical, display)) in pairs.iter().enumerate() {
            let first = if display.is_empty() {
                logical.clone()
            } else {
                display.clone()
            };

            let mut pending = vec![(index, first)];
            while let Some((claimant, candidate)) = pending.pop() {
                match holders.get(&candidate).copied() {
                    None => {
                        holders.insert(candidate.clone(), (claimant, false));
                        assigned[claimant] = candidate;
                    }
                    Some((holder, false)) => {
                        holders.insert(candidate.clone(), (claimant, true));
                        assigned[claimant] = candidate.clone();
                        pending.push((holder, disambiguate(&candidate, &pairs[holder].0)));
                    }
                    Some((_, true)) => {
                        let renamed = disambiguate(&candidate, &pairs[claimant].0);
                        pending.push((claimant, renamed));
                    }
                }
            }
        }

        let mut map = DisplayNameMap::new();
        for ((logical, _), display) in pairs.into_iter().zip(assigned) {
            if !map.insert(logical, display) {
                return None;
            }
        }
        Some(map)
    }
}

fn disambiguate(display: &Name, logical: &Name) -> Name {
    Name::new(format!("{} ({})", display, logical))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(Name, Name)> {
        items
            .iter()
            .map(|(l, d)| (Name::new(l), Name::new(d)))
            .collect()
    }

    fn display(map: &DisplayNameMap, logical: &str) -> String {
        map.display_of(logical).map(|n| n.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_three_way_collision() {
        let map = DisplayNameMap::make_unique(pairs(&[("a", "d"), ("b", "d"), ("c", "d")])).unwrap();
        assert_eq!(display(&map, "a"), "d (a)");
        assert_eq!(display(&map, "b"), "d");
        assert_eq!(display(&map, "c"), "d (c)");
    }

    #[test]
    fn test_two_way_collision() {
        let map = DisplayNameMap::make_unique(pairs(&[("a", "d"), ("b", "d")])).unwrap();
        assert_eq!(display(&map, "a"), "d (a)");
        assert_eq!(display(&map, "b"), "d");
    }

    #[test]
    fn test_duplicate_logical_names_fail() {
        assert!(DisplayNameMap::make_unique(pairs(&[("a", "x"), ("a", "y"), ("a", "z")])).is_none());
        assert!(DisplayNameMap::make_unique(pairs(&[("a", "a"), ("a", "a"), ("a", "a")])).is_none());
        assert!(DisplayNameMap::make_unique(pairs(&[("a", ""), ("a", "")])).is_none());
    }

    #[test]
    fn test_invalid_logical_name_fails() {
        assert!(DisplayNameMap::make_unique(pairs(&[("", "x")])).is_none());
        assert!(DisplayNameMap::make_unique(pairs(&[("  ", "x")])).is_none());
    }

    #[test]
    fn test_empty_display_falls_back_to_logical() {
        let map = DisplayNameMap::make_unique(pairs(&[("price", ""), ("qty", "Quantity")])).unwrap();
        assert_eq!(display(&map, "price"), "price");
        assert_eq!(display(&map, "qty"), "Quantity");
        assert_eq!(map.logical_of("Quantity").map(Name::as_str), Some("qty"));
    }

    #[test]
    fn test_renamed_form_collides_again() {
        // "d (a)" is already claimed when `a` is bumped off "d".
        let map = DisplayNameMap::make_unique(pairs(&[
            ("a", "d"),
            ("x", "d (a)"),
            ("b", "d"),
        ]))
        .unwrap();
        assert_eq!(display(&map, "b"), "d");
        assert_eq!(display(&map, "a"), "d (a)");
        assert_eq!(display(&map, "x"), "d (a) (x)");

        let mut seen: Vec<_> = map.iter().map(|(_, d)| d.to_string()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_insert_rejects_conflicts() {
        let mut map = DisplayNameMap::new();
        assert!(map.insert(Name::new("a"), Name::new("A")));
        assert!(!map.insert(Name::new("a"), Name::new("B")));
        assert!(!map.insert(Name::new("b"), Name::new("A")));
        assert_eq!(map.len(), 1);
    }
}
