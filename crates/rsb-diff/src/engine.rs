//! Signature-keyed multiset difference.
//!
//! Items are matched by a caller-supplied signature string. Duplicates are
//! significant: each baseline occurrence satisfies at most one current
//! occurrence, and vice versa.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Items present on only one side of a comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult<T> {
    /// In `current` with no remaining match in `baseline`.
    pub introduced: Vec<T>,
    /// In `baseline` with no remaining match in `current`.
    pub resolved: Vec<T>,
}

impl<T> Default for DiffResult<T> {
    fn default() -> Self {
        Self {
            introduced: Vec::new(),
            resolved: Vec::new(),
        }
    }
}

impl<T> DiffResult<T> {
    /// Returns `true` if both sides matched completely.
    pub fn is_empty(&self) -> bool {
        self.introduced.is_empty() && self.resolved.is_empty()
    }

    /// Total number of unmatched items.
    pub fn len(&self) -> usize {
        self.introduced.len() + self.resolved.len()
    }

    /// Reorder both lists for display. Membership is unaffected.
    pub fn sorted_by_key<K, F>(mut self, mut key: F) -> Self
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.introduced.sort_by_key(&mut key);
        self.resolved.sort_by_key(&mut key);
        self
    }
}

/// Compute `introduced` and `resolved` between two collections.
///
/// Output order follows input order. Runs in linear time over hashed
/// signatures.
pub fn diff_by<T, F>(current: &[T], baseline: &[T], signature: F) -> DiffResult<T>
where
    T: Clone,
    F: Fn(&T) -> String,
{
    DiffResult {
        introduced: unmatched(current, baseline, &signature),
        resolved: unmatched(baseline, current, &signature),
    }
}

/// Items of `items` left over after consuming one `against` occurrence
/// per match.
fn unmatched<T, F>(items: &[T], against: &[T], signature: &F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> String,
{
    let mut live: HashMap<String, usize> = HashMap::with_capacity(against.len());
    for item in against {
        *live.entry(signature(item)).or_insert(0) += 1;
    }

    let mut out = Vec::new();
    for item in items {
        match live.get_mut(&signature(item)) {
            Some(count) if *count > 0 => *count -= 1,
            _ => out.push(item.clone()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;

    fn ident(s: &&str) -> String {
        s.to_string()
    }

    #[test]
    fn disjoint_and_shared() {
        let result = diff_by(&["a", "b", "c"], &["b", "d"], ident);
        assert_eq!(result.introduced, vec!["a", "c"]);
        assert_eq!(result.resolved, vec!["d"]);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn identical_inputs_are_empty() {
        let result = diff_by(&["x", "y"], &["y", "x"], ident);
        assert!(result.is_empty());
    }

    #[test]
    fn duplicates_are_counted() {
        let result = diff_by(&["a", "a", "a"], &["a"], ident);
        assert_eq!(result.introduced, vec!["a", "a"]);
        assert!(result.resolved.is_empty());

        let result = diff_by(&["a"], &["a", "a"], ident);
        assert!(result.introduced.is_empty());
        assert_eq!(result.resolved, vec!["a"]);
    }

    #[test]
    fn output_follows_input_order() {
        let result = diff_by(&["z", "m", "a"], &[], ident);
        assert_eq!(result.introduced, vec!["z", "m", "a"]);
    }

    #[test]
    fn signature_drives_matching() {
        let current = [("login", 1), ("logout", 2)];
        let baseline = [("login", 9)];
        let result = diff_by(&current, &baseline, |(name, _)| name.to_string());
        assert_eq!(result.introduced, vec![("logout", 2)]);
        assert!(result.resolved.is_empty());
    }

    #[test]
    fn sorting_keeps_membership() {
        let result = diff_by(&["c", "a", "b"], &["z", "y"], ident).sorted_by_key(|s| *s);
        assert_eq!(result.introduced, vec!["a", "b", "c"]);
        assert_eq!(result.resolved, vec!["y", "z"]);
    }

    #[test]
    fn serializes_with_both_lists() {
        let result = diff_by(&["a"], &["b"], ident);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"introduced": ["a"], "resolved": ["b"]}));
    }

    fn small_strings() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-e]", 0..24)
    }

    proptest! {
        #[test]
        fn swapping_sides_swaps_results(a in small_strings(), b in small_strings()) {
            let forward = diff_by(&a, &b, String::clone);
            let backward = diff_by(&b, &a, String::clone);
            prop_assert_eq!(&forward.introduced, &backward.resolved);
            prop_assert_eq!(&forward.resolved, &backward.introduced);
        }

        #[test]
        fn unique_inputs_match_set_difference(
            a in prop::collection::btree_set("[a-h]{1,3}", 0..16),
            b in prop::collection::btree_set("[a-h]{1,3}", 0..16),
        ) {
            let current: Vec<String> = a.iter().cloned().collect();
            let baseline: Vec<String> = b.iter().cloned().collect();
            let result = diff_by(&current, &baseline, String::clone);

            let introduced: BTreeSet<String> = result.introduced.into_iter().collect();
            let resolved: BTreeSet<String> = result.resolved.into_iter().collect();
            prop_assert_eq!(introduced, a.difference(&b).cloned().collect::<BTreeSet<_>>());
            prop_assert_eq!(resolved, b.difference(&a).cloned().collect::<BTreeSet<_>>());
        }

        #[test]
        fn counts_balance(a in small_strings(), b in small_strings()) {
            let result = diff_by(&a, &b, String::clone);
            let matched = a.len() - result.introduced.len();
            prop_assert_eq!(matched, b.len() - result.resolved.len());
        }
    }
}
