//! Merging of version sets.
//!
//! [`reconcile`] collapses two antichains of versions into the minimal
//! antichain covering both, and reports how much of the incoming side was
//! new. Callers treat a zero count as "nothing happened": a Put is rejected
//! as stale and a replication or gossip push leaves the store untouched.

use crate::entry::{ObjectEntry, VersionSet};

/// Outcome of a [`reconcile`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// The merged, pairwise-concurrent version set.
    pub versions: VersionSet,
    /// Number of entries from the incoming side that survived the merge.
    pub new_count: usize,
}

impl Reconciled {
    /// True if the incoming side contributed at least one version.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.new_count > 0
    }
}

/// Merge `incoming` into `existing`.
///
/// An existing entry survives unless an incoming entry strictly dominates it.
/// An incoming entry survives unless an existing entry dominates or equals it.
/// An exact duplicate is therefore kept from `existing` and never counted.
/// Existing survivors come first, in their original order, followed by the
/// incoming survivors.
#[must_use]
pub fn reconcile(existing: &[ObjectEntry], incoming: &[ObjectEntry]) -> Reconciled {
    let mut versions: VersionSet = existing
        .iter()
        .filter(|e| !incoming.iter().any(|i| e.clock().less_than(i.clock())))
        .cloned()
        .collect();

    let before = versions.len();
    versions.extend(
        incoming
            .iter()
            .filter(|i| {
                !existing
                    .iter()
                    .any(|e| i.clock().less_than(e.clock()) || i.clock().equals(e.clock()))
            })
            .cloned(),
    );
    let new_count = versions.len() - before;

    Reconciled {
        versions,
        new_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VectorClock;
    use crate::entry::Context;
    use proptest::prelude::*;

    fn entry(pairs: &[(&str, u64)], value: &str) -> ObjectEntry {
        ObjectEntry::new(
            Context::new(VectorClock::preset(pairs.iter().map(|(id, c)| (*id, *c)))),
            value,
        )
    }

    #[test]
    fn test_collapse_mixed_lists() {
        let o1 = entry(&[("x", 2), ("y", 2)], "o1");
        let o2 = entry(&[("x", 2), ("y", 1), ("z", 1)], "o2");
        let o3 = entry(&[("x", 1), ("y", 1), ("z", 1)], "o3");
        let o4 = entry(&[("x", 3), ("y", 3)], "o4");

        let merged = reconcile(&[o1, o2.clone()], &[o3, o4.clone()]);
        assert_eq!(merged.versions, vec![o2, o4]);
        assert_eq!(merged.new_count, 1);
    }

    #[test]
    fn test_self_merge_adds_nothing() {
        let set = vec![entry(&[("a", 1)], "a"), entry(&[("b", 1)], "b")];
        let merged = reconcile(&set, &set);
        assert_eq!(merged.versions, set);
        assert_eq!(merged.new_count, 0);
        assert!(!merged.changed());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let a = vec![entry(&[("a", 2)], "a2"), entry(&[("b", 1)], "b1")];
        let b = vec![entry(&[("a", 3)], "a3"), entry(&[("c", 1)], "c1")];
        let once = reconcile(&a, &b);
        let twice = reconcile(&once.versions, &b);
        assert_eq!(twice.new_count, 0);
        assert_eq!(twice.versions, once.versions);
    }

    #[test]
    fn test_empty_existing_accepts_everything() {
        let incoming = vec![entry(&[("a", 1)], "v")];
        let merged = reconcile(&[], &incoming);
        assert_eq!(merged.versions, incoming);
        assert_eq!(merged.new_count, 1);
    }

    #[test]
    fn test_dominated_incoming_is_dropped() {
        let existing = vec![entry(&[("a", 2)], "new")];
        let merged = reconcile(&existing, &[entry(&[("a", 1)], "old")]);
        assert_eq!(merged.versions, existing);
        assert_eq!(merged.new_count, 0);
    }

    #[test]
    fn test_duplicate_survives_from_existing_side() {
        // Same clock, different payloads: existing wins the slot.
        let existing = vec![entry(&[("a", 1)], "mine")];
        let merged = reconcile(&existing, &[entry(&[("a", 1)], "theirs")]);
        assert_eq!(merged.versions, existing);
        assert_eq!(merged.new_count, 0);
    }

    #[test]
    fn test_concurrent_versions_are_both_kept() {
        let a = entry(&[("a", 1)], "a");
        let b = entry(&[("b", 1)], "b");
        let merged = reconcile(&[a.clone()], &[b.clone()]);
        assert_eq!(merged.versions, vec![a, b]);
        assert_eq!(merged.new_count, 1);
    }

    #[test]
    fn test_result_is_an_antichain() {
        let existing = vec![entry(&[("a", 1), ("b", 2)], "1"), entry(&[("c", 4)], "2")];
        let incoming = vec![entry(&[("a", 2), ("b", 2)], "3"), entry(&[("c", 1)], "4")];
        let merged = reconcile(&existing, &incoming);
        for (i, x) in merged.versions.iter().enumerate() {
            for (j, y) in merged.versions.iter().enumerate() {
                if i != j {
                    assert!(x.clock().concurrent(y.clock()), "{x} vs {y}");
                }
            }
        }
        assert_eq!(merged.versions.len(), 2);
    }

    fn assert_antichain(versions: &[ObjectEntry]) {
        for (i, x) in versions.iter().enumerate() {
            for y in &versions[i + 1..] {
                assert!(x.clock().concurrent(y.clock()), "{x} vs {y}");
            }
        }
    }

    /// Version sets as a store holds them: built one write at a time, so
    /// always pairwise concurrent.
    fn arb_version_set() -> impl Strategy<Value = VersionSet> {
        let clock = prop::collection::btree_map("[a-c]", 0u64..4, 0..4).prop_map(VectorClock::from);
        prop::collection::vec((clock, "[a-z]{1,3}"), 0..6).prop_map(|writes| {
            writes.into_iter().fold(Vec::new(), |set, (clock, value)| {
                reconcile(&set, &[ObjectEntry::new(Context::new(clock), value)]).versions
            })
        })
    }

    proptest! {
        #[test]
        fn prop_self_merge_is_identity(set in arb_version_set()) {
            let merged = reconcile(&set, &set);
            prop_assert_eq!(merged.new_count, 0);
            prop_assert_eq!(merged.versions, set);
        }

        #[test]
        fn prop_merge_is_idempotent(a in arb_version_set(), b in arb_version_set()) {
            let once = reconcile(&a, &b);
            let twice = reconcile(&once.versions, &b);
            prop_assert_eq!(twice.new_count, 0);
            prop_assert_eq!(twice.versions, once.versions);
        }

        #[test]
        fn prop_merge_yields_antichain(a in arb_version_set(), b in arb_version_set()) {
            let merged = reconcile(&a, &b);
            assert_antichain(&merged.versions);
            prop_assert!(merged.new_count <= b.len());
            prop_assert_eq!(merged.versions.len() - merged.new_count, {
                a.iter()
                    .filter(|e| !b.iter().any(|i| e.clock().less_than(i.clock())))
                    .count()
            });
        }

        #[test]
        fn prop_merge_keeps_every_maximal_clock(a in arb_version_set(), b in arb_version_set()) {
            let merged = reconcile(&a, &b);
            for entry in a.iter().chain(&b) {
                prop_assert!(
                    merged.versions.iter().any(|m| {
                        m.clock().equals(entry.clock()) || entry.clock().less_than(m.clock())
                    }),
                    "{} was lost",
                    entry
                );
            }
        }
    }
}
