//! Vector clocks for causal ordering of replicated versions.
//!
//! A [`VectorClock`] maps a replica's causality identifier to a counter.
//! A missing identifier reads as zero, and zero counters are never stored,
//! so two clocks are equal exactly when their stored entries are equal.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A multipart timestamp: one monotonically non-decreasing counter per replica.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, u64>", into = "BTreeMap<String, u64>")]
pub struct VectorClock {
    entries: BTreeMap<String, u64>,
}

impl VectorClock {
    /// Create a new empty vector clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a clock from preset counters. Zero counters are dropped.
    #[must_use]
    pub fn preset<I, K>(counters: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        let entries = counters
            .into_iter()
            .filter(|(_, counter)| *counter > 0)
            .map(|(id, counter)| (id.into(), counter))
            .collect();
        Self { entries }
    }

    /// Get the current counter for a replica (zero if absent).
    #[must_use]
    pub fn get(&self, id: &str) -> u64 {
        self.entries.get(id).copied().unwrap_or(0)
    }

    /// Number of replicas with a non-zero counter.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(replica, counter)` pairs in replica order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(id, counter)| (id.as_str(), *counter))
    }

    /// Increment the counter owned by `id`, creating it at 1 if absent.
    pub fn increment(&mut self, id: &str) {
        let entry = self.entries.entry(id.to_string()).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    /// Make this clock causally descended from every clock in `others`.
    ///
    /// The result is the pointwise maximum of `self` and all `others`.
    pub fn combine<'a, I>(&mut self, others: I)
    where
        I: IntoIterator<Item = &'a VectorClock>,
    {
        for other in others {
            for (id, &counter) in &other.entries {
                let entry = self.entries.entry(id.clone()).or_insert(0);
                *entry = (*entry).max(counter);
            }
        }
    }

    /// True iff both clocks hold the same replicas with the same counters.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.entries == other.entries
    }

    /// True iff `self` happened strictly before `other`.
    ///
    /// Not symmetric: classify a pair by asking in both directions.
    #[must_use]
    pub fn less_than(&self, other: &Self) -> bool {
        // A clock that knows more replicas can never be dominated.
        if self.entries.len() > other.entries.len() {
            return false;
        }
        if self.equals(other) {
            return false;
        }
        self.entries
            .iter()
            .all(|(id, &counter)| counter <= other.get(id))
    }

    /// True iff neither clock is equal to nor causally before the other.
    #[must_use]
    pub fn concurrent(&self, other: &Self) -> bool {
        !(self.equals(other) || self.less_than(other) || other.less_than(self))
    }

    /// Classify the causal relationship between two clocks.
    ///
    /// Returns:
    /// - `Less`: this clock happened-before other.
    /// - `Equal`: clocks are equal.
    /// - `Greater`: other clock happened-before this.
    /// - `None`: concurrent.
    #[must_use]
    pub fn causal_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.equals(other) {
            Some(Ordering::Equal)
        } else if self.less_than(other) {
            Some(Ordering::Less)
        } else if other.less_than(self) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl From<BTreeMap<String, u64>> for VectorClock {
    fn from(counters: BTreeMap<String, u64>) -> Self {
        Self::preset(counters)
    }
}

impl From<VectorClock> for BTreeMap<String, u64> {
    fn from(clock: VectorClock) -> Self {
        clock.entries
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (id, counter)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}:{counter}")?;
        }
        f.write_str("}")
    }
}
