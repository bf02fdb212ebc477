use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque item identifier. Ordered byte-wise, which fixes canonical orientation.
pub type ItemId = String;

/// Canonical `(item_a, item_b)` key with `item_a < item_b`.
pub type PairKey = (ItemId, ItemId);

/// A stored pair in canonical orientation.
///
/// `outcome` is `None` while the pair waits for a judgment. Otherwise it is
/// in `[0, 1]`: 0 = `item_a` preferred, 1 = `item_b` preferred, 0.5 = tie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    #[serde(rename = "hash1")]
    pub item_a: ItemId,
    #[serde(rename = "hash2")]
    pub item_b: ItemId,
    #[serde(rename = "winner")]
    pub outcome: Option<f64>,
}

impl PairRecord {
    pub fn pending(item_a: impl Into<ItemId>, item_b: impl Into<ItemId>) -> Self {
        PairRecord { item_a: item_a.into(), item_b: item_b.into(), outcome: None }
    }

    pub fn ranked(item_a: impl Into<ItemId>, item_b: impl Into<ItemId>, outcome: f64) -> Self {
        PairRecord { item_a: item_a.into(), item_b: item_b.into(), outcome: Some(outcome) }
    }

    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn is_ranked(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn key(&self) -> PairKey {
        (self.item_a.clone(), self.item_b.clone())
    }
}

/// A pair as the caller submits it, in the caller's orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub item_a: ItemId,
    pub item_b: ItemId,
    pub outcome: Option<f64>,
}

impl Submission {
    pub fn new(item_a: impl Into<ItemId>, item_b: impl Into<ItemId>, outcome: Option<f64>) -> Self {
        Submission { item_a: item_a.into(), item_b: item_b.into(), outcome }
    }

    pub fn pending(item_a: impl Into<ItemId>, item_b: impl Into<ItemId>) -> Self {
        Self::new(item_a, item_b, None)
    }

    pub fn is_self_pair(&self) -> bool {
        self.item_a == self.item_b
    }

    /// Convert to a record in canonical orientation, flipping the outcome if swapped.
    pub fn canonicalize(self) -> PairRecord {
        if self.item_a > self.item_b {
            PairRecord {
                item_a: self.item_b,
                item_b: self.item_a,
                outcome: self.outcome.map(flip_outcome),
            }
        } else {
            PairRecord { item_a: self.item_a, item_b: self.item_b, outcome: self.outcome }
        }
    }
}

impl<A: Into<ItemId>, B: Into<ItemId>> From<(A, B)> for Submission {
    fn from((a, b): (A, B)) -> Self {
        Submission::pending(a, b)
    }
}

impl<A: Into<ItemId>, B: Into<ItemId>> From<(A, B, Option<f64>)> for Submission {
    fn from((a, b, outcome): (A, B, Option<f64>)) -> Self {
        Submission::new(a, b, outcome)
    }
}

/// Express an outcome relative to the opposite orientation of the same pair.
pub fn flip_outcome(outcome: f64) -> f64 {
    1.0 - outcome
}

/// Reject outcomes outside `[0, 1]`, NaN included.
pub fn validate_outcome(outcome: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&outcome) {
        Ok(outcome)
    } else {
        Err(Error::invalid_argument(format!("Winner ({outcome}) must be a float in [0, 1]")))
    }
}

/// Maps item ids to dense 0..N indices so per-item counters can live in a Vec.
pub(crate) struct IdMap<'a> {
    ids: Vec<&'a str>,
    id_to_idx: HashMap<&'a str, usize>,
}

impl<'a> IdMap<'a> {
    pub fn new() -> Self {
        IdMap { ids: Vec::new(), id_to_idx: HashMap::new() }
    }

    /// Index for `id`, assigning the next free one on first sight.
    pub fn intern(&mut self, id: &'a str) -> usize {
        if let Some(&idx) = self.id_to_idx.get(id) {
            return idx;
        }
        let idx = self.ids.len();
        self.ids.push(id);
        self.id_to_idx.insert(id, idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_keeps_sorted_submission() {
        let record = Submission::new("a", "b", Some(0.2)).canonicalize();
        assert_eq!(record, PairRecord::ranked("a", "b", 0.2));
    }

    #[test]
    fn test_canonicalize_swaps_and_flips() {
        let record = Submission::new("b", "a", Some(0.2)).canonicalize();
        assert_eq!(record.item_a, "a");
        assert_eq!(record.item_b, "b");
        assert!((record.outcome.unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_canonicalize_swapped_pending_stays_pending() {
        let record = Submission::pending("z", "y").canonicalize();
        assert_eq!(record, PairRecord::pending("y", "z"));
    }

    #[test]
    fn test_validate_outcome_bounds() {
        assert!(validate_outcome(0.0).is_ok());
        assert!(validate_outcome(0.5).is_ok());
        assert!(validate_outcome(1.0).is_ok());
        assert!(validate_outcome(-0.01).is_err());
        assert!(validate_outcome(1.01).is_err());
        assert!(validate_outcome(f64::NAN).is_err());
    }

    #[test]
    fn test_id_map_interns_once() {
        let mut map = IdMap::new();
        assert_eq!(map.intern("x"), 0);
        assert_eq!(map.intern("y"), 1);
        assert_eq!(map.intern("x"), 0);
        assert_eq!(map.len(), 2);
    }
}
