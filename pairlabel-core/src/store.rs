/// Pairs store: the canonical, deduplicated set of judged and pending pairs.
///
/// Every mutation runs to completion and is flushed through the persistence
/// backend before it returns. Storage order matters: pending pairs are kept
/// in balanced labeling order at the front, ranked pairs follow.
use std::collections::HashMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::persistence::{CsvPairsFile, PairsPersistence};
use crate::reorder::reorder_pending;
use crate::types::{flip_outcome, validate_outcome, PairKey, PairRecord, Submission};

pub struct PairsStore<P: PairsPersistence> {
    records: Vec<PairRecord>,
    persistence: P,
    rng: StdRng,
}

impl PairsStore<CsvPairsFile> {
    /// Open (or create) a pairs file at `path`.
    pub fn open_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(CsvPairsFile::new(path))
    }
}

impl<P: PairsPersistence> PairsStore<P> {
    /// Load whatever the backend holds and flush it straight back, so a new
    /// path ends up with a header-only file.
    pub fn open(persistence: P) -> Result<Self> {
        let records = persistence.load()?;
        let store = PairsStore { records, persistence, rng: StdRng::from_os_rng() };
        store.save()?;
        Ok(store)
    }

    /// Use a seeded tie-break generator so labeling order is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// All records in storage order.
    pub fn records(&self) -> &[PairRecord] {
        &self.records
    }

    /// Merge `submissions` into the set, rebalance pending pairs and persist.
    ///
    /// A submission matching an existing record (in either orientation)
    /// overwrites that record's outcome; a pending submission leaves an
    /// existing judgment untouched. Anything else becomes a new record in
    /// canonical orientation; within one batch the last submission for a pair
    /// wins. Self pairs are dropped. An empty batch only rebalances.
    pub fn upsert_pairs(&mut self, submissions: &[Submission]) -> Result<()> {
        for s in submissions {
            if let Some(outcome) = s.outcome {
                validate_outcome(outcome)?;
            }
        }

        let index: HashMap<PairKey, usize> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key(), i))
            .collect();

        let mut updated = 0usize;
        let mut staged: Vec<PairRecord> = Vec::new();
        let mut staged_index: HashMap<PairKey, usize> = HashMap::new();

        for s in submissions {
            let forward = (s.item_a.clone(), s.item_b.clone());
            if let Some(&i) = index.get(&forward) {
                if let Some(v) = s.outcome {
                    self.records[i].outcome = Some(v);
                }
                updated += 1;
                continue;
            }
            let swapped = (s.item_b.clone(), s.item_a.clone());
            if let Some(&i) = index.get(&swapped) {
                if let Some(v) = s.outcome {
                    self.records[i].outcome = Some(flip_outcome(v));
                }
                updated += 1;
                continue;
            }
            if s.is_self_pair() {
                tracing::warn!(item = %s.item_a, "Ignoring self pair");
                continue;
            }

            let record = s.clone().canonicalize();
            match staged_index.get(&record.key()) {
                Some(&pos) => staged[pos] = record,
                None => {
                    staged_index.insert(record.key(), staged.len());
                    staged.push(record);
                }
            }
        }

        tracing::debug!(
            submitted = submissions.len(),
            updated,
            inserted = staged.len(),
            "Merged pair submissions"
        );
        self.records.extend(staged);
        self.rebalance();
        self.save()
    }

    /// Two-list form of `upsert_pairs`. `outcomes`, when given, must line up
    /// one-to-one with `pairs`.
    pub fn upsert_pairs_with_outcomes<A, B>(
        &mut self,
        pairs: &[(A, B)],
        outcomes: Option<&[Option<f64>]>,
    ) -> Result<()>
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        if let Some(outcomes) = outcomes {
            if outcomes.len() != pairs.len() {
                return Err(Error::invalid_argument(format!(
                    "Length of pairs ({}) and winners ({}) must match.",
                    pairs.len(),
                    outcomes.len()
                )));
            }
        }
        let submissions: Vec<Submission> = pairs
            .iter()
            .enumerate()
            .map(|(i, (a, b))| {
                let outcome = outcomes.and_then(|o| o[i]);
                Submission::new(a.as_ref(), b.as_ref(), outcome)
            })
            .collect();
        self.upsert_pairs(&submissions)
    }

    /// Rebalance pending pairs without adding anything.
    pub fn resort(&mut self) -> Result<()> {
        self.upsert_pairs(&[])
    }

    /// Record a judgment for `item_a` vs `item_b`, in the caller's orientation.
    ///
    /// Unknown pairs are inserted through `upsert_pairs`. A known pair keeps
    /// its position, so `last_ranked` still reflects storage order.
    pub fn set_winner(&mut self, item_a: &str, item_b: &str, outcome: f64) -> Result<()> {
        validate_outcome(outcome)?;

        let found = self.records.iter_mut().find(|r| {
            (r.item_a == item_a && r.item_b == item_b) || (r.item_a == item_b && r.item_b == item_a)
        });
        match found {
            Some(record) => {
                record.outcome = Some(if record.item_a == item_a {
                    outcome
                } else {
                    flip_outcome(outcome)
                });
                tracing::debug!(item_a, item_b, outcome, "Set winner");
                self.save()
            }
            None => self.upsert_pairs(&[Submission::new(item_a, item_b, Some(outcome))]),
        }
    }

    /// Outcome for the pair, expressed in the caller's orientation.
    ///
    /// Outer `None`: no such pair. Inner `None`: pair is pending.
    pub fn outcome_of(&self, item_a: &str, item_b: &str) -> Option<Option<f64>> {
        self.records.iter().find_map(|r| {
            if r.item_a == item_a && r.item_b == item_b {
                Some(r.outcome)
            } else if r.item_a == item_b && r.item_b == item_a {
                Some(r.outcome.map(flip_outcome))
            } else {
                None
            }
        })
    }

    pub fn pending_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_pending()).count()
    }

    pub fn ranked_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_ranked()).count()
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    /// First pending pair in storage order.
    pub fn next_pending(&self) -> Option<(&str, &str)> {
        self.records
            .iter()
            .find(|r| r.is_pending())
            .map(|r| (r.item_a.as_str(), r.item_b.as_str()))
    }

    /// Last ranked pair in storage order.
    pub fn last_ranked(&self) -> Option<(&str, &str)> {
        self.records
            .iter()
            .rev()
            .find(|r| r.is_ranked())
            .map(|r| (r.item_a.as_str(), r.item_b.as_str()))
    }

    pub fn all_ranked(&self) -> Vec<PairRecord> {
        self.records.iter().filter(|r| r.is_ranked()).cloned().collect()
    }

    pub fn pending(&self) -> Vec<PairRecord> {
        self.records.iter().filter(|r| r.is_pending()).cloned().collect()
    }

    /// Mark every pair as pending again, keeping the pairs themselves.
    pub fn reset_rankings(&mut self) -> Result<()> {
        for record in &mut self.records {
            record.outcome = None;
        }
        tracing::info!(count = self.records.len(), "Cleared all rankings");
        self.save()
    }

    /// Drop every pair.
    pub fn reset(&mut self) -> Result<()> {
        self.records.clear();
        tracing::info!("Cleared all pairs");
        self.save()
    }

    fn rebalance(&mut self) {
        let records = std::mem::take(&mut self.records);
        self.records = reorder_pending(records, &mut self.rng);
    }

    fn save(&self) -> Result<()> {
        self.persistence.save(&self.records)
    }
}
