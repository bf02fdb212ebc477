/// Training view: ranked pairs resolved to output files for the reward model.
use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::items::ItemStore;
use crate::persistence::PairsPersistence;
use crate::store::PairsStore;
use crate::types::ItemId;

/// One training example. `outcome` follows the pair convention:
/// 0 = `output_a` preferred, 1 = `output_b` preferred, 0.5 = tie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingTriplet {
    pub output_a: PathBuf,
    pub output_b: PathBuf,
    pub outcome: f64,
}

/// Snapshot of every ranked pair at build time. Iterating does not consume
/// it, so a trainer can walk it once per epoch.
#[derive(Debug, Clone, Default)]
pub struct TrainingView {
    triplets: Vec<TrainingTriplet>,
    item_ids: BTreeSet<ItemId>,
}

impl TrainingView {
    pub fn build<P, S>(pairs: &PairsStore<P>, items: &S) -> Result<Self>
    where
        P: PairsPersistence,
        S: ItemStore + ?Sized,
    {
        let ranked = pairs.all_ranked();
        let mut triplets = Vec::with_capacity(ranked.len());
        let mut item_ids = BTreeSet::new();

        for record in ranked {
            let Some(outcome) = record.outcome else { continue };
            let output_a = items.resolve_output_path(&record.item_a)?;
            let output_b = items.resolve_output_path(&record.item_b)?;
            triplets.push(TrainingTriplet { output_a, output_b, outcome });
            item_ids.insert(record.item_a);
            item_ids.insert(record.item_b);
        }

        tracing::debug!(triplets = triplets.len(), items = item_ids.len(), "Built training view");
        Ok(TrainingView { triplets, item_ids })
    }

    pub fn len(&self) -> usize {
        self.triplets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triplets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrainingTriplet> {
        self.triplets.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrainingTriplet> {
        self.triplets.iter()
    }

    /// Distinct item ids referenced by the ranked pairs.
    pub fn item_ids(&self) -> &BTreeSet<ItemId> {
        &self.item_ids
    }

    pub fn item_count(&self) -> usize {
        self.item_ids.len()
    }
}

impl<'a> IntoIterator for &'a TrainingView {
    type Item = &'a TrainingTriplet;
    type IntoIter = std::slice::Iter<'a, TrainingTriplet>;

    fn into_iter(self) -> Self::IntoIter {
        self.triplets.iter()
    }
}
