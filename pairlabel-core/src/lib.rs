/// pairlabel-core: pairwise judgment store for preference-model training.
///
/// Pairs of items → canonical deduplicated records → balanced labeling order.
/// Each record holds an optional outcome in `[0, 1]` (0 = first item wins,
/// 1 = second item wins, 0.5 = tie), always relative to the pair's canonical
/// orientation (`item_a < item_b`).
///
/// Items are identified by caller-provided string IDs (typically hashes).
///
/// # Quick start
///
/// ```rust
/// use pairlabel_core::{MemoryPairs, PairsStore, Submission};
///
/// let mut store = PairsStore::open(MemoryPairs::new()).unwrap().with_seed(7);
///
/// store.upsert_pairs(&[
///     Submission::pending("b", "a"),           // stored as ("a", "b")
///     Submission::new("a", "c", Some(0.0)),    // "a" preferred over "c"
/// ]).unwrap();
///
/// assert_eq!(store.pending_count(), 1);
/// assert_eq!(store.next_pending(), Some(("a", "b")));
///
/// store.set_winner("b", "a", 1.0).unwrap();    // "a" preferred, caller's orientation
/// assert_eq!(store.outcome_of("a", "b"), Some(Some(0.0)));
/// ```

pub mod constants;
pub mod error;
pub mod items;
pub mod persistence;
pub mod reorder;
pub mod store;
pub mod training;
pub mod types;

// Re-export primary public API at crate root.
pub use error::{Error, Result};
pub use items::{CsvItemStore, ItemEntry, ItemStore};
pub use persistence::{CsvPairsFile, MemoryPairs, PairsPersistence};
pub use reorder::{exposure_counts, reorder_pending};
pub use store::PairsStore;
pub use training::{TrainingTriplet, TrainingView};
pub use types::{flip_outcome, validate_outcome, ItemId, PairKey, PairRecord, Submission};
