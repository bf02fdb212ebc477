/// Item store: maps an item id to the parameter, output and video files of
/// the simulation it names.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DATASET_COLUMNS;
use crate::error::{Error, Result};
use crate::persistence::{atomic_write, is_missing_file};
use crate::types::ItemId;

/// Lookup the training view needs from whatever holds the items.
pub trait ItemStore {
    /// Path of the serialized output for `id`; `Error::NotFound` if unknown.
    fn resolve_output_path(&self, id: &str) -> Result<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEntry {
    #[serde(rename = "hash")]
    pub id: ItemId,
    pub param_path: PathBuf,
    pub output_path: PathBuf,
    pub video_path: PathBuf,
}

impl ItemEntry {
    pub fn new(
        id: impl Into<ItemId>,
        param_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        video_path: impl Into<PathBuf>,
    ) -> Self {
        ItemEntry {
            id: id.into(),
            param_path: param_path.into(),
            output_path: output_path.into(),
            video_path: video_path.into(),
        }
    }
}

/// Dataset file with columns `hash,param_path,output_path,video_path`.
///
/// One row per item; re-adding an id replaces its paths in place.
pub struct CsvItemStore {
    path: PathBuf,
    entries: Vec<ItemEntry>,
}

impl CsvItemStore {
    /// Load the dataset file, creating a header-only one if it is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(&path) {
            Ok(mut reader) => reader
                .deserialize::<ItemEntry>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::csv(&path, e))?,
            Err(e) if is_missing_file(&e) => Vec::new(),
            Err(e) => return Err(Error::csv(&path, e)),
        };
        let store = CsvItemStore { path, entries };
        store.save()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[ItemEntry] {
        &self.entries
    }

    pub fn add_entry(&mut self, entry: ItemEntry) -> Result<()> {
        self.upsert(entry);
        self.save()
    }

    /// Bulk form of `add_entry`; flushes once at the end.
    pub fn add_entries(&mut self, entries: impl IntoIterator<Item = ItemEntry>) -> Result<()> {
        for entry in entries {
            self.upsert(entry);
        }
        self.save()
    }

    pub fn get(&self, id: &str) -> Result<&ItemEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::not_found(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn param_path(&self, id: &str) -> Result<&Path> {
        self.get(id).map(|e| e.param_path.as_path())
    }

    pub fn output_path(&self, id: &str) -> Result<&Path> {
        self.get(id).map(|e| e.output_path.as_path())
    }

    pub fn video_path(&self, id: &str) -> Result<&Path> {
        self.get(id).map(|e| e.video_path.as_path())
    }

    pub fn param_paths<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<&Path>> {
        ids.iter().map(|id| self.param_path(id.as_ref())).collect()
    }

    pub fn output_paths<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<&Path>> {
        ids.iter().map(|id| self.output_path(id.as_ref())).collect()
    }

    pub fn video_paths<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<&Path>> {
        ids.iter().map(|id| self.video_path(id.as_ref())).collect()
    }

    pub fn all_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delete every file the dataset points at, then clear it.
    ///
    /// Files that are already gone are skipped; any other failure aborts the
    /// reset before the dataset itself is touched.
    pub fn reset(&mut self) -> Result<()> {
        let mut removed = 0usize;
        for entry in &self.entries {
            for file in [&entry.param_path, &entry.output_path, &entry.video_path] {
                match fs::remove_file(file) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(Error::io(file, e)),
                }
            }
        }
        tracing::info!(entries = self.entries.len(), removed, "Reset dataset");
        self.entries.clear();
        self.save()
    }

    fn upsert(&mut self, entry: ItemEntry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    fn save(&self) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(DATASET_COLUMNS).map_err(|e| Error::csv(&self.path, e))?;
        for entry in &self.entries {
            let param = entry.param_path.to_string_lossy();
            let output = entry.output_path.to_string_lossy();
            let video = entry.video_path.to_string_lossy();
            writer
                .write_record([entry.id.as_str(), &*param, &*output, &*video])
                .map_err(|e| Error::csv(&self.path, e))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::io(&self.path, e.into_error()))?;
        atomic_write(&self.path, &bytes)
    }
}

impl ItemStore for CsvItemStore {
    fn resolve_output_path(&self, id: &str) -> Result<PathBuf> {
        self.output_path(id).map(Path::to_path_buf)
    }
}
