/// Storage backends for the pair record set.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::constants::PAIRS_COLUMNS;
use crate::error::{Error, Result};
use crate::types::PairRecord;

/// Where a `PairsStore` loads its records from and flushes them to.
///
/// `save` receives the full record set in storage order and must replace
/// whatever was stored before.
pub trait PairsPersistence {
    fn load(&self) -> Result<Vec<PairRecord>>;
    fn save(&self, records: &[PairRecord]) -> Result<()>;
}

/// Pairs file with columns `hash1,hash2,winner`; an empty `winner` marks a pending pair.
#[derive(Debug, Clone)]
pub struct CsvPairsFile {
    path: PathBuf,
}

impl CsvPairsFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        CsvPairsFile { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Deserialize)]
struct RawPairRow {
    hash1: String,
    hash2: String,
    #[serde(default)]
    winner: Option<String>,
}

impl PairsPersistence for CsvPairsFile {
    fn load(&self) -> Result<Vec<PairRecord>> {
        let mut reader = match csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(&self.path) {
            Ok(reader) => reader,
            Err(e) if is_missing_file(&e) => return Ok(Vec::new()),
            Err(e) => return Err(Error::csv(&self.path, e)),
        };

        let mut records = Vec::new();
        for row in reader.deserialize::<RawPairRow>() {
            let row = row.map_err(|e| Error::csv(&self.path, e))?;
            let outcome = parse_winner(row.winner.as_deref()).map_err(|message| Error::Malformed {
                path: self.path.clone(),
                line: records.len() as u64 + 2,
                message,
            })?;
            records.push(PairRecord { item_a: row.hash1, item_b: row.hash2, outcome });
        }

        tracing::debug!(path = %self.path.display(), count = records.len(), "Loaded pairs");
        Ok(records)
    }

    fn save(&self, records: &[PairRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        // Written by hand so an empty set still gets its header line.
        writer.write_record(PAIRS_COLUMNS).map_err(|e| Error::csv(&self.path, e))?;
        for record in records {
            let winner = record.outcome.map(|w| w.to_string()).unwrap_or_default();
            writer
                .write_record([record.item_a.as_str(), record.item_b.as_str(), winner.as_str()])
                .map_err(|e| Error::csv(&self.path, e))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::io(&self.path, e.into_error()))?;
        atomic_write(&self.path, &bytes)
    }
}

/// Nullable float. Empty, `NaN` and `None` all mean "not judged yet".
fn parse_winner(raw: Option<&str>) -> std::result::Result<Option<f64>, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };
    if raw.eq_ignore_ascii_case("nan") || raw == "None" {
        return Ok(None);
    }
    let value: f64 = raw.parse().map_err(|_| format!("winner \"{raw}\" is not a number"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("winner {value} is outside [0, 1]"));
    }
    Ok(Some(value))
}

/// In-memory backend. Clones share the same buffer, so a test can keep one
/// handle and inspect what the store flushed through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryPairs {
    records: Arc<Mutex<Vec<PairRecord>>>,
}

impl MemoryPairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<PairRecord>) -> Self {
        MemoryPairs { records: Arc::new(Mutex::new(records)) }
    }

    /// Snapshot of the last flushed record set.
    pub fn snapshot(&self) -> Vec<PairRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl PairsPersistence for MemoryPairs {
    fn load(&self) -> Result<Vec<PairRecord>> {
        Ok(self.snapshot())
    }

    fn save(&self, records: &[PairRecord]) -> Result<()> {
        let mut guard = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = records.to_vec();
        Ok(())
    }
}

pub(crate) fn is_missing_file(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound)
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("pairs");
    let tmp = path.with_file_name(format!(".{}.tmp.{}", name, std::process::id()));

    let mut file = fs::File::create(&tmp).map_err(|e| Error::io(&tmp, e))?;
    file.write_all(bytes).map_err(|e| Error::io(&tmp, e))?;
    file.sync_all().map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_winner_empty_and_sentinels() {
        assert_eq!(parse_winner(None), Ok(None));
        assert_eq!(parse_winner(Some("")), Ok(None));
        assert_eq!(parse_winner(Some("  ")), Ok(None));
        assert_eq!(parse_winner(Some("NaN")), Ok(None));
        assert_eq!(parse_winner(Some("None")), Ok(None));
    }

    #[test]
    fn test_parse_winner_values() {
        assert_eq!(parse_winner(Some("0.0")), Ok(Some(0.0)));
        assert_eq!(parse_winner(Some("1")), Ok(Some(1.0)));
        assert_eq!(parse_winner(Some("0.25")), Ok(Some(0.25)));
        assert!(parse_winner(Some("left")).is_err());
        assert!(parse_winner(Some("1.5")).is_err());
    }

    #[test]
    fn test_memory_pairs_clones_share_buffer() {
        let backend = MemoryPairs::new();
        let handle = backend.clone();
        backend.save(&[PairRecord::pending("a", "b")]).unwrap();
        assert_eq!(handle.snapshot(), vec![PairRecord::pending("a", "b")]);
        assert_eq!(handle.load().unwrap().len(), 1);
    }
}
