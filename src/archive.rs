use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::logging::log_archive_write;
use crate::submission::SubmissionRecord;

const ENTRY_PREFIX: &str = "checklist_";

/// Append-only history of submissions, keyed by `checklist_<epoch ms>`.
///
/// The whole archive is written as one JSON object on every append.
/// Keys share a digit count, so key order is creation order.
#[derive(Debug, Clone, Default)]
pub struct LocalArchive {
    path: Option<PathBuf>,
    entries: BTreeMap<String, SubmissionRecord>,
    last_entry_ms: u64,
}

impl LocalArchive {
    /// Archive that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Empty archive that persists to `path`; any existing file is overwritten
    /// on the first append.
    pub fn fresh(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()), ..Self::default() }
    }

    /// Reads `path` back if it exists, otherwise starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::fresh(path));
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading archive {}", path.display()))?;
        let entries: BTreeMap<String, SubmissionRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing archive {}", path.display()))?;
        let last_entry_ms = entries.keys().filter_map(|k| entry_ms(k)).max().unwrap_or(0);
        Ok(Self { path: Some(path), entries, last_entry_ms })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stores the record under a fresh entry id derived from `now_ms` and
    /// returns that id. Ids are strictly increasing.
    pub fn append(&mut self, record: SubmissionRecord, now_ms: u64) -> String {
        let ms = now_ms.max(self.last_entry_ms + 1);
        self.last_entry_ms = ms;
        let id = format!("{}{}", ENTRY_PREFIX, ms);
        self.entries.insert(id.clone(), record);
        id
    }

    /// Writes the whole archive. Returns the SHA-256 of the written blob,
    /// or `None` for an in-memory archive.
    pub fn persist(&self) -> Result<Option<String>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let blob = serde_json::to_vec(&self.entries).context("serializing archive")?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &blob).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;

        let digest = hex::encode(Sha256::digest(&blob));
        log_archive_write(&path.to_string_lossy(), self.entries.len(), blob.len(), &digest);
        Ok(Some(digest))
    }

    pub fn get(&self, entry_id: &str) -> Option<&SubmissionRecord> {
        self.entries.get(entry_id)
    }

    /// Entries in creation order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SubmissionRecord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn records(&self) -> Vec<&SubmissionRecord> {
        self.entries.values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn entry_ms(id: &str) -> Option<u64> {
    id.strip_prefix(ENTRY_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kart::KartId;
    use chrono::Utc;

    fn record(id: &str) -> SubmissionRecord {
        SubmissionRecord {
            submission_id: id.to_string(),
            date: "19/10/2026".to_string(),
            center_label: "Gent 2025".to_string(),
            created_at: Utc::now(),
            flagged_karts: vec![KartId::new(1, 36).unwrap()],
            problems_by_kart: BTreeMap::new(),
            general_note: None,
            inspector: "User".to_string(),
        }
    }

    #[test]
    fn test_same_millisecond_appends_do_not_collide() {
        let mut archive = LocalArchive::in_memory();
        let a = archive.append(record("a"), 1_700_000_000_000);
        let b = archive.append(record("b"), 1_700_000_000_000);
        assert_ne!(a, b);
        assert_eq!(archive.len(), 2);
        assert_eq!(b, "checklist_1700000000001");
    }

    #[test]
    fn test_in_memory_persist_is_noop() {
        let mut archive = LocalArchive::in_memory();
        archive.append(record("a"), 1);
        assert_eq!(archive.persist().unwrap(), None);
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.json");
        let mut archive = LocalArchive::fresh(&path);
        let id = archive.append(record("SUB_1_abc"), 1_700_000_000_000);
        let digest = archive.persist().unwrap().unwrap();
        assert_eq!(digest.len(), 64);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[&id]["submissionId"], "SUB_1_abc");

        let mut reloaded = LocalArchive::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&id).unwrap().submission_id, "SUB_1_abc");
        let next = reloaded.append(record("SUB_2_def"), 5);
        assert!(next > id);
    }

    #[test]
    fn test_load_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let archive = LocalArchive::load(dir.path().join("none.json")).unwrap();
        assert!(archive.is_empty());
    }
}
