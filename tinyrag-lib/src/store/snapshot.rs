//! On-disk snapshot format
//!
//! A single JSON document:
//!
//! ```text
//! {
//!   "version": 1,
//!   "dimension": 384,
//!   "records": [
//!     {"id": 0, "vector": [...], "chunk_text": "...", "document_id": "...",
//!      "sequence_index": 0, "start_offset": 0}
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::store::memory::Record;
use crate::{Error, Result};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    version: u32,
    dimension: Option<usize>,
    records: Vec<SnapshotRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    id: u64,
    vector: Vec<f32>,
    chunk_text: String,
    document_id: String,
    sequence_index: usize,
    start_offset: usize,
}

/// Validated snapshot contents, ready to replace a store's state.
pub(crate) struct Restored {
    pub dimension: Option<usize>,
    pub records: Vec<Record>,
    pub next_id: u64,
}

impl Snapshot {
    pub fn capture(dimension: Option<usize>, records: &[Record]) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            dimension,
            records: records
                .iter()
                .map(|r| SnapshotRecord {
                    id: r.id,
                    vector: r.vector.clone(),
                    chunk_text: r.chunk.text.clone(),
                    document_id: r.chunk.document_id.clone(),
                    sequence_index: r.chunk.sequence_index,
                    start_offset: r.chunk.start_offset,
                })
                .collect(),
        }
    }

    /// Write to `path` through a sibling temp file so readers never see a
    /// half-written snapshot.
    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec(self).map_err(|e| Error::Store(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| Error::CorruptStore(e.to_string()))
    }

    /// Check the snapshot is internally consistent and convert it to records.
    pub fn restore(self) -> Result<Restored> {
        if self.version != SNAPSHOT_VERSION {
            return Err(Error::CorruptStore(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }

        let dimension = match self.dimension {
            Some(0) => return Err(Error::CorruptStore("dimension is zero".to_string())),
            None if !self.records.is_empty() => {
                return Err(Error::CorruptStore(
                    "records present but no dimension recorded".to_string(),
                ))
            }
            dimension => dimension,
        };

        let mut seen = HashSet::with_capacity(self.records.len());
        let mut records = Vec::with_capacity(self.records.len());
        for r in self.records {
            if Some(r.vector.len()) != dimension {
                return Err(Error::CorruptStore(format!(
                    "record {} has {} components, expected {}",
                    r.id,
                    r.vector.len(),
                    dimension.unwrap_or_default()
                )));
            }
            if r.vector.iter().any(|x| !x.is_finite()) {
                return Err(Error::CorruptStore(format!(
                    "record {} has non-finite components",
                    r.id
                )));
            }
            if !seen.insert(r.id) {
                return Err(Error::CorruptStore(format!("duplicate record id {}", r.id)));
            }

            records.push(Record {
                id: r.id,
                vector: r.vector,
                chunk: Chunk {
                    text: r.chunk_text,
                    start_offset: r.start_offset,
                    document_id: r.document_id,
                    sequence_index: r.sequence_index,
                },
            });
        }

        let next_id = records.iter().map(|r| r.id + 1).max().unwrap_or(0);
        Ok(Restored {
            dimension,
            records,
            next_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, vector: Vec<f32>) -> Record {
        Record {
            id,
            vector,
            chunk: Chunk {
                text: format!("chunk {id}"),
                start_offset: 0,
                document_id: "doc".to_string(),
                sequence_index: id as usize,
            },
        }
    }

    #[test]
    fn test_restore_continues_ids() {
        let snapshot = Snapshot::capture(Some(2), &[record(3, vec![1.0, 0.0]), record(7, vec![0.0, 1.0])]);
        let restored = snapshot.restore().unwrap();

        assert_eq!(restored.dimension, Some(2));
        assert_eq!(restored.records.len(), 2);
        assert_eq!(restored.next_id, 8);
    }

    #[test]
    fn test_empty_snapshot_restores() {
        let restored = Snapshot::capture(None, &[]).restore().unwrap();
        assert_eq!(restored.dimension, None);
        assert!(restored.records.is_empty());
        assert_eq!(restored.next_id, 0);
    }

    #[test]
    fn test_wrong_record_dimension_is_corrupt() {
        let snapshot = Snapshot::capture(Some(3), &[record(0, vec![1.0, 0.0])]);
        assert!(matches!(snapshot.restore(), Err(Error::CorruptStore(_))));
    }

    #[test]
    fn test_missing_dimension_is_corrupt() {
        let snapshot = Snapshot::capture(None, &[record(0, vec![1.0])]);
        assert!(matches!(snapshot.restore(), Err(Error::CorruptStore(_))));
    }

    #[test]
    fn test_duplicate_ids_are_corrupt() {
        let snapshot = Snapshot::capture(Some(1), &[record(4, vec![1.0]), record(4, vec![0.5])]);
        assert!(matches!(snapshot.restore(), Err(Error::CorruptStore(_))));
    }

    #[test]
    fn test_unknown_version_is_corrupt() {
        let json = r#"{"version": 9, "dimension": null, "records": []}"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert!(matches!(snapshot.restore(), Err(Error::CorruptStore(_))));
    }

    #[test]
    fn test_garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json at all").unwrap();

        assert!(matches!(Snapshot::read(&path), Err(Error::CorruptStore(_))));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        Snapshot::capture(Some(2), &[record(0, vec![0.25, -1.5])]).write(&path).unwrap();
        let restored = Snapshot::read(&path).unwrap().restore().unwrap();

        assert_eq!(restored.records[0].vector, vec![0.25, -1.5]);
        assert_eq!(restored.records[0].chunk.text, "chunk 0");
    }
}
