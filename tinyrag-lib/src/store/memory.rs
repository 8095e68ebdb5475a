use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::chunk::Chunk;
use crate::embed::Embedding;
use crate::store::snapshot::Snapshot;
use crate::store::{Metric, SearchResult, VectorStore};
use crate::{Error, Result};

/// A stored vector with the chunk it was computed from.
#[derive(Debug, Clone)]
pub(crate) struct Record {
    pub id: u64,
    pub vector: Embedding,
    pub chunk: Chunk,
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<Record>,
    dimension: Option<usize>,
    next_id: u64,
}

/// In-memory vector store with optional JSON snapshots.
///
/// Uses brute-force exact search over every record, which is fine for small
/// datasets (< 10k chunks). Records keep insertion order, which is also the
/// tie-break order for equal scores.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    metric: Metric,
    storage_path: Option<PathBuf>,
    persist_lock: Mutex<()>,
}

impl MemoryStore {
    /// Create a new empty in-memory store using cosine similarity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `metric` to score records.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Persist to and load from `path`.
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Create a store backed by `path`, loading the snapshot if one exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new().with_storage_path(path);
        if store.storage_path.as_deref().is_some_and(Path::exists) {
            store.load()?;
        }
        Ok(store)
    }

    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    #[must_use]
    pub fn storage_path(&self) -> Option<&Path> {
        self.storage_path.as_deref()
    }

    // Writers never leave a batch half-applied, so a poisoned lock still
    // guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_storage_path(&self) -> Result<&Path> {
        self.storage_path.as_deref().ok_or_else(|| {
            Error::InvalidConfiguration("no storage path configured for this store".to_string())
        })
    }
}

/// Heap entry ordered so the worst candidate sits on top of a max-heap.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    position: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.position.cmp(&other.position))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

fn check_finite(vector: &[f32], what: &str) -> Result<()> {
    if vector.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("{what} contains non-finite values")))
    }
}

impl VectorStore for MemoryStore {
    fn insert(&self, chunks: &[Chunk], embeddings: Vec<Embedding>) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::InvalidArgument(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }
        for embedding in &embeddings {
            if embedding.is_empty() {
                return Err(Error::InvalidArgument("embedding has no components".to_string()));
            }
            check_finite(embedding, "embedding")?;
        }

        let mut inner = self.write();

        // validate the whole batch before touching any state
        let expected = inner.dimension.unwrap_or(embeddings[0].len());
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(Error::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        inner.dimension = Some(expected);
        let first_id = inner.next_id;
        inner.records.reserve(chunks.len());
        for (offset, (chunk, vector)) in chunks.iter().zip(embeddings).enumerate() {
            inner.records.push(Record {
                id: first_id + offset as u64,
                vector,
                chunk: chunk.clone(),
            });
        }
        inner.next_id = first_id + chunks.len() as u64;

        debug!(added = chunks.len(), total = inner.records.len(), "inserted batch");
        Ok(chunks.len())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be greater than zero".to_string()));
        }
        check_finite(query, "query vector")?;

        let inner = self.read();
        let Some(dimension) = inner.dimension.filter(|_| !inner.records.is_empty()) else {
            return Ok(Vec::new());
        };
        if query.len() != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }

        let keep = k.min(inner.records.len());
        let mut heap = BinaryHeap::with_capacity(keep + 1);
        for (position, record) in inner.records.iter().enumerate() {
            heap.push(Candidate {
                score: self.metric.score(query, &record.vector),
                position,
            });
            if heap.len() > keep {
                heap.pop();
            }
        }

        let results: Vec<SearchResult> = heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| {
                let record = &inner.records[c.position];
                SearchResult {
                    id: record.id,
                    chunk: record.chunk.clone(),
                    score: c.score,
                }
            })
            .collect();

        debug!(k, scanned = inner.records.len(), returned = results.len(), "search");
        Ok(results)
    }

    fn len(&self) -> usize {
        self.read().records.len()
    }

    fn dimension(&self) -> Option<usize> {
        self.read().dimension
    }

    fn remove_document(&self, document_id: &str) -> Result<usize> {
        let mut inner = self.write();
        let before = inner.records.len();
        inner.records.retain(|r| r.chunk.document_id != document_id);
        let removed = before - inner.records.len();

        debug!(document_id, removed, "removed document");
        Ok(removed)
    }

    fn clear(&self) -> Result<()> {
        self.write().records.clear();
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let path = self.require_storage_path()?;
        let _serial = self.persist_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // holding the read lock keeps writers out until the snapshot is taken
        let snapshot = {
            let inner = self.read();
            Snapshot::capture(inner.dimension, &inner.records)
        };
        snapshot.write(path)?;

        info!(path = %path.display(), "persisted vector store");
        Ok(())
    }

    fn load(&self) -> Result<()> {
        let path = self.require_storage_path()?;
        let restored = Snapshot::read(path)?.restore()?;

        let mut inner = self.write();
        if let (Some(current), Some(loaded)) = (inner.dimension, restored.dimension) {
            if current != loaded {
                return Err(Error::CorruptStore(format!(
                    "snapshot dimension {loaded} does not match store dimension {current}"
                )));
            }
        }

        inner.dimension = inner.dimension.or(restored.dimension);
        inner.next_id = restored.next_id;
        inner.records = restored.records;

        info!(path = %path.display(), records = inner.records.len(), "loaded vector store");
        Ok(())
    }
}
