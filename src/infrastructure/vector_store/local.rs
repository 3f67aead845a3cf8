use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ports::VectorStore, DocumentChunk, DomainError, Embedding, SearchResult};

const INDEX_FILE: &str = "index.json";

/// Flat exact-search index kept in memory and saved as a single JSON file
/// inside its index directory.
pub struct LocalVectorStore {
    dir: Option<PathBuf>,
    dimension: usize,
    entries: RwLock<Vec<IndexEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: DocumentChunk,
    embedding: Embedding,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    dimension: usize,
    entries: &'a [IndexEntry],
}

#[derive(Deserialize)]
struct Snapshot {
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl LocalVectorStore {
    /// Index that is never written to disk.
    pub fn in_memory(dimension: usize) -> Self {
        Self {
            dir: None,
            dimension,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Loads the index saved in `dir`, or starts empty if there is none yet.
    pub async fn open(dir: impl Into<PathBuf>, dimension: usize) -> Result<Self, DomainError> {
        let dir = dir.into();
        let path = dir.join(INDEX_FILE);

        let entries = if tokio::fs::try_exists(&path).await? {
            let raw = tokio::fs::read(&path).await?;
            let snapshot: Snapshot = serde_json::from_slice(&raw)?;
            if snapshot.dimension != dimension {
                return Err(DomainError::validation(format!(
                    "index at {} has dimension {}, expected {}",
                    dir.display(),
                    snapshot.dimension,
                    dimension
                )));
            }
            tracing::info!(path = %path.display(), entries = snapshot.entries.len(), "vector index loaded");
            snapshot.entries
        } else {
            Vec::new()
        };

        Ok(Self {
            dir: Some(dir),
            dimension,
            entries: RwLock::new(entries),
        })
    }

    /// Whether `dir` holds a saved index.
    pub fn exists(dir: &Path) -> bool {
        dir.join(INDEX_FILE).is_file()
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn add(&self, entries: &[(DocumentChunk, Embedding)]) -> Result<(), DomainError> {
        if let Some((_, embedding)) = entries
            .iter()
            .find(|(_, embedding)| embedding.dimension() != self.dimension)
        {
            return Err(DomainError::validation(format!(
                "embedding has dimension {}, index expects {}",
                embedding.dimension(),
                self.dimension
            )));
        }

        let mut store = self
            .entries
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        store.extend(entries.iter().map(|(chunk, embedding)| IndexEntry {
            chunk: chunk.clone(),
            embedding: embedding.clone(),
        }));
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        if query.dimension() != self.dimension {
            return Err(DomainError::validation(format!(
                "query has dimension {}, index expects {}",
                query.dimension(),
                self.dimension
            )));
        }

        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut results: Vec<SearchResult> = store
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: query.cosine_similarity(&entry.embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        Ok(results)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.entries
            .read()
            .map(|store| store.len())
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    async fn persist(&self) -> Result<(), DomainError> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };

        let bytes = {
            let store = self
                .entries
                .read()
                .map_err(|e| DomainError::internal(e.to_string()))?;
            serde_json::to_vec(&SnapshotRef {
                dimension: self.dimension,
                entries: &store,
            })?
        };

        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(dir.join(INDEX_FILE), bytes).await?;
        tracing::info!(dir = %dir.display(), "vector index saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Document;

    fn chunk(text: &str) -> DocumentChunk {
        DocumentChunk::new(&Document::new("doc.txt", "doc.txt"), text, 0)
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = LocalVectorStore::in_memory(3);

        store
            .add(&[
                (chunk("far"), Embedding::new(vec![0.0, 1.0, 0.0])),
                (chunk("near"), Embedding::new(vec![1.0, 0.1, 0.0])),
                (chunk("exact"), Embedding::new(vec![1.0, 0.0, 0.0])),
            ])
            .await
            .unwrap();

        let results = store
            .search(&Embedding::new(vec![1.0, 0.0, 0.0]), 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "exact");
        assert_eq!(results[1].chunk.content, "near");
        assert!((results[0].score - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_batch_with_wrong_dimension_is_rejected_whole() {
        let store = LocalVectorStore::in_memory(3);

        let err = store
            .add(&[
                (chunk("ok"), Embedding::new(vec![1.0, 0.0, 0.0])),
                (chunk("short"), Embedding::new(vec![1.0, 0.0])),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.count().await.unwrap(), 0);

        let err = store
            .search(&Embedding::new(vec![1.0]), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_same_chunk_added_twice_is_kept_twice() {
        let store = LocalVectorStore::in_memory(2);
        let repeated = chunk("again");
        let embedding = Embedding::new(vec![1.0, 0.0]);

        store
            .add(&[(repeated.clone(), embedding.clone())])
            .await
            .unwrap();
        store.add(&[(repeated, embedding)]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("index");

        assert!(!LocalVectorStore::exists(&index_dir));
        let store = LocalVectorStore::open(&index_dir, 2).await.unwrap();
        store
            .add(&[(chunk("persisted"), Embedding::new(vec![0.6, 0.8]))])
            .await
            .unwrap();
        store.persist().await.unwrap();
        assert!(LocalVectorStore::exists(&index_dir));

        let reopened = LocalVectorStore::open(&index_dir, 2).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let results = reopened
            .search(&Embedding::new(vec![0.6, 0.8]), 5)
            .await
            .unwrap();
        assert_eq!(results[0].chunk.content, "persisted");

        assert!(LocalVectorStore::open(&index_dir, 3).await.is_err());
    }
}
