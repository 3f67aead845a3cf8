use crate::domain::{errors::DomainError, DocumentChunk, Embedding, SearchResult};
use async_trait::async_trait;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Appends a batch. Either every entry is stored or none is.
    async fn add(&self, entries: &[(DocumentChunk, Embedding)]) -> Result<(), DomainError>;
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
    /// Flushes the index to durable storage.
    async fn persist(&self) -> Result<(), DomainError>;
}
