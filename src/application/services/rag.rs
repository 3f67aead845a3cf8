use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DocumentChunk, DomainError, Embedding, SearchResult,
};

pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            default_top_k,
        }
    }

    #[instrument(skip(self))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, DomainError> {
        self.retrieve_top_k(query, self.default_top_k).await
    }

    #[instrument(skip(self))]
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        if top_k == 0 || self.vector_store.count().await? == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedding.embed(query).await?;
        self.vector_store.search(&embedding, top_k).await
    }

    /// Embeds and stores chunks; the index is not persisted.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn index_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(DomainError::external(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let entries: Vec<(DocumentChunk, Embedding)> =
            chunks.iter().cloned().zip(embeddings).collect();
        self.vector_store.add(&entries).await
    }

    pub async fn persist(&self) -> Result<(), DomainError> {
        self.vector_store.persist().await
    }

    pub async fn indexed_chunks(&self) -> Result<usize, DomainError> {
        self.vector_store.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Document;
    use crate::infrastructure::LocalVectorStore;
    use crate::testing::{KeywordEmbedding, DIMENSION};

    fn service() -> RagService {
        RagService::new(
            Arc::new(KeywordEmbedding),
            Arc::new(LocalVectorStore::in_memory(DIMENSION)),
            5,
        )
    }

    #[tokio::test]
    async fn test_retrieve_from_empty_index() {
        assert!(service().retrieve("anything").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_most_similar_chunk_ranks_first() {
        let rag = service();
        let doc = Document::new("zoo.txt", "zoo.txt");
        let chunks = vec![
            DocumentChunk::new(&doc, "penguins live in antarctica", 0),
            DocumentChunk::new(&doc, "camels live in the desert", 1),
        ];
        rag.index_chunks(&chunks).await.unwrap();

        let results = rag.retrieve("where do penguins live").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "penguins live in antarctica");
    }
}
