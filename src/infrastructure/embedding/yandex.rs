use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::{EmbeddingConfig, YandexCredentials};
use crate::infrastructure::yandex::YandexClient;

const TEXT_EMBEDDING_PATH: &str = "/foundationModels/v1/textEmbedding";

/// YandexGPT text-search embeddings. The API embeds one text per request,
/// so batches are sent sequentially with a pause between calls.
pub struct YandexEmbedding {
    client: YandexClient,
    doc_model_uri: String,
    query_model_uri: String,
    dimension: usize,
    request_interval: Duration,
}

impl YandexEmbedding {
    pub fn new(client: YandexClient, config: &EmbeddingConfig) -> Self {
        Self {
            doc_model_uri: client.model_uri("emb", &config.doc_model),
            query_model_uri: client.model_uri("emb", &config.query_model),
            client,
            dimension: config.dimension,
            request_interval: Duration::from_millis(config.request_interval_ms),
        }
    }

    pub fn from_config(
        config: &EmbeddingConfig,
        credentials: &YandexCredentials,
    ) -> Result<Self, DomainError> {
        let client = YandexClient::new(
            &config.base_url,
            credentials,
            Duration::from_secs(config.timeout_seconds),
        )?;
        Ok(Self::new(client, config))
    }

    async fn embed_with(&self, model_uri: &str, text: &str) -> Result<Embedding, DomainError> {
        let response: TextEmbeddingResponse = self
            .client
            .post(TEXT_EMBEDDING_PATH, &TextEmbeddingRequest { model_uri, text })
            .await?;

        if response.embedding.is_empty() {
            return Err(DomainError::external("empty embedding returned"));
        }
        Ok(Embedding::from(response.embedding))
    }
}

#[async_trait]
impl EmbeddingService for YandexEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_with(&self.query_model_uri, text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            if i > 0 && !self.request_interval.is_zero() {
                tokio::time::sleep(self.request_interval).await;
            }
            embeddings.push(self.embed_with(&self.doc_model_uri, text).await?);
        }

        tracing::debug!(count = embeddings.len(), "embedded document chunks");
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextEmbeddingRequest<'a> {
    model_uri: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TextEmbeddingResponse {
    embedding: Vec<f64>,
}
