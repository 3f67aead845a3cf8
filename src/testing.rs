//! Deterministic stand-ins for the remote embedding and chat APIs.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{
    ports::{EmbeddingService, LlmService},
    DomainError, Embedding, Message, MessageRole,
};
use crate::infrastructure::YandexCredentials;

pub const DIMENSION: usize = 256;

/// Bag-of-words embedding: each lowercase word bumps one FNV-hashed bucket.
pub struct KeywordEmbedding;

impl KeywordEmbedding {
    fn vectorize(text: &str) -> Embedding {
        let mut vec = vec![0.0f32; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in word.to_lowercase().bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            vec[(hash % DIMENSION as u64) as usize] += 1.0;
        }
        Embedding::new(vec)
    }
}

#[async_trait]
impl EmbeddingService for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Ok(Self::vectorize(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

/// Answers `answer: <question>` and remembers every prompt it was sent.
#[derive(Default)]
pub struct RecordingLlm {
    calls: Mutex<Vec<Vec<Message>>>,
}

impl RecordingLlm {
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for RecordingLlm {
    async fn chat(&self, messages: &[Message]) -> Result<String, DomainError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let question = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!("answer: {question}"))
    }
}

pub struct FailingLlm;

#[async_trait]
impl LlmService for FailingLlm {
    async fn chat(&self, _messages: &[Message]) -> Result<String, DomainError> {
        Err(DomainError::external("completion endpoint unreachable"))
    }
}

pub fn yandex_credentials() -> YandexCredentials {
    YandexCredentials {
        iam_token: None,
        api_key: Some("test-key".into()),
        folder_id: "b1gtest".into(),
    }
}

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.ok() });
    format!("http://{addr}")
}
