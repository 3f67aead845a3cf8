use crate::domain::{errors::DomainError, Message};
use async_trait::async_trait;

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn chat(&self, messages: &[Message]) -> Result<String, DomainError>;
}
