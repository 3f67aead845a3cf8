use async_trait::async_trait;

use crate::domain::{errors::DomainError, ChatHistory, SessionKey};

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns the history for `key`, creating an empty one if absent.
    async fn history(&self, key: &SessionKey) -> Result<ChatHistory, DomainError>;
    async fn append_turn(
        &self,
        key: &SessionKey,
        question: &str,
        answer: &str,
    ) -> Result<(), DomainError>;
    /// Writes the whole store to its backing snapshot.
    async fn save(&self) -> Result<(), DomainError>;
}
