use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{ports::ConversationStore, ChatHistory, DomainError, SessionKey};

/// Conversation histories held in memory and written out as one JSON
/// snapshot. Every save rewrites the whole file.
pub struct FileConversationStore {
    path: Option<PathBuf>,
    sessions: Mutex<HashMap<SessionKey, ChatHistory>>,
}

#[derive(Serialize, Deserialize)]
struct SessionRecord {
    #[serde(flatten)]
    key: SessionKey,
    history: ChatHistory,
}

impl FileConversationStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the snapshot at `path` if it exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();

        let sessions = if tokio::fs::try_exists(&path).await? {
            let raw = tokio::fs::read(&path).await?;
            let records: Vec<SessionRecord> = serde_json::from_slice(&raw)?;
            tracing::info!(path = %path.display(), sessions = records.len(), "dialog history loaded");
            records.into_iter().map(|r| (r.key, r.history)).collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: Some(path),
            sessions: Mutex::new(sessions),
        })
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn history(&self, key: &SessionKey) -> Result<ChatHistory, DomainError> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.entry(key.clone()).or_default().clone())
    }

    async fn append_turn(
        &self,
        key: &SessionKey,
        question: &str,
        answer: &str,
    ) -> Result<(), DomainError> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(key.clone())
            .or_default()
            .add_turn(question, answer);
        Ok(())
    }

    async fn save(&self) -> Result<(), DomainError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = {
            let sessions = self.sessions.lock().await;
            let mut records: Vec<SessionRecord> = sessions
                .iter()
                .map(|(key, history)| SessionRecord {
                    key: key.clone(),
                    history: history.clone(),
                })
                .collect();
            records.sort_by(|a, b| {
                (&a.key.user_id, &a.key.conversation_id)
                    .cmp(&(&b.key.user_id, &b.key.conversation_id))
            });
            serde_json::to_vec_pretty(&records)?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        tracing::info!(path = %path.display(), "dialog history saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_key_is_created_empty() {
        let store = FileConversationStore::in_memory();
        let key = SessionKey::new("alice", "c1");

        assert!(store.history(&key).await.unwrap().is_empty());
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_turns_accumulate_per_key() {
        let store = FileConversationStore::in_memory();
        let a = SessionKey::new("alice", "c1");
        let b = SessionKey::new("alice", "c2");

        store.append_turn(&a, "q1", "a1").await.unwrap();
        store.append_turn(&a, "q2", "a2").await.unwrap();

        assert_eq!(store.history(&a).await.unwrap().turns().len(), 2);
        assert!(store.history(&b).await.unwrap().turns().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("dialogs.json");

        let store = FileConversationStore::open(&path).await.unwrap();
        store
            .append_turn(&SessionKey::new("bob", "x"), "hi", "hello")
            .await
            .unwrap();
        store
            .append_turn(&SessionKey::new("carol", "x"), "ping", "pong")
            .await
            .unwrap();
        store.save().await.unwrap();

        let reopened = FileConversationStore::open(&path).await.unwrap();
        let turns = reopened
            .history(&SessionKey::new("bob", "x"))
            .await
            .unwrap()
            .turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].answer, "hello");
        assert_eq!(reopened.session_count().await, 2);
    }
}
