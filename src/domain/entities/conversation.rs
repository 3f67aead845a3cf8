use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one dialog: a user may hold several independent conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user_id: String,
    pub conversation_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.conversation_id)
    }
}

/// Ordered message log of a single session. Only ever appended to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatHistory {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
        self.updated_at = Utc::now();
    }

    pub fn add_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.add_message(MessageRole::User, question);
        self.add_message(MessageRole::Assistant, answer);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Pairs each user message with the assistant reply that follows it.
    ///
    /// A trailing question without an answer is dropped.
    pub fn turns(&self) -> Vec<DialogTurn> {
        let mut turns = Vec::with_capacity(self.messages.len() / 2);
        let mut pending: Option<&str> = None;

        for message in &self.messages {
            match message.role {
                MessageRole::User => pending = Some(message.content.as_str()),
                MessageRole::Assistant => {
                    if let Some(question) = pending.take() {
                        turns.push(DialogTurn {
                            question: question.to_string(),
                            answer: message.content.clone(),
                        });
                    }
                }
                MessageRole::System => {}
            }
        }

        turns
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogTurn {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}
