use std::sync::Arc;
use tracing::instrument;

use crate::application::RagService;
use crate::domain::{
    ports::{ConversationStore, LlmService},
    ChatHistory, DialogTurn, DomainError, Message, SearchResult, SessionKey,
};

const CONTEXT_PLACEHOLDER: &str = "{context}";

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub system: String,
    /// Must contain `{context}`, which is replaced by the retrieved chunks.
    pub context: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            context: context.into(),
        }
    }

    fn system_message(&self, retrieved: &[SearchResult]) -> Message {
        if retrieved.is_empty() {
            return Message::system(self.system.clone());
        }

        let context = retrieved
            .iter()
            .enumerate()
            .map(|(i, r)| format!("[{}] {}", i + 1, r.chunk.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        Message::system(format!(
            "{}\n\n{}",
            self.system,
            self.context.replace(CONTEXT_PLACEHOLDER, &context)
        ))
    }
}

/// Answers questions within a conversation: retrieval, prompt assembly,
/// completion and history bookkeeping.
pub struct QaService {
    rag: Arc<RagService>,
    llm: Arc<dyn LlmService>,
    conversations: Arc<dyn ConversationStore>,
    prompt: PromptTemplate,
}

impl QaService {
    pub fn new(
        rag: Arc<RagService>,
        llm: Arc<dyn LlmService>,
        conversations: Arc<dyn ConversationStore>,
        prompt: PromptTemplate,
    ) -> Self {
        Self {
            rag,
            llm,
            conversations,
            prompt,
        }
    }

    /// Answers each question in order, each one seeing the turns produced
    /// by the previous ones. The conversation store is saved after the batch.
    #[instrument(skip(self, questions), fields(session = %key, count = questions.len()))]
    pub async fn answer(
        &self,
        questions: &[String],
        key: &SessionKey,
    ) -> Result<Vec<String>, DomainError> {
        let mut answers = Vec::with_capacity(questions.len());

        for question in questions {
            let retrieved = self.rag.retrieve(question).await?;
            let history = self.conversations.history(key).await?;
            let messages = self.build_messages(question, &retrieved, &history);

            let answer = self.llm.chat(&messages).await?;
            self.conversations.append_turn(key, question, &answer).await?;
            answers.push(answer);
        }

        self.conversations.save().await?;
        Ok(answers)
    }

    #[instrument(skip(self), fields(session = %key))]
    pub async fn history(&self, key: &SessionKey) -> Result<Vec<DialogTurn>, DomainError> {
        Ok(self.conversations.history(key).await?.turns())
    }

    fn build_messages(
        &self,
        question: &str,
        retrieved: &[SearchResult],
        history: &ChatHistory,
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.messages.len() + 2);
        messages.push(self.prompt.system_message(retrieved));
        messages.extend(history.messages.iter().cloned());
        messages.push(Message::user(question));
        messages
    }
}
