mod conversation_store;
mod embedding;
mod llm;
mod vector_store;

pub use conversation_store::ConversationStore;
pub use embedding::EmbeddingService;
pub use llm::LlmService;
pub use vector_store::VectorStore;
