mod conversation;
mod document;
mod embedding;

pub use conversation::{ChatHistory, DialogTurn, Message, MessageRole, SessionKey};
pub use document::{chunk_document, Document, DocumentChunk, SearchResult};
pub use embedding::Embedding;
