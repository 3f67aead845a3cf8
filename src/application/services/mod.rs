mod document;
mod qa;
mod rag;

pub use document::{DocumentService, IngestReport};
pub use qa::{PromptTemplate, QaService};
pub use rag::RagService;
