use std::sync::Arc;

use crate::application::{DocumentService, PromptTemplate, QaService, RagService};
use crate::domain::{
    ports::{EmbeddingService, LlmService},
    DomainError, TextSplitter,
};
use crate::infrastructure::{AppConfig, FileConversationStore, LocalVectorStore, ProcessMonitor};

#[derive(Clone)]
pub struct AppState {
    pub document_service: Arc<DocumentService>,
    pub qa_service: Arc<QaService>,
    pub monitor: Arc<ProcessMonitor>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Opens the persisted index and dialog history from the configured
    /// storage paths. Without a saved index, the documents directory is
    /// indexed from scratch and the result saved.
    pub async fn initialize(
        config: AppConfig,
        embedding: Arc<dyn EmbeddingService>,
        llm: Arc<dyn LlmService>,
    ) -> Result<Self, DomainError> {
        let config = Arc::new(config);
        let storage = &config.config.storage;
        let rag_config = &config.config.rag;

        let had_index = LocalVectorStore::exists(&storage.index_dir);
        let vector_store =
            Arc::new(LocalVectorStore::open(&storage.index_dir, embedding.dimension()).await?);
        let rag = Arc::new(RagService::new(embedding, vector_store, rag_config.top_k));

        let splitter = TextSplitter::new(rag_config.chunk_size, rag_config.chunk_overlap)?;
        let document_service = Arc::new(DocumentService::new(
            rag.clone(),
            splitter,
            &storage.docs_dir,
        ));

        if !had_index {
            tracing::info!(dir = %storage.docs_dir.display(), "no saved index, building from documents directory");
            document_service.index_directory().await?;
        }

        let conversations = Arc::new(FileConversationStore::open(&storage.history_file).await?);
        let prompts = &config.prompts.assistant;
        let qa_service = Arc::new(QaService::new(
            rag,
            llm,
            conversations,
            PromptTemplate::new(&prompts.system, &prompts.context),
        ));

        Ok(Self {
            document_service,
            qa_service,
            monitor: Arc::new(ProcessMonitor::new()?),
            config,
        })
    }
}
