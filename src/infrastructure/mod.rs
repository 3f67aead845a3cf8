pub mod config;
pub mod embedding;
pub mod history;
pub mod llm;
pub mod system;
pub mod vector_store;
pub mod yandex;

pub use config::{AppConfig, Config, PromptsConfig, YandexCredentials};
pub use embedding::YandexEmbedding;
pub use history::FileConversationStore;
pub use llm::YandexGpt;
pub use system::{ProcessMonitor, ProcessStats};
pub use vector_store::LocalVectorStore;
pub use yandex::YandexClient;
