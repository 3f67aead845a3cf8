use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::DomainError;

pub const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";
pub const DEFAULT_PROMPTS_PATH: &str = "config/prompts.yaml";

/// Runtime settings plus prompt templates, each loaded from its own YAML file.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Reads both files; a missing file falls back to the built-in defaults.
    pub fn load(
        config_path: impl AsRef<Path>,
        prompts_path: impl AsRef<Path>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            config: read_yaml_or_default(config_path.as_ref())?,
            prompts: read_yaml_or_default(prompts_path.as_ref())?,
        })
    }

    /// Same as [`AppConfig::load`] with paths taken from `APP_CONFIG` / `PROMPTS_CONFIG`.
    pub fn from_env() -> Result<Self, DomainError> {
        let config_path =
            std::env::var("APP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let prompts_path =
            std::env::var("PROMPTS_CONFIG").unwrap_or_else(|_| DEFAULT_PROMPTS_PATH.into());
        Self::load(config_path, prompts_path)
    }
}

fn read_yaml_or_default<T>(path: &Path) -> Result<T, DomainError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(T::default());
    }

    let raw = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&raw)
        .map_err(|e| DomainError::config(format!("{}: {e}", path.display())))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9027,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

pub const YANDEX_LLM_API: &str = "https://llm.api.cloud.yandex.net";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: YANDEX_LLM_API.to_string(),
            model: "yandexgpt".to_string(),
            temperature: 0.6,
            max_tokens: 2000,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub doc_model: String,
    pub query_model: String,
    pub dimension: usize,
    /// Pause between consecutive embedding requests; the API rate-limits per folder.
    pub request_interval_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: YANDEX_LLM_API.to_string(),
            doc_model: "text-search-doc".to_string(),
            query_model: "text-search-query".to_string(),
            dimension: 256,
            request_interval_ms: 100,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            chunk_size: 2000,
            chunk_overlap: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub docs_dir: PathBuf,
    pub index_dir: PathBuf,
    pub history_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("./db_files"),
            index_dir: PathBuf::from("./vector_index"),
            history_file: PathBuf::from("./dialogs_history.json"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub assistant: AssistantPrompts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantPrompts {
    pub system: String,
    /// Wraps retrieved chunks; `{context}` is replaced with the joined chunk texts.
    pub context: String,
}

impl Default for AssistantPrompts {
    fn default() -> Self {
        Self {
            system: "Ты очень полезный чатбот, тебя зовут YandexGPT. Можешь общаться на разные темы. \
                     При ответе на вопросы будь краток, используй 30 слов или меньше."
                .to_string(),
            context: "Для ответа используй следующие фрагменты документов, если они относятся к вопросу:\n\n{context}"
                .to_string(),
        }
    }
}

/// YandexGPT credentials, read from `IAM_TOKEN`, `API_KEY` and `FOLDER_ID`.
#[derive(Clone)]
pub struct YandexCredentials {
    pub iam_token: Option<String>,
    pub api_key: Option<String>,
    pub folder_id: String,
}

impl YandexCredentials {
    pub fn from_env() -> Result<Self, DomainError> {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let folder_id =
            non_empty("FOLDER_ID").ok_or_else(|| DomainError::config("FOLDER_ID is not set"))?;
        let credentials = Self {
            iam_token: non_empty("IAM_TOKEN"),
            api_key: non_empty("API_KEY"),
            folder_id,
        };

        if credentials.iam_token.is_none() && credentials.api_key.is_none() {
            return Err(DomainError::config(
                "either API_KEY or IAM_TOKEN must be set",
            ));
        }
        Ok(credentials)
    }

    /// `Authorization` header value; an API key wins over an IAM token.
    pub fn authorization(&self) -> String {
        match (&self.api_key, &self.iam_token) {
            (Some(key), _) => format!("Api-Key {}", key.trim()),
            (None, Some(token)) => format!("Bearer {}", token.trim()),
            (None, None) => String::new(),
        }
    }
}

impl std::fmt::Debug for YandexCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexCredentials")
            .field("iam_token", &self.iam_token.as_ref().map(|_| "***"))
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("folder_id", &self.folder_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let config = AppConfig::load("/nonexistent/app.yaml", "/nonexistent/prompts.yaml").unwrap();

        assert_eq!(config.config.rag.top_k, 5);
        assert_eq!(config.config.rag.chunk_size, 2000);
        assert_eq!(config.config.server.port, 9027);
        assert!(!config.prompts.assistant.system.is_empty());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rag:\n  top_k: 3\nserver:\n  port: 8000").unwrap();

        let config = AppConfig::load(file.path(), "/nonexistent/prompts.yaml").unwrap();

        assert_eq!(config.config.rag.top_k, 3);
        assert_eq!(config.config.rag.chunk_overlap, 100);
        assert_eq!(config.config.server.port, 8000);
        assert_eq!(config.config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rag: [unclosed").unwrap();

        let err = AppConfig::load(file.path(), "/nonexistent/prompts.yaml").unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[test]
    fn test_api_key_preferred_over_iam_token() {
        let credentials = YandexCredentials {
            iam_token: Some("t0ken".into()),
            api_key: Some("k3y".into()),
            folder_id: "b1g".into(),
        };
        assert_eq!(credentials.authorization(), "Api-Key k3y");

        let iam_only = YandexCredentials {
            api_key: None,
            ..credentials
        };
        assert_eq!(iam_only.authorization(), "Bearer t0ken");
    }
}
