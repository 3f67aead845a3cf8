use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ports::LlmService, DomainError, Message};
use crate::infrastructure::config::{LlmConfig, YandexCredentials};
use crate::infrastructure::yandex::YandexClient;

const COMPLETION_PATH: &str = "/foundationModels/v1/completion";

pub struct YandexGpt {
    client: YandexClient,
    model_uri: String,
    temperature: f32,
    max_tokens: u32,
}

impl YandexGpt {
    pub fn new(client: YandexClient, config: &LlmConfig) -> Self {
        Self {
            model_uri: client.model_uri("gpt", &config.model),
            client,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn from_config(
        config: &LlmConfig,
        credentials: &YandexCredentials,
    ) -> Result<Self, DomainError> {
        let client = YandexClient::new(
            &config.base_url,
            credentials,
            Duration::from_secs(config.timeout_seconds),
        )?;
        Ok(Self::new(client, config))
    }

    fn request<'a>(&'a self, messages: &'a [Message]) -> CompletionRequest<'a> {
        CompletionRequest {
            model_uri: &self.model_uri,
            completion_options: CompletionOptions {
                stream: false,
                temperature: self.temperature,
                max_tokens: self.max_tokens.to_string(),
            },
            messages: messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.as_str(),
                    text: &m.content,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LlmService for YandexGpt {
    async fn chat(&self, messages: &[Message]) -> Result<String, DomainError> {
        let response: CompletionResponse = self
            .client
            .post(COMPLETION_PATH, &self.request(messages))
            .await?;

        response.into_text()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    model_uri: &'a str,
    completion_options: CompletionOptions,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f32,
    // int64 fields travel as strings in the API's JSON mapping
    max_tokens: String,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    message: AlternativeMessage,
}

#[derive(Debug, Deserialize)]
struct AlternativeMessage {
    text: String,
}

impl CompletionResponse {
    fn into_text(self) -> Result<String, DomainError> {
        self.result
            .alternatives
            .into_iter()
            .next()
            .map(|alt| alt.message.text)
            .ok_or_else(|| DomainError::external("completion returned no alternatives"))
    }
}
