//! Thin HTTP client for the YandexGPT foundation-models REST API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;
use crate::infrastructure::config::YandexCredentials;

#[derive(Clone)]
pub struct YandexClient {
    http: reqwest::Client,
    base_url: String,
    folder_id: String,
}

impl YandexClient {
    pub fn new(
        base_url: &str,
        credentials: &YandexCredentials,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&credentials.authorization())
                .map_err(|_| DomainError::config("credentials contain invalid header characters"))?,
        );
        headers.insert(
            "x-folder-id",
            HeaderValue::from_str(&credentials.folder_id)
                .map_err(|_| DomainError::config("FOLDER_ID contains invalid header characters"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| DomainError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            folder_id: credentials.folder_id.clone(),
        })
    }

    /// `gpt://<folder>/<model>/latest`, `emb://<folder>/<model>/latest`, ...
    pub fn model_uri(&self, scheme: &str, model: &str) -> String {
        format!("{scheme}://{}/{model}/latest", self.folder_id)
    }

    pub async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, DomainError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(DomainError::external(format!(
                "{path} failed ({status}): {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::external(format!("invalid response from {path}: {e}")))
    }
}

fn map_transport_error(err: reqwest::Error) -> DomainError {
    if err.is_timeout() {
        DomainError::timeout(err.to_string())
    } else {
        DomainError::external(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::testing::{serve, yandex_credentials};

    fn client(base_url: &str, timeout: Duration) -> YandexClient {
        YandexClient::new(base_url, &yandex_credentials(), timeout).unwrap()
    }

    #[test]
    fn test_model_uri_uses_folder() {
        let client = client("https://example.test/", Duration::from_secs(1));

        assert_eq!(
            client.model_uri("gpt", "yandexgpt"),
            "gpt://b1gtest/yandexgpt/latest"
        );
        assert_eq!(client.base_url, "https://example.test");
    }

    #[tokio::test]
    async fn test_post_sends_credentials_and_body() {
        let base = serve(Router::new().route(
            "/echo",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string()
                };
                Json(json!({
                    "authorization": header("authorization"),
                    "folder": header("x-folder-id"),
                    "body": body,
                }))
            }),
        ))
        .await;

        let echoed: Value = client(&base, Duration::from_secs(5))
            .post("/echo", &json!({"text": "ping"}))
            .await
            .unwrap();

        assert_eq!(echoed["authorization"], "Api-Key test-key");
        assert_eq!(echoed["folder"], "b1gtest");
        assert_eq!(echoed["body"]["text"], "ping");
    }

    #[tokio::test]
    async fn test_error_status_becomes_external_error_with_body() {
        let base = serve(Router::new().route(
            "/limited",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
        ))
        .await;

        let err = client(&base, Duration::from_secs(5))
            .post::<_, Value>("/limited", &json!({}))
            .await
            .unwrap_err();

        match err {
            DomainError::ExternalService(msg) => {
                assert!(msg.contains("429"), "{msg}");
                assert!(msg.contains("quota exceeded"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_response_becomes_timeout() {
        let base = serve(Router::new().route(
            "/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Json(json!({}))
            }),
        ))
        .await;

        let err = client(&base, Duration::from_millis(200))
            .post::<_, Value>("/slow", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Timeout(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_external_error() {
        let base = serve(Router::new().route("/garbage", post(|| async { "not json" }))).await;

        let err = client(&base, Duration::from_secs(5))
            .post::<_, Value>("/garbage", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ExternalService(_)), "{err:?}");
    }
}
