//! Hugging Face inference API client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::RecipeConfig;

/// Why an upstream generation attempt produced no usable text
#[derive(Debug, Error)]
pub enum UpstreamGenerationError {
    #[error("Request to generation service failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Generation service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Generation service response has no generated text")]
    UnrecognizedShape,
}

/// Text returned by a generation backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Generation time reported by the backend, if it reports one
    pub timestamp: Option<DateTime<Utc>>,
}

/// A remote text-generation backend. One call per request; no retries.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation, UpstreamGenerationError>;
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    num_return_sequences: u32,
}

/// Client for a text2text model hosted on the Hugging Face inference API
pub struct HuggingFaceClient {
    token: String,
    model_url: String,
    max_length: u32,
    client: reqwest::Client,
}

impl HuggingFaceClient {
    pub fn new(
        token: impl Into<String>,
        model_url: impl Into<String>,
        max_length: u32,
        timeout: Duration,
    ) -> Result<Self, UpstreamGenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            token: token.into(),
            model_url: model_url.into(),
            max_length,
            client,
        })
    }

    /// Build a client when a token is configured
    pub fn from_config(config: &RecipeConfig) -> Result<Option<Self>, UpstreamGenerationError> {
        match config.credential() {
            Some(token) => Self::new(
                token,
                config.model_url.clone(),
                config.max_length,
                Duration::from_secs(config.request_timeout),
            )
            .map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceClient {
    async fn generate(&self, prompt: &str) -> Result<Generation, UpstreamGenerationError> {
        let body = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_length: self.max_length,
                num_return_sequences: 1,
            },
        };

        let response = self
            .client
            .post(&self.model_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamGenerationError::Status(response.status()));
        }

        let data: Value = response.json().await?;
        let text = extract_generated_text(&data).ok_or(UpstreamGenerationError::UnrecognizedShape)?;

        Ok(Generation {
            text,
            timestamp: None,
        })
    }
}

/// Pull the generated text out of any of the response shapes the API is known to return:
/// `[{"generated_text": ..}]`, `["..."]`, `{"generated_text": ..}` or a bare string.
/// Blank text counts as no text.
pub fn extract_generated_text(data: &Value) -> Option<String> {
    let text = match data {
        Value::Array(items) => match items.first()? {
            Value::Object(first) => first.get("generated_text")?.as_str(),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        },
        Value::Object(obj) => obj.get("generated_text")?.as_str(),
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }?;

    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/model", addr)
    }

    fn client(url: String) -> HuggingFaceClient {
        HuggingFaceClient::new("hf_test", url, 512, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_extract_array_of_objects() {
        let data = json!([{"generated_text": "Mix and bake."}]);
        assert_eq!(extract_generated_text(&data).as_deref(), Some("Mix and bake."));
    }

    #[test]
    fn test_extract_array_of_strings() {
        let data = json!(["Boil everything."]);
        assert_eq!(extract_generated_text(&data).as_deref(), Some("Boil everything."));
    }

    #[test]
    fn test_extract_object() {
        let data = json!({"generated_text": "Fry it."});
        assert_eq!(extract_generated_text(&data).as_deref(), Some("Fry it."));
    }

    #[test]
    fn test_extract_raw_string() {
        let data = json!("Just eat it raw.");
        assert_eq!(extract_generated_text(&data).as_deref(), Some("Just eat it raw."));
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert!(extract_generated_text(&json!([])).is_none());
        assert!(extract_generated_text(&json!([{"summary_text": "x"}])).is_none());
        assert!(extract_generated_text(&json!({"error": "Model is loading"})).is_none());
        assert!(extract_generated_text(&json!({"generated_text": 42})).is_none());
        assert!(extract_generated_text(&json!({"generated_text": "   "})).is_none());
        assert!(extract_generated_text(&json!(null)).is_none());
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_parameters() {
        let app = Router::new().route(
            "/model",
            post(|headers: axum::http::HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(
                    headers.get("authorization").and_then(|v| v.to_str().ok()),
                    Some("Bearer hf_test")
                );
                assert_eq!(body["parameters"]["max_length"], 512);
                assert_eq!(body["parameters"]["num_return_sequences"], 1);
                let inputs = body["inputs"].as_str().unwrap_or_default().to_string();
                Json(json!([{ "generated_text": format!("echo {}", inputs) }]))
            }),
        );
        let url = serve(app).await;

        let generation = client(url).generate("ingredients: eggs").await.unwrap();
        assert_eq!(generation.text, "echo ingredients: eggs");
        assert!(generation.timestamp.is_none());
    }

    #[tokio::test]
    async fn test_generate_maps_error_status() {
        let app = Router::new().route(
            "/model",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "loading") }),
        );
        let url = serve(app).await;

        let err = client(url).generate("ingredients: eggs").await.unwrap_err();
        assert!(matches!(err, UpstreamGenerationError::Status(s) if s == StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_generate_rejects_unknown_shape() {
        let app = Router::new().route(
            "/model",
            post(|| async { Json(json!({"estimated_time": 20.0})) }),
        );
        let url = serve(app).await;

        let err = client(url).generate("ingredients: eggs").await.unwrap_err();
        assert!(matches!(err, UpstreamGenerationError::UnrecognizedShape));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_request_error() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}/model", addr))
            .generate("ingredients: eggs")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamGenerationError::Request(_)));
    }

    #[test]
    fn test_no_client_without_token() {
        let config = RecipeConfig::default();
        assert!(HuggingFaceClient::from_config(&config).unwrap().is_none());
    }
}
