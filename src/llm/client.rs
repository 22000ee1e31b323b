//! OpenAI-compatible chat completions client.

use crate::config::ModelConfig;
use crate::error::GenerationError;
use crate::llm::{ChatModel, ChatRequest};
use crate::models::ModelVariant;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat client for Azure OpenAI style deployments.
pub struct AzureChatClient {
    http_client: reqwest::Client,
    primary_endpoint: String,
    alternate_endpoint: String,
    api_key: String,
    timeout_seconds: u64,
}

impl AzureChatClient {
    pub fn new(config: &ModelConfig) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GenerationError::Unreachable(e.to_string()))?;

        Ok(Self {
            http_client,
            primary_endpoint: config.endpoint.clone(),
            alternate_endpoint: config.alternate_endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn endpoint(&self, variant: ModelVariant) -> Result<&str, GenerationError> {
        let endpoint = match variant {
            ModelVariant::Primary => &self.primary_endpoint,
            ModelVariant::Alternate => &self.alternate_endpoint,
        };
        if endpoint.trim().is_empty() {
            return Err(GenerationError::MissingEndpoint(variant.to_string()));
        }
        Ok(endpoint)
    }
}

#[async_trait]
impl ChatModel for AzureChatClient {
    async fn complete(
        &self,
        variant: ModelVariant,
        request: &ChatRequest,
    ) -> Result<String, GenerationError> {
        let endpoint = self.endpoint(variant)?;

        let body = ChatCompletionRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(
            "Chat request to {} model ({} tokens max)",
            variant, request.max_tokens
        );

        let response = self
            .http_client
            .post(endpoint)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.timeout_seconds)
                } else if e.is_connect() {
                    GenerationError::Unreachable(endpoint.to_string())
                } else {
                    GenerationError::Unreachable(format!("{} ({})", endpoint, e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Http { status, body });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GenerationError::Malformed("response has no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_http_fixture;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn config(endpoint: String) -> ModelConfig {
        ModelConfig {
            endpoint,
            api_key: "key-123".to_string(),
            timeout_seconds: 5,
            ..ModelConfig::default()
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            system: "system text".to_string(),
            user: "list all users".to_string(),
            max_tokens: 100,
            temperature: 0.5,
        }
    }

    #[tokio::test]
    async fn test_complete_sends_messages_and_key() {
        let seen: Arc<Mutex<Vec<(HeaderMap, Value)>>> = Arc::default();
        let captured = seen.clone();
        let router = Router::new().route(
            "/chat",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push((headers, body));
                    Json(json!({
                        "choices": [{"message": {"role": "assistant", "content": "MATCH (u:User) RETURN u"}}]
                    }))
                }
            }),
        );
        let base_url = spawn_http_fixture(router).await;
        let client = AzureChatClient::new(&config(format!("{}/chat", base_url))).unwrap();

        let reply = client.complete(ModelVariant::Primary, &request()).await.unwrap();
        assert_eq!(reply, "MATCH (u:User) RETURN u");

        let seen = seen.lock().unwrap();
        let (headers, body) = &seen[0];
        assert_eq!(headers["api-key"], "key-123");
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "list all users");
    }

    #[tokio::test]
    async fn test_missing_alternate_endpoint() {
        let client = AzureChatClient::new(&config("http://localhost:1/chat".to_string())).unwrap();
        let err = client
            .complete(ModelVariant::Alternate, &request())
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::MissingEndpoint("alternate".to_string()));
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let router = Router::new().route(
            "/chat",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base_url = spawn_http_fixture(router).await;
        let client = AzureChatClient::new(&config(format!("{}/chat", base_url))).unwrap();

        let err = client.complete(ModelVariant::Primary, &request()).await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::Http {
                status: 429,
                body: "slow down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_choices_are_malformed() {
        let router = Router::new().route("/chat", post(|| async { Json(json!({"choices": []})) }));
        let base_url = spawn_http_fixture(router).await;
        let client = AzureChatClient::new(&config(format!("{}/chat", base_url))).unwrap();

        let err = client.complete(ModelVariant::Primary, &request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }
}
