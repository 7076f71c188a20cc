//! OpenAI-compatible chat completions client.

use super::prompt::{system_prompt, user_prompt};
use super::{CallContext, FailureKind, InvocationError, InvocationPayload, ModelInvoker};
use crate::config::InvocationConfig;
use crate::credential::Secret;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Sends one vision chat completion per call.
///
/// - `POST {endpoint}/chat/completions` with Bearer authentication
/// - System prompt chosen by [`ProcessingMode`](super::ProcessingMode)
/// - User message with a text part and an `image_url` part
///
/// The per-attempt deadline comes from [`InvocationConfig::timeout`]; the
/// shutdown token cancels in-flight attempts.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    cancel: CancellationToken,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(client: Client, cancel: CancellationToken) -> Self {
        Self {
            client,
            cancel,
            temperature: 0.1,
            max_tokens: 2000,
        }
    }

    fn build_request<'a>(
        &self,
        payload: &InvocationPayload,
        config: &'a InvocationConfig,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: config.model(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(system_prompt(payload.mode)),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: user_prompt(payload.mode).to_string(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: payload.source.image_url(),
                            },
                        },
                    ]),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    async fn send(
        &self,
        payload: &InvocationPayload,
        config: &InvocationConfig,
        secret: &Secret,
    ) -> Result<String, InvocationError> {
        let url = format!("{}/chat/completions", config.endpoint());
        let request = self.build_request(payload, config);

        let response = self
            .client
            .post(&url)
            .bearer_auth(secret.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InvocationError::classify(FailureKind::Timeout(
                        config.timeout().as_millis() as u64
                    ))
                } else {
                    InvocationError::classify(FailureKind::Network(e.to_string()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InvocationError::from_status(
                status.as_u16(),
                truncate(&error_body, 512),
            ));
        }

        let body = response.text().await.map_err(|e| {
            InvocationError::classify(FailureKind::Network(format!(
                "Failed to read response body: {}",
                e
            )))
        })?;

        extract_content(&body)
    }
}

#[async_trait]
impl ModelInvoker for OpenAiClient {
    async fn call(
        &self,
        payload: &InvocationPayload,
        config: &InvocationConfig,
        secret: &Secret,
    ) -> Result<String, InvocationError> {
        let ctx = CallContext::new(config.timeout(), self.cancel.clone());
        ctx.run(self.send(payload, config, secret)).await
    }
}

/// Pull the assistant text out of a completion body.
pub(crate) fn extract_content(body: &str) -> Result<String, InvocationError> {
    if body.trim().is_empty() {
        return Err(InvocationError::classify(FailureKind::EmptyResponse));
    }

    let completion: ChatResponse = serde_json::from_str(body).map_err(|e| {
        InvocationError::classify(FailureKind::InvalidResponse(format!(
            "Failed to parse completion response: {}",
            e
        )))
    })?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(ResponseContent::into_text)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(InvocationError::classify(FailureKind::EmptyResponse));
    }
    Ok(content)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<ResponseContent>,
}

/// Some providers return content as a list of typed parts.
#[derive(Deserialize)]
#[serde(untagged)]
enum ResponseContent {
    Text(String),
    Parts(Vec<ResponsePart>),
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl ResponseContent {
    fn into_text(self) -> String {
        match self {
            ResponseContent::Text(text) => text,
            ResponseContent::Parts(parts) => parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}
