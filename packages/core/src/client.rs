use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::error::{Result, ServiceError};

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A block carrying a `text` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextPart {
    pub text: String,
}

/// One element of a block sequence. Blocks that are not text are kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ContentPart {
    Text(TextPart),
    Other(serde_json::Value),
}

/// Content of a model response, in whichever shape the provider produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Part(TextPart),
    Unrecognized(serde_json::Value),
}

impl From<Vec<ContentPart>> for MessageContent {
    /// A lone text block collapses to plain text.
    fn from(parts: Vec<ContentPart>) -> Self {
        match <[ContentPart; 1]>::try_from(parts) {
            Ok([ContentPart::Text(part)]) => MessageContent::Text(part.text),
            Ok([other]) => MessageContent::Parts(vec![other]),
            Err(parts) => MessageContent::Parts(parts),
        }
    }
}

/// Response from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub content: MessageContent,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Trait for model clients, enabling stubbing in tests.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<ModelResponse>;
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
    temperature: f64,
}

// Hand-written so the API key stays out of logs.
impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiInstruction<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiInstruction<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(ServiceError::LlmApiRequest)?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&self, messages: &'a [Message]) -> GenerateContentRequest<'a> {
        let mut contents = Vec::new();
        let mut system_parts = Vec::new();

        for message in messages {
            let role = match message.role {
                Role::System => {
                    system_parts.push(GeminiPart {
                        text: &message.content,
                    });
                    continue;
                }
                Role::User => "user",
                Role::Assistant => "model",
            };
            contents.push(GeminiContent {
                role,
                parts: vec![GeminiPart {
                    text: &message.content,
                }],
            });
        }

        GenerateContentRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then(|| GeminiInstruction {
                parts: system_parts,
            }),
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn invoke(&self, messages: &[Message]) -> Result<ModelResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, self.model
        );
        let body = self.build_request(messages);

        debug!(model = %self.model, messages = messages.len(), "invoking model");

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorResponse>(&body_text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body_text);
            warn!(status = status.as_u16(), "model API returned an error");
            return Err(ServiceError::LlmApiError {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::LlmResponseParse(e.to_string()))?;

        let (input_tokens, output_tokens) = api_response
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        let parts = match api_response.candidates.into_iter().next() {
            Some(candidate) => candidate.content.map(|c| c.parts).unwrap_or_default(),
            None => {
                warn!(model = %self.model, "model returned no candidates");
                Vec::new()
            }
        };

        debug!(input_tokens, output_tokens, parts = parts.len(), "model responded");

        Ok(ModelResponse {
            content: MessageContent::from(parts),
            input_tokens,
            output_tokens,
        })
    }
}

/// Test utilities for the model client.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Mock model client. Returns pre-configured responses in order and
    /// records every message sequence it receives.
    pub struct MockModelClient {
        responses: Mutex<Vec<Result<ModelResponse>>>,
        calls: Mutex<Vec<Vec<Message>>>,
    }

    impl MockModelClient {
        pub fn new(responses: Vec<Result<ModelResponse>>) -> Self {
            // Reverse so we can pop from the end
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_response(content: &str) -> Self {
            Self::with_content(MessageContent::Text(content.to_string()))
        }

        pub fn with_content(content: MessageContent) -> Self {
            Self::new(vec![Ok(ModelResponse {
                content,
                input_tokens: 100,
                output_tokens: 200,
            })])
        }

        pub fn with_error(error: ServiceError) -> Self {
            Self::new(vec![Err(error)])
        }

        /// Message sequences received so far.
        pub fn calls(&self) -> Vec<Vec<Message>> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().map(|c| c.len()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl ModelClient for MockModelClient {
        async fn invoke(&self, messages: &[Message]) -> Result<ModelResponse> {
            self.calls
                .lock()
                .map_err(|e| ServiceError::LlmResponseParse(format!("mock lock poisoned: {e}")))?
                .push(messages.to_vec());

            let mut responses = self.responses.lock().map_err(|e| {
                ServiceError::LlmResponseParse(format!("mock lock poisoned: {e}"))
            })?;
            responses.pop().unwrap_or_else(|| {
                Err(ServiceError::LlmResponseParse(
                    "mock has no queued responses".into(),
                ))
            })
        }
    }
}
