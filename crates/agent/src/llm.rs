//! Chat-completions client for OpenAI-compatible function calling.
//!
//! Azure OpenAI, OpenAI and Ollama all speak the same request/response shape;
//! they differ only in URL layout and authentication header.

use std::time::Duration;

use async_trait::async_trait;
use ordercopilot_core::config::{LlmConfig, LlmProvider};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("llm returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm response was malformed: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: Some(content.into()) }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: Some(content.into()) }
    }
}

/// Function signature advertised to the model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON argument string as produced by the model.
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    provider: LlmProvider,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let http =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            http,
            provider: config.provider,
            endpoint: completions_endpoint(config),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn request_body<'a>(&'a self, request: &'a CompletionRequest) -> WireRequest<'a> {
        WireRequest {
            model: &self.model,
            messages: &request.messages,
            tools: request
                .tools
                .iter()
                .map(|definition| WireTool { kind: "function", function: definition })
                .collect(),
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let mut builder = self.http.post(&self.endpoint).json(&self.request_body(request));
        if let Some(api_key) = &self.api_key {
            builder = match self.provider {
                LlmProvider::AzureOpenAi => builder.header("api-key", api_key.expose_secret()),
                LlmProvider::OpenAi | LlmProvider::Ollama => {
                    builder.bearer_auth(api_key.expose_secret())
                }
            };
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        parse_completion(&body)
    }
}

pub fn completions_endpoint(config: &LlmConfig) -> String {
    let base_url = config.base_url.as_deref().map(|url| url.trim().trim_end_matches('/'));
    match config.provider {
        LlmProvider::AzureOpenAi => format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            base_url.unwrap_or_default(),
            config.model,
            config.api_version
        ),
        LlmProvider::OpenAi => {
            format!("{}/chat/completions", base_url.unwrap_or(OPENAI_DEFAULT_BASE_URL))
        }
        LlmProvider::Ollama => format!("{}/v1/chat/completions", base_url.unwrap_or_default()),
    }
}

pub fn parse_completion(body: &str) -> Result<Completion, LlmError> {
    let wire: WireResponse = serde_json::from_str(body)
        .map_err(|error| LlmError::MalformedResponse(error.to_string()))?;
    let choice = wire
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::MalformedResponse("no choices in response".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();

    Ok(Completion {
        content: choice.message.content,
        tool_calls,
        finish_reason: choice.finish_reason,
    })
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDefinition,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    function: WireFunctionCall,
}

#[derive(Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}
