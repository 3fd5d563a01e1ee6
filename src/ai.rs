use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::error::{Result, SpyError, Stage};

// --- Provider trait ---

#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Mistral,
    Anthropic,
    OpenAI,
}

impl ProviderKind {
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::Mistral => "MISTRAL_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAI => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model_id: String,
    pub short_name: String,
}

pub const MODEL_NAMES: [&str; 6] = [
    "mistral-large",
    "mistral-small",
    "api-sonnet",
    "api-haiku",
    "gpt-4o",
    "gpt-4o-mini",
];

pub fn resolve_model(name: &str) -> Result<ModelSpec> {
    let (provider, model_id, short_name) = match name {
        "mistral-large" | "mistral" => {
            (ProviderKind::Mistral, "mistral-large-latest", "mistral-large")
        }
        "mistral-small" => (ProviderKind::Mistral, "mistral-small-latest", "mistral-small"),
        "api-sonnet" | "sonnet" => {
            (ProviderKind::Anthropic, "claude-sonnet-4-5-20250929", "api-sonnet")
        }
        "api-haiku" | "haiku" => {
            (ProviderKind::Anthropic, "claude-haiku-4-5-20251001", "api-haiku")
        }
        "gpt-4o" => (ProviderKind::OpenAI, "gpt-4o", "gpt-4o"),
        "gpt-4o-mini" => (ProviderKind::OpenAI, "gpt-4o-mini", "gpt-4o-mini"),
        _ => {
            return Err(SpyError::config(format!(
                "Unknown model '{}'. Available: {}",
                name,
                MODEL_NAMES.join(", ")
            )));
        }
    };
    Ok(ModelSpec {
        provider,
        model_id: model_id.to_string(),
        short_name: short_name.to_string(),
    })
}

pub fn create_provider(
    spec: &ModelSpec,
    api_key: &str,
    timeout: Duration,
) -> Result<Arc<dyn AiProvider>> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SpyError::config(format!("Failed to build HTTP client: {}", e)))?;

    let provider: Arc<dyn AiProvider> = match spec.provider {
        ProviderKind::Anthropic => Arc::new(AnthropicProvider {
            api_key: api_key.to_string(),
            model_id: spec.model_id.clone(),
            client,
        }),
        ProviderKind::Mistral => Arc::new(ChatCompletionsProvider {
            endpoint: MISTRAL_API_URL,
            api_key: api_key.to_string(),
            model_id: spec.model_id.clone(),
            client,
        }),
        ProviderKind::OpenAI => Arc::new(ChatCompletionsProvider {
            endpoint: OPENAI_API_URL,
            api_key: api_key.to_string(),
            model_id: spec.model_id.clone(),
            client,
        }),
    };
    Ok(provider)
}

fn transport_error(service: &str, err: reqwest::Error) -> SpyError {
    SpyError::acquisition(
        Stage::Enrichment,
        format!("Failed to send request to {}: {}", service, err),
    )
}

async fn check_status(service: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(SpyError::acquisition(
        Stage::Enrichment,
        format!("{} request failed with status {}: {}", service, status, error_text),
    ))
}

// Low temperature keeps profile classification stable between runs.
const TEMPERATURE: f32 = 0.3;

// --- Anthropic provider ---

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug)]
pub struct AnthropicProvider {
    api_key: String,
    model_id: String,
    client: reqwest::Client,
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model_id.clone(),
            max_tokens,
            temperature: TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("Anthropic API", e))?;
        let response = check_status("Anthropic API", response).await?;

        let api_response: AnthropicResponse = response.json().await.map_err(|e| {
            SpyError::malformed(
                Stage::Enrichment,
                format!("Failed to parse Anthropic API response: {}", e),
            )
        })?;

        api_response
            .content
            .into_iter()
            .map(|block| block.text)
            .find(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                SpyError::malformed(Stage::Enrichment, "No content in Anthropic API response")
            })
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- Chat-completions providers (Mistral, OpenAI) ---

const MISTRAL_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

// Mistral and OpenAI share the chat-completions wire format.
#[derive(Debug)]
pub struct ChatCompletionsProvider {
    endpoint: &'static str,
    api_key: String,
    model_id: String,
    client: reqwest::Client,
}

#[async_trait]
impl AiProvider for ChatCompletionsProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = ChatCompletionsRequest {
            model: self.model_id.clone(),
            max_tokens,
            temperature: TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(self.endpoint, e))?;
        let response = check_status(self.endpoint, response).await?;

        let api_response: ChatCompletionsResponse = response.json().await.map_err(|e| {
            SpyError::malformed(
                Stage::Enrichment,
                format!("Failed to parse chat completion: {}", e),
            )
        })?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| SpyError::malformed(Stage::Enrichment, "No choices in chat completion"))
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- Response parsing ---

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)\n?```").expect("Invalid JSON fence pattern")
});

// Returns the body of the first ``` fence, or the trimmed text when unfenced.
pub fn extract_json_block(response: &str) -> &str {
    let fenced = JSON_FENCE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim());
    fenced.unwrap_or_else(|| response.trim())
}

pub fn parse_json_response<T: DeserializeOwned>(response: &str) -> Result<T> {
    let json = extract_json_block(response);
    serde_json::from_str(json).map_err(|e| {
        let preview: String = response.chars().take(200).collect();
        SpyError::malformed(
            Stage::Enrichment,
            format!("Failed to parse JSON from response: {} (response: {})", e, preview),
        )
    })
}
