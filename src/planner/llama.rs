use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::types::InferenceProvider;
use crate::kernel::error::InferenceError;
use crate::kernel::event::Output;
use crate::kernel::fusion::FusedRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlamaConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_n_predict")]
    pub n_predict: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Network-level timeout. The runtime applies its own inference timeout on top.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_n_predict() -> usize {
    256
}

fn default_temperature() -> f32 {
    0.4
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for LlamaConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            n_predict: default_n_predict(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    stream: bool,
    n_predict: usize,
    temperature: f32,
    json_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct CompletionResponse {
    content: String,
}

/// Talks to a llama-server `/completion` endpoint and constrains the reply
/// to the `{"commands": [{"type", "value"}]}` shape.
#[derive(Clone)]
pub struct LlamaPlanner {
    client: Client,
    config: LlamaConfig,
}

impl LlamaPlanner {
    pub fn new(config: LlamaConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "commands": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": { "type": "string" },
                            "value": {}
                        },
                        "required": ["type"]
                    }
                }
            },
            "required": ["commands"]
        })
    }
}

#[async_trait]
impl InferenceProvider for LlamaPlanner {
    async fn infer(&self, request: &FusedRequest) -> Result<Option<Output>, InferenceError> {
        let body = CompletionRequest {
            prompt: request.as_str(),
            stream: false,
            n_predict: self.config.n_predict,
            temperature: self.config.temperature,
            json_schema: Self::schema(),
        };

        let response = self
            .client
            .post(format!("{}/completion", self.config.url.trim_end_matches('/')))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Inference backend error: {}", response.status());
            return Err(InferenceError::Status(response.status().as_u16()));
        }

        let completion: CompletionResponse = response.json().await?;
        debug!(chars = completion.content.len(), "Completion received");
        parse_output(&completion.content)
    }
}

/// Extracts an `Output` from raw completion text.
///
/// Tolerates prose around the JSON object. Blank text is "no output", not an
/// error.
pub fn parse_output(content: &str) -> Result<Option<Output>, InferenceError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (start, end) = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(InferenceError::Malformed("no JSON object in completion".to_string())),
    };

    serde_json::from_str::<Output>(&trimmed[start..=end])
        .map(Some)
        .map_err(|e| InferenceError::Malformed(e.to_string()))
}
