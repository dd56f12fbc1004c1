//! A Gemini-style HTTP backend. Retries transient failures with
//! exponential backoff internally, before the circuit breaker ever sees
//! an outcome for the call as a whole.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use veritas_config::LlmConfig;

use crate::error::LlmError;
use crate::provider::{GenerateRequest, LlmProvider};

pub struct GeminiBackend {
    config: LlmConfig,
    client: Client,
}

impl GeminiBackend {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.as_deref().unwrap_or_default().is_empty() {
            return Err(LlmError::Configuration(
                "VERITAS_LLM_API_KEY not set".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    async fn execute_once(&self, request: &GenerateRequest) -> Result<String, LlmError> {
        let mut generation_config = GeminiGenerationConfig {
            temperature: request.temperature,
            response_mime_type: None,
        };
        if request.json_mode {
            generation_config.response_mime_type = Some("application/json".to_string());
        }

        let mut contents = Vec::new();
        if let Some(system) = &request.system_instruction {
            contents.push(GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: system.clone() }],
            });
            contents.push(GeminiContent {
                role: "model".to_string(),
                parts: vec![GeminiPart { text: "Understood.".to_string() }],
            });
        }
        contents.push(GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart { text: request.prompt.clone() }],
        });

        let body = GeminiRequest { contents, generation_config };

        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, api_key
        );

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status: status.as_u16(), message });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| LlmError::InvalidResponse("empty candidate list".to_string()))
    }
}

#[async_trait]
impl LlmProvider for GeminiBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LlmError> {
        let mut backoff = self.config.initial_backoff();
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(attempt, ?backoff, "retrying llm request after transient failure");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_once(&request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::Timeout))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let mut config = LlmConfig::default();
        config.api_key = None;
        assert!(GeminiBackend::new(config).is_err());
    }

    #[test]
    fn accepts_configured_api_key() {
        let mut config = LlmConfig::default();
        config.api_key = Some("test-key".to_string());
        assert!(GeminiBackend::new(config).is_ok());
    }
}
