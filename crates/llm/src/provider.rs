//! The narrow capability the core consumes from any LLM vendor.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LlmError;

/// A single generation request. `json_mode` asks the backend to request
/// (and, where the vendor supports it, constrain to) JSON output.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub temperature: f32,
    pub json_mode: bool,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            temperature,
            json_mode: false,
        }
    }

    pub fn with_system(mut self, system_instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(system_instruction.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// The collaborator interface: `generate` returns raw text, `generate_json`
/// additionally strips code fences and parses the result as JSON.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LlmError>;

    async fn generate_json(&self, request: GenerateRequest) -> Result<Value, LlmError> {
        let request = request.json();
        let raw = self.generate(request).await?;
        parse_json_response(&raw)
    }

    fn model_name(&self) -> &str;
}

/// Strip a single leading/trailing markdown code fence (```` ``` ```` or
/// ```` ```json ````) if present, then parse as JSON.
pub fn parse_json_response(raw: &str) -> Result<Value, LlmError> {
    let trimmed = raw.trim();
    let stripped = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.strip_suffix("```").unwrap_or(rest)
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.strip_suffix("```").unwrap_or(rest)
    } else {
        trimmed
    };

    serde_json::from_str(stripped.trim())
        .map_err(|e| LlmError::InvalidResponse(format!("malformed JSON response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let value = parse_json_response(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn strips_json_code_fence() {
        let value = parse_json_response("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn strips_bare_code_fence() {
        let value = parse_json_response("```\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_json_response("not json at all").is_err());
    }
}
