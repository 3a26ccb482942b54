//! Text completion client
//!
//! The conversion engine only depends on the [`GenerationClient`] trait; the
//! OpenAI-compatible implementation lives here so tests and other front-ends
//! can substitute their own.

use serde_json::json;
use std::time::Duration;

/// Parameters for one completion call.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-request deadline. Title calls use a short one; body calls carry a
    /// long defensive timeout.
    pub timeout: Option<Duration>,
}

/// Black-box text completion service.
///
/// Implementations return the raw completion text or an error message. The
/// engine treats any error as a failed generation; retry policy lives in the
/// batch layer.
pub trait GenerationClient: Send {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, String>;
}

/// OpenAI-compatible chat completion client over the blocking HTTP stack.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: reqwest::blocking::Client,
}

impl OpenAiClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn map_transport_error(error: reqwest::Error) -> String {
        if error.is_timeout() {
            "completion request timed out".to_string()
        } else {
            format!("completion request failed: {}", error)
        }
    }
}

impl GenerationClient for OpenAiClient {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": params.model,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let mut request = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(timeout) = params.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().map_err(Self::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => "invalid API key: check the configured credentials".to_string(),
                404 => format!("model '{}' not found", params.model),
                429 => format!("rate limited by completion service: {}", detail),
                _ => format!("completion service error ({}): {}", status, detail),
            });
        }

        let payload: serde_json::Value = response
            .json()
            .map_err(|e| format!("failed to parse completion response: {}", e))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.trim().to_string())
            .ok_or_else(|| "completion response contained no content".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_carry_timeout() {
        let params = GenerationParams {
            model: "gpt-4.1-2025-04-14".to_string(),
            max_tokens: 100,
            temperature: 0.8,
            timeout: Some(Duration::from_secs(3)),
        };
        assert_eq!(params.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_trait_object_substitution() {
        struct Canned;
        impl GenerationClient for Canned {
            fn complete(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, String> {
                Ok("본문".to_string())
            }
        }

        let client: Box<dyn GenerationClient> = Box::new(Canned);
        let params = GenerationParams {
            model: "test".to_string(),
            max_tokens: 1,
            temperature: 0.0,
            timeout: None,
        };
        assert_eq!(client.complete("p", &params).unwrap(), "본문");
    }
}
