use std::time::Duration;

use serde::{Deserialize, Serialize};
use sre_core::error::AppError;

use super::Llm;
use crate::ollama::OllamaClient;

const DEFAULT_GENERATE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
    timeout: Duration,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient) -> Self {
        Self {
            client,
            timeout: DEFAULT_GENERATE_TIMEOUT,
        }
    }

    /// Transport timeout for a single generate request. Zero keeps the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Llm for OllamaLlm {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/api/generate", self.client.base_url());
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
            format: "json",
        };

        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("AI_GENERATE_FAILED", "Failed to encode generate request")
                    .with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: GenerateResponse = r.into_json().map_err(|e| {
                    AppError::new("AI_GENERATE_FAILED", "Failed to decode generate response")
                        .with_details(e.to_string())
                })?;
                if v.response.trim().is_empty() {
                    return Err(AppError::new("AI_GENERATE_FAILED", "Generate response was empty"));
                }
                Ok(v.response)
            }
            Ok(r) => Err(AppError::new("AI_GENERATE_FAILED", "Generate request failed")
                .with_details(format!("status={}", r.status()))),
            Err(ureq::Error::Status(code, _)) => Err(AppError::new(
                "AI_GENERATE_FAILED",
                "Generate request failed",
            )
            .with_details(format!("status={code}; model={model}"))),
            Err(e) => Err(
                AppError::new("AI_OLLAMA_UNREACHABLE", "Failed to call generate endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}
