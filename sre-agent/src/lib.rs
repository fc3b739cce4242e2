use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use sre_ai::llm::ollama_llm::OllamaLlm;
use sre_ai::ollama::OllamaClient;
use sre_ai::synth::VerdictSynthesizer;
use sre_core::config::AgentConfig;
use sre_core::error::AppError;

pub mod aggregator;
pub mod fixtures;

pub use aggregator::{AnalysisRequest, AnalysisResponse, IncidentAggregator};
pub use fixtures::{fixture_backends, fixture_registry, FixtureBackend};

#[derive(Debug, Serialize)]
pub struct AiHealthStatus {
    pub ok: bool,
    pub message: String,
}

/// Verdict synthesizer backed by the configured local Ollama model.
pub fn ollama_synthesizer(config: &AgentConfig) -> Result<VerdictSynthesizer, AppError> {
    let client = OllamaClient::new(&config.ollama_base_url)?;
    let llm = OllamaLlm::new(client).with_timeout(Duration::from_secs(config.analysis_timeout_secs));
    Ok(VerdictSynthesizer::new(Arc::new(llm), config.ollama_model.clone()))
}

pub fn ai_health_check(config: &AgentConfig) -> Result<AiHealthStatus, AppError> {
    let client = OllamaClient::new(&config.ollama_base_url)?;
    client.health_check()?;
    Ok(AiHealthStatus {
        ok: true,
        message: format!("Ollama reachable at {}", client.base_url()),
    })
}
