use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sre_core::domain::{HealthStatus, ServiceFinding, ServiceId, Severity, Verdict};
use sre_core::error::AppError;
use tracing::{error, info, warn};

use crate::guardrails::parse_verdict;
use crate::llm::Llm;

mod prompts;

pub use prompts::verdict_prompt;

/// Turns findings into a `Verdict` through one reasoning call.
///
/// Never fails: an empty finding set, a backend error, a timeout or an unusable reply
/// all resolve to a deterministic UNKNOWN verdict with confidence 0.
#[derive(Clone)]
pub struct VerdictSynthesizer {
    llm: Arc<dyn Llm>,
    model: String,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for VerdictSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerdictSynthesizer")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl VerdictSynthesizer {
    pub fn new(llm: Arc<dyn Llm>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            timeout: None,
        }
    }

    /// Bound on the reasoning call. `None` or zero waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|d| !d.is_zero());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn synthesize(
        &self,
        query: &str,
        findings: &BTreeMap<ServiceId, ServiceFinding>,
    ) -> Verdict {
        if findings.is_empty() {
            warn!("no service findings to synthesize");
            return empty_findings_verdict();
        }

        let started = Instant::now();
        match self.request_verdict(query, findings).await {
            Ok(verdict) => {
                info!(
                    model = %self.model,
                    status = verdict.overall_status.as_str(),
                    confidence = verdict.confidence,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "verdict synthesized"
                );
                verdict
            }
            Err(e) => {
                error!(model = %self.model, code = %e.code, error = %e.message, "verdict synthesis failed");
                fallback_verdict(&e.outcome_message())
            }
        }
    }

    async fn request_verdict(
        &self,
        query: &str,
        findings: &BTreeMap<ServiceId, ServiceFinding>,
    ) -> Result<Verdict, AppError> {
        let findings_json = serde_json::to_string_pretty(findings).map_err(|e| {
            AppError::new("AI_PROMPT_FAILED", "Failed to serialize findings")
                .with_details(e.to_string())
        })?;
        let prompt = verdict_prompt(query, &findings_json);

        let llm = Arc::clone(&self.llm);
        let model = self.model.clone();
        let call = tokio::task::spawn_blocking(move || llm.generate(&model, &prompt));

        let joined = match self.timeout {
            None => call.await,
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                AppError::new(
                    "AI_SYNTHESIS_TIMEOUT",
                    format!("Reasoning backend did not answer within {limit:?}"),
                )
                .with_retryable(true)
            })?,
        };
        let reply = joined.map_err(|e| {
            AppError::new("AI_SYNTHESIS_FAILED", "Reasoning task aborted").with_details(e.to_string())
        })??;

        parse_verdict(&reply)
    }
}

/// Returned without a reasoning call when no service produced a finding.
pub fn empty_findings_verdict() -> Verdict {
    Verdict {
        overall_status: HealthStatus::Unknown,
        root_cause_narrative: "No service health data was gathered. Cannot perform analysis."
            .to_string(),
        immediate_actions: vec![
            "Verify service configurations (k8s, aws, github) in settings.".to_string(),
        ],
        long_term_recommendations: vec![
            "Ensure all required services are enabled and have correct permissions.".to_string(),
        ],
        suggested_commands: Vec::new(),
        severity: Severity::Low,
        confidence: 0,
    }
}

pub fn fallback_verdict(reason: &str) -> Verdict {
    Verdict {
        overall_status: HealthStatus::Unknown,
        root_cause_narrative: format!("Failed to generate AI analysis: {reason}"),
        immediate_actions: vec!["Review raw service data manually.".to_string()],
        long_term_recommendations: vec![
            "Check the reasoning backend status and model availability.".to_string(),
        ],
        suggested_commands: Vec::new(),
        severity: Severity::Low,
        confidence: 0,
    }
}
