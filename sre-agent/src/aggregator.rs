use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, info, warn};

use sre_ai::synth::VerdictSynthesizer;
use sre_core::config::AgentConfig;
use sre_core::domain::{IncidentAnalysis, Priority, ServiceId};
use sre_core::error::AppError;
use sre_core::fanout::FanOutCoordinator;
use sre_core::history::AnalysisHistory;
use sre_core::ids::generate_analysis_id;
use sre_core::metrics::{compute_system_metrics, SystemMetrics, SUCCESS_RATE_WINDOW};
use sre_core::normalize::timestamps::{format_rfc3339_utc, now_rfc3339_utc};
use sre_core::probes::{ProbeContext, ProbeRegistry};
use sre_core::report::IncidentReportBuilder;
use sre_core::router::resolve_services;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub query: String,
    /// Explicit selection; `None` or empty routes by query keywords.
    #[serde(default)]
    pub services: Option<Vec<ServiceId>>,
    #[serde(default)]
    pub priority: Priority,
}

impl AnalysisRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            services: None,
            priority: Priority::default(),
        }
    }

    pub fn with_services(mut self, services: Vec<ServiceId>) -> Self {
        self.services = Some(services);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<IncidentAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time: f64,
    pub services_analyzed: Vec<ServiceId>,
}

/// Owns the probes, the synthesizer and the bounded history for one process.
///
/// `analyze` never returns `Err`: pipeline failures come back as `success: false` and
/// leave history untouched.
#[derive(Debug)]
pub struct IncidentAggregator {
    config: AgentConfig,
    ctx: ProbeContext,
    coordinator: FanOutCoordinator,
    synthesizer: VerdictSynthesizer,
    history: AnalysisHistory,
}

impl IncidentAggregator {
    pub fn new(
        config: AgentConfig,
        registry: ProbeRegistry,
        synthesizer: VerdictSynthesizer,
    ) -> Self {
        let limit = analysis_timeout(&config);
        info!(
            history_capacity = config.max_history_items,
            timeout_secs = config.analysis_timeout_secs,
            model = synthesizer.model(),
            "aggregator initialized"
        );
        Self {
            ctx: ProbeContext::from_config(&config),
            coordinator: FanOutCoordinator::new(registry).with_probe_timeout(limit),
            synthesizer: synthesizer.with_timeout(limit),
            history: AnalysisHistory::new(config.max_history_items),
            config,
        }
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisResponse {
        let started = Instant::now();
        match self.run(&request, started).await {
            Ok(analysis) => AnalysisResponse {
                success: true,
                services_analyzed: analysis.services_requested.clone(),
                execution_time: started.elapsed().as_secs_f64(),
                error: None,
                analysis: Some((*analysis).clone()),
            },
            Err(e) => {
                error!(code = %e.code, error = %e.message, "analysis failed");
                AnalysisResponse {
                    success: false,
                    analysis: None,
                    error: Some(e.outcome_message()),
                    execution_time: started.elapsed().as_secs_f64(),
                    services_analyzed: Vec::new(),
                }
            }
        }
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        started: Instant,
    ) -> Result<Arc<IncidentAnalysis>, AppError> {
        // A blank query matches no keywords and routes to every service.
        let query = request.query.trim();
        let now = OffsetDateTime::now_utc();
        let id = generate_analysis_id(now)?;
        let timestamp = format_rfc3339_utc(now)?;

        let (selected, disabled): (Vec<ServiceId>, Vec<ServiceId>) =
            resolve_services(request.services.as_deref(), query)
                .into_iter()
                .partition(|s| self.config.is_enabled(*s));
        if !disabled.is_empty() {
            warn!(analysis_id = %id, ?disabled, "skipping disabled services");
        }
        info!(
            analysis_id = %id,
            priority = ?request.priority,
            services = ?selected,
            "analysis started"
        );

        let outcomes = self.coordinator.run(&selected, &self.ctx).await;
        let checked_at = now_rfc3339_utc()?;
        let builder = IncidentReportBuilder::new(id, query, selected, started)
            .with_outcomes(outcomes, &checked_at);

        let verdict = self.synthesizer.synthesize(query, builder.findings()).await;
        let analysis = builder.build(verdict, timestamp);
        info!(
            analysis_id = %analysis.id,
            status = analysis.verdict.overall_status.as_str(),
            severity = ?analysis.verdict.severity,
            elapsed_ms = (analysis.execution_time_seconds * 1000.0) as u64,
            "analysis finished"
        );
        Ok(self.history.record(analysis))
    }

    /// Most recent first.
    pub fn get_recent(&self, limit: usize) -> Vec<Arc<IncidentAnalysis>> {
        self.history.recent(limit)
    }

    pub fn get_by_id(&self, id: &str) -> Option<Arc<IncidentAnalysis>> {
        self.history.get(id)
    }

    pub fn get_system_metrics(&self) -> Result<SystemMetrics, AppError> {
        let now = now_rfc3339_utc()?;
        let recent = self.history.recent(SUCCESS_RATE_WINDOW);
        Ok(compute_system_metrics(recent.first().map(|a| a.as_ref()), &now)
            .with_analysis_stats(&recent, self.history.len()))
    }

    pub fn shutdown(self) {
        info!(analyses = self.history.len(), "aggregator shut down");
    }
}

fn analysis_timeout(config: &AgentConfig) -> Option<Duration> {
    match config.analysis_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}
