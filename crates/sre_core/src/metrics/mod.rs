use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{HealthStatus, IncidentAnalysis, ServiceId};

/// How many recent analyses feed `analysis_success_rate`.
pub const SUCCESS_RATE_WINDOW: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSnapshot {
    pub status: HealthStatus,
    pub health: u8,
    /// Timestamp of the analysis that saw this service unhealthy, if it did.
    pub last_incident: Option<String>,
    /// The probe's evidence `metrics` object, or null for placeholders.
    pub metrics: Value,
}

/// Dashboard rollup of the most recent analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemMetrics {
    pub overall_health: u8,
    pub services_monitored: usize,
    pub active_incidents: usize,
    pub avg_response_time: f64,
    pub data_freshness: String,
    pub services: BTreeMap<ServiceId, ServiceSnapshot>,
    /// Analyses currently retained in history.
    pub total_analyses: usize,
    /// Percentage of HEALTHY verdicts among the last `SUCCESS_RATE_WINDOW` analyses.
    pub analysis_success_rate: f64,
}

impl SystemMetrics {
    /// Fold history-wide stats into the rollup. `recent` is most recent first and
    /// only its first `SUCCESS_RATE_WINDOW` entries count; an empty window reads 100%.
    pub fn with_analysis_stats(mut self, recent: &[Arc<IncidentAnalysis>], total_analyses: usize) -> Self {
        let window = &recent[..recent.len().min(SUCCESS_RATE_WINDOW)];
        self.total_analyses = total_analyses;
        self.analysis_success_rate = if window.is_empty() {
            100.0
        } else {
            let healthy = window
                .iter()
                .filter(|a| a.verdict.overall_status == HealthStatus::Healthy)
                .count();
            healthy as f64 / window.len() as f64 * 100.0
        };
        self
    }
}

/// Derive system metrics from the latest analysis.
///
/// With no history the system reads as fully healthy with no incidents, every service
/// counted as monitored and `now` as freshness.
pub fn compute_system_metrics(latest: Option<&IncidentAnalysis>, now: &str) -> SystemMetrics {
    let Some(latest) = latest else {
        return SystemMetrics {
            overall_health: 100,
            services_monitored: ServiceId::ALL.len(),
            active_incidents: 0,
            avg_response_time: 0.0,
            data_freshness: now.to_string(),
            services: BTreeMap::new(),
            total_analyses: 0,
            analysis_success_rate: 100.0,
        };
    };

    let scores: Vec<u32> = latest.findings.values().map(|f| u32::from(f.score())).collect();
    let overall_health = if scores.is_empty() {
        100
    } else {
        (scores.iter().sum::<u32>() / scores.len() as u32) as u8
    };

    let services: BTreeMap<ServiceId, ServiceSnapshot> = latest
        .findings
        .iter()
        .map(|(service, f)| {
            let unhealthy = f.status() != HealthStatus::Healthy;
            let snapshot = ServiceSnapshot {
                status: f.status(),
                health: f.score(),
                last_incident: unhealthy.then(|| latest.timestamp.clone()),
                metrics: f.raw_evidence().get("metrics").cloned().unwrap_or(Value::Null),
            };
            (*service, snapshot)
        })
        .collect();

    SystemMetrics {
        overall_health,
        services_monitored: latest.findings.len(),
        active_incidents: services.values().filter(|s| s.last_incident.is_some()).count(),
        avg_response_time: latest.execution_time_seconds,
        data_freshness: latest.timestamp.clone(),
        services,
        total_analyses: 0,
        analysis_success_rate: 100.0,
    }
}
