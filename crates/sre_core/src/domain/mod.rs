use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Backend identifiers. Declaration order is the fixed routing priority
/// (orchestration, log storage, CI), which `Ord` and `ALL` both follow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    K8s,
    Aws,
    Github,
}

impl ServiceId {
    pub const ALL: [ServiceId; 3] = [ServiceId::K8s, ServiceId::Aws, ServiceId::Github];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::K8s => "k8s",
            ServiceId::Aws => "aws",
            ServiceId::Github => "github",
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "k8s" | "kubernetes" => Ok(ServiceId::K8s),
            "aws" | "cloudwatch" => Ok(ServiceId::Aws),
            "github" | "ci" => Ok(ServiceId::Github),
            other => Err(AppError::new("SERVICE_UNKNOWN", "Unknown service identifier")
                .with_details(format!("service={other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Degraded => "DEGRADED",
            HealthStatus::Critical => "CRITICAL",
            HealthStatus::Unknown => "UNKNOWN",
        }
    }

    /// Case-insensitive parse used on model replies.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HEALTHY" => Some(HealthStatus::Healthy),
            "DEGRADED" => Some(HealthStatus::Degraded),
            "CRITICAL" => Some(HealthStatus::Critical),
            "UNKNOWN" => Some(HealthStatus::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(AppError::new("PRIORITY_UNKNOWN", "Unknown request priority")
                .with_details(format!("priority={other}"))),
        }
    }
}

/// Score bands for one probe. Scores at or above `healthy` are HEALTHY, scores at or
/// above `degraded` are DEGRADED, anything lower is CRITICAL. A `degraded` floor of 0
/// means the probe has no CRITICAL band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub healthy: u8,
    pub degraded: u8,
}

impl Thresholds {
    pub const fn new(healthy: u8, degraded: u8) -> Self {
        Self { healthy, degraded }
    }

    pub fn classify(&self, score: u8) -> HealthScore {
        let score = score.min(100);
        let status = if score >= self.healthy {
            HealthStatus::Healthy
        } else if score >= self.degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Critical
        };
        HealthScore { score, status }
    }
}

/// A score and the status derived from it. Only `Thresholds::classify` and
/// `HealthScore::failed` produce one, so the pair never drifts apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthScore {
    score: u8,
    status: HealthStatus,
}

impl HealthScore {
    pub fn failed() -> Self {
        Self {
            score: 0,
            status: HealthStatus::Critical,
        }
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }
}

/// Per-backend health snapshot. Immutable after construction.
///
/// Write-only on the wire: there is no `Deserialize`, so a score and status can only
/// meet through `HealthScore`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceFinding {
    status: HealthStatus,
    score: u8,
    issues: Vec<String>,
    recommendations: Vec<String>,
    raw_evidence: Value,
    checked_at: String, // RFC3339
}

impl ServiceFinding {
    pub fn new(
        health: HealthScore,
        issues: Vec<String>,
        recommendations: Vec<String>,
        raw_evidence: Value,
        checked_at: String,
    ) -> Self {
        Self {
            status: health.status,
            score: health.score,
            issues,
            recommendations,
            raw_evidence,
            checked_at,
        }
    }

    /// Placeholder for a service whose probe errored or never reported.
    pub fn failed(message: &str, checked_at: String) -> Self {
        Self::new(
            HealthScore::failed(),
            vec![format!("Analysis failed: {message}")],
            Vec::new(),
            serde_json::json!({ "error": message }),
            checked_at,
        )
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn raw_evidence(&self) -> &Value {
        &self.raw_evidence
    }

    pub fn checked_at(&self) -> &str {
        &self.checked_at
    }
}

/// Cross-service root-cause judgment, either from the reasoning backend or a
/// deterministic fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
    pub overall_status: HealthStatus,
    pub root_cause_narrative: String,
    pub immediate_actions: Vec<String>,
    pub long_term_recommendations: Vec<String>,
    pub suggested_commands: Vec<String>,
    pub severity: Severity,
    pub confidence: u8,
}

/// One aggregation result as stored in history.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IncidentAnalysis {
    pub id: String,
    pub timestamp: String, // RFC3339
    pub query: String,
    pub services_requested: Vec<ServiceId>,
    pub findings: BTreeMap<ServiceId, ServiceFinding>,
    pub verdict: Verdict,
    pub execution_time_seconds: f64,
}
