use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{fetch, list_items, str_field, u64_field, Probe, ProbeContext};
use crate::backend::ToolBackend;
use crate::domain::{HealthScore, ServiceFinding, ServiceId, Thresholds};
use crate::error::AppError;
use crate::normalize::timestamps::now_rfc3339_utc;

/// The degraded floor sits at 40 so that "groups exist but hold no data" reads as
/// DEGRADED; only a missing log estate is CRITICAL.
pub const LOG_STORAGE_THRESHOLDS: Thresholds = Thresholds::new(80, 40);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogGroupSummary {
    pub groups: usize,
    pub stored_bytes: u64,
    pub has_lambda_logs: bool,
}

pub fn summarize_log_groups(groups: &[Value]) -> LogGroupSummary {
    LogGroupSummary {
        groups: groups.len(),
        stored_bytes: groups
            .iter()
            .map(|g| u64_field(g, "stored_bytes"))
            .fold(0u64, |acc, b| acc.saturating_add(b)),
        has_lambda_logs: groups
            .iter()
            .any(|g| str_field(g, "name").is_some_and(|n| n.contains("/aws/lambda/"))),
    }
}

/// 85 when groups hold data, 40 when they exist but are empty, 20 when there are none.
pub fn score_log_groups(summary: &LogGroupSummary) -> HealthScore {
    let score = match (summary.groups, summary.stored_bytes) {
        (0, _) => 20,
        (_, 0) => 40,
        _ => 85,
    };
    LOG_STORAGE_THRESHOLDS.classify(score)
}

/// Log-storage probe over the cloud log API.
pub struct LogStorageProbe {
    backend: Arc<dyn ToolBackend>,
}

impl LogStorageProbe {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Probe for LogStorageProbe {
    fn service(&self) -> ServiceId {
        ServiceId::Aws
    }

    async fn check(&self, _ctx: &ProbeContext) -> Result<ServiceFinding, AppError> {
        let data = fetch(self.backend.as_ref(), "list_log_groups", json!({})).await?;
        let groups = list_items(&data, "log_groups", "log groups")?;

        let summary = summarize_log_groups(groups);
        let health = score_log_groups(&summary);

        let mut issues = Vec::new();
        if summary.groups == 0 {
            issues.push("No CloudWatch log groups found".to_string());
        } else if summary.stored_bytes == 0 {
            issues.push("Log groups exist but contain no data".to_string());
        }

        let mut recommendations = vec![
            "Set up log retention policies".to_string(),
            "Monitor Lambda function metrics".to_string(),
            "Configure CloudWatch alarms".to_string(),
        ];
        if summary.has_lambda_logs {
            recommendations.push("Review Lambda function performance".to_string());
        }

        let evidence = json!({
            "log_groups": data,
            "metrics": {
                "total_log_groups": summary.groups,
                "total_storage_bytes": summary.stored_bytes,
                "has_lambda_logs": summary.has_lambda_logs,
            }
        });

        Ok(ServiceFinding::new(
            health,
            issues,
            recommendations,
            evidence,
            now_rfc3339_utc()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HealthStatus;

    #[test]
    fn scoring_bands() {
        let none = summarize_log_groups(&[]);
        let h = score_log_groups(&none);
        assert_eq!((h.score(), h.status()), (20, HealthStatus::Critical));

        let empty = summarize_log_groups(&[json!({"name": "/app", "stored_bytes": 0})]);
        let h = score_log_groups(&empty);
        assert_eq!((h.score(), h.status()), (40, HealthStatus::Degraded));

        let full = summarize_log_groups(&[
            json!({"name": "/aws/lambda/fn", "stored_bytes": 2048}),
            json!({"name": "/app"}),
        ]);
        assert_eq!(full.stored_bytes, 2048);
        assert!(full.has_lambda_logs);
        let h = score_log_groups(&full);
        assert_eq!((h.score(), h.status()), (85, HealthStatus::Healthy));

        assert_eq!(LOG_STORAGE_THRESHOLDS.classify(79).status(), HealthStatus::Degraded);
        assert_eq!(LOG_STORAGE_THRESHOLDS.classify(39).status(), HealthStatus::Critical);
    }

    #[test]
    fn stored_bytes_saturate_instead_of_overflowing() {
        let huge = summarize_log_groups(&[
            json!({"name": "/a", "stored_bytes": u64::MAX}),
            json!({"name": "/b", "stored_bytes": u64::MAX - 1}),
            json!({"name": "/c", "stored_bytes": 10}),
        ]);
        assert_eq!(huge.stored_bytes, u64::MAX);
        let h = score_log_groups(&huge);
        assert_eq!((h.score(), h.status()), (85, HealthStatus::Healthy));
    }
}
