use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{fetch, list_items, str_field, Probe, ProbeContext};
use crate::backend::ToolBackend;
use crate::domain::{HealthScore, ServiceFinding, ServiceId, Thresholds};
use crate::error::AppError;
use crate::normalize::timestamps::now_rfc3339_utc;

/// CI has no CRITICAL band: anything short of HEALTHY is DEGRADED.
pub const CI_THRESHOLDS: Thresholds = Thresholds::new(80, 0);

const RECENT_RUNS_LIMIT: u64 = 5;

pub fn score_workflow(latest_succeeded: bool) -> HealthScore {
    CI_THRESHOLDS.classify(if latest_succeeded { 95 } else { 30 })
}

/// Fraction of runs with a `success` conclusion; no runs counts as fully successful.
pub fn success_rate(runs: &[Value]) -> f64 {
    if runs.is_empty() {
        return 1.0;
    }
    let ok = runs
        .iter()
        .filter(|r| str_field(r, "conclusion") == Some("success"))
        .count();
    ok as f64 / runs.len() as f64
}

/// CI/CD probe: workflow health first, then the most recent runs for context.
pub struct CiProbe {
    backend: Arc<dyn ToolBackend>,
}

impl CiProbe {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Probe for CiProbe {
    fn service(&self) -> ServiceId {
        ServiceId::Github
    }

    async fn check(&self, ctx: &ProbeContext) -> Result<ServiceFinding, AppError> {
        if ctx.github_owner.trim().is_empty() || ctx.github_repo.trim().is_empty() {
            return Err(AppError::new(
                "PROBE_NOT_CONFIGURED",
                "GitHub owner and repo not configured",
            ));
        }
        let repo_args = json!({ "owner": ctx.github_owner, "repo": ctx.github_repo });

        let health_data = fetch(self.backend.as_ref(), "check_workflow_health", repo_args.clone()).await?;
        if !health_data.is_object() {
            return Err(AppError::new(
                "PROBE_SHAPE_INVALID",
                "Unexpected workflow health data format",
            ));
        }

        let mut runs_args = repo_args;
        runs_args["limit"] = json!(RECENT_RUNS_LIMIT);
        let runs_data = fetch(self.backend.as_ref(), "list_workflow_runs", runs_args).await?;
        let runs = list_items(&runs_data, "runs", "workflow runs")?;

        let workflow_status = str_field(&health_data, "status").unwrap_or("unknown");
        let succeeded = workflow_status == "success";
        let health = score_workflow(succeeded);

        let issues = if succeeded {
            Vec::new()
        } else {
            vec!["Recent workflow failures detected".to_string()]
        };
        let recommendations = vec![
            "Monitor workflow success rates".to_string(),
            "Set up failure notifications".to_string(),
            "Review CI/CD pipeline performance".to_string(),
        ];

        let evidence = json!({
            "workflow_health": health_data,
            "recent_runs": runs_data,
            "metrics": {
                "workflow_status": workflow_status,
                "success_rate": success_rate(runs),
                "total_recent_runs": runs.len(),
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
    fn non_success_is_degraded_not_critical() {
        let h = score_workflow(true);
        assert_eq!((h.score(), h.status()), (95, HealthStatus::Healthy));
        let h = score_workflow(false);
        assert_eq!((h.score(), h.status()), (30, HealthStatus::Degraded));
    }

    #[test]
    fn success_rate_over_recent_runs() {
        assert_eq!(success_rate(&[]), 1.0);
        let runs = [
            json!({"conclusion": "success"}),
            json!({"conclusion": "failure"}),
            json!({"conclusion": "success"}),
            json!({"conclusion": null}),
        ];
        assert_eq!(success_rate(&runs), 0.5);
    }
}
