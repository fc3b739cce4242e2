use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{fetch, list_items, str_field, u64_field, Probe, ProbeContext};
use crate::backend::ToolBackend;
use crate::domain::{HealthScore, ServiceFinding, ServiceId, Thresholds};
use crate::error::AppError;
use crate::normalize::timestamps::now_rfc3339_utc;

pub const K8S_THRESHOLDS: Thresholds = Thresholds::new(95, 70);

const HIGH_RESTART_COUNT: u64 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodCounts {
    pub total: usize,
    pub running: usize,
    pub failed: usize,
    pub pending: usize,
    pub high_restart: Vec<String>,
}

pub fn count_pods(pods: &[Value]) -> PodCounts {
    let mut counts = PodCounts {
        total: pods.len(),
        ..Default::default()
    };
    for (i, pod) in pods.iter().enumerate() {
        if !pod.is_object() {
            continue;
        }
        match str_field(pod, "phase") {
            Some("Running") => counts.running += 1,
            Some("Failed") | Some("Unknown") => counts.failed += 1,
            Some("Pending") => counts.pending += 1,
            _ => {}
        }
        if u64_field(pod, "restarts") > HIGH_RESTART_COUNT {
            let name = str_field(pod, "name")
                .map(str::to_string)
                .unwrap_or_else(|| format!("pod-{i}"));
            counts.high_restart.push(name);
        }
    }
    counts
}

/// `100 * running / total`, truncated; an empty cluster scores 0.
pub fn score_pods(counts: &PodCounts) -> HealthScore {
    let score = if counts.total == 0 {
        0
    } else {
        (counts.running * 100 / counts.total) as u8
    };
    K8S_THRESHOLDS.classify(score)
}

fn issues_for(counts: &PodCounts) -> Vec<String> {
    let mut issues = Vec::new();
    if counts.running < counts.total {
        issues.push(format!("{} pods not running", counts.total - counts.running));
        if counts.failed > 0 {
            issues.push(format!("{} pods in failed state", counts.failed));
        }
        if counts.pending > 0 {
            issues.push(format!("{} pods pending", counts.pending));
        }
    }
    if !counts.high_restart.is_empty() {
        let shown: Vec<&str> = counts.high_restart.iter().take(3).map(String::as_str).collect();
        issues.push(format!(
            "{} pods with high restart counts: {}",
            counts.high_restart.len(),
            shown.join(", ")
        ));
    }
    issues
}

fn recommendations_for(counts: &PodCounts) -> Vec<String> {
    let mut recs = vec![
        "Monitor pod resource usage and set appropriate limits".to_string(),
        "Set up alerts for pod restarts and failures".to_string(),
        "Review node capacity and resource allocation".to_string(),
    ];
    if counts.failed > 0 {
        recs.push("Investigate failed pods using kubectl describe and logs".to_string());
    }
    if counts.pending > 0 {
        recs.push("Check resource quotas and node availability for pending pods".to_string());
    }
    recs
}

/// Orchestration probe: lists pods in the configured namespace, then nodes.
pub struct K8sProbe {
    backend: Arc<dyn ToolBackend>,
}

impl K8sProbe {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Probe for K8sProbe {
    fn service(&self) -> ServiceId {
        ServiceId::K8s
    }

    async fn check(&self, ctx: &ProbeContext) -> Result<ServiceFinding, AppError> {
        let pods_data = fetch(
            self.backend.as_ref(),
            "list_pods",
            json!({ "namespace": ctx.k8s_namespace }),
        )
        .await
        .map_err(|e| e.with_context("Failed to get pods"))?;

        let nodes_data = fetch(self.backend.as_ref(), "get_nodes", json!({}))
            .await
            .map_err(|e| e.with_context("Failed to get nodes"))?;

        let pods = list_items(&pods_data, "pods", "pods")?;
        let node_count = list_items(&nodes_data, "nodes", "nodes")
            .map(|n| n.len())
            .ok();

        let counts = count_pods(pods);
        let health = score_pods(&counts);

        let evidence = json!({
            "pods": pods_data,
            "nodes": nodes_data,
            "metrics": {
                "total_pods": counts.total,
                "running_pods": counts.running,
                "failed_pods": counts.failed,
                "pending_pods": counts.pending,
                "total_nodes": node_count,
                "health_score": health.score(),
            }
        });

        Ok(ServiceFinding::new(
            health,
            issues_for(&counts),
            recommendations_for(&counts),
            evidence,
            now_rfc3339_utc()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HealthStatus;

    fn pods(running: usize, total: usize) -> Vec<Value> {
        (0..total)
            .map(|i| {
                let phase = if i < running { "Running" } else { "Pending" };
                json!({"name": format!("p{i}"), "phase": phase, "restarts": 0})
            })
            .collect()
    }

    #[test]
    fn scoring_bands() {
        let h = score_pods(&count_pods(&pods(6, 8)));
        assert_eq!((h.score(), h.status()), (75, HealthStatus::Degraded));

        let h = score_pods(&count_pods(&pods(10, 10)));
        assert_eq!((h.score(), h.status()), (100, HealthStatus::Healthy));

        let h = score_pods(&count_pods(&[]));
        assert_eq!((h.score(), h.status()), (0, HealthStatus::Critical));

        let h = score_pods(&count_pods(&pods(19, 20)));
        assert_eq!((h.score(), h.status()), (95, HealthStatus::Healthy));

        let h = score_pods(&count_pods(&pods(2, 3)));
        assert_eq!((h.score(), h.status()), (66, HealthStatus::Critical));
    }

    #[test]
    fn counts_failed_pending_and_restarts() {
        let list = vec![
            json!({"name": "a", "phase": "Running", "restarts": 12}),
            json!({"name": "b", "phase": "Failed"}),
            json!({"name": "c", "phase": "Unknown"}),
            json!({"name": "d", "phase": "Pending"}),
            json!("garbage"),
        ];
        let c = count_pods(&list);
        assert_eq!(c.total, 5);
        assert_eq!(c.running, 1);
        assert_eq!(c.failed, 2);
        assert_eq!(c.pending, 1);
        assert_eq!(c.high_restart, vec!["a".to_string()]);

        let issues = issues_for(&c);
        assert_eq!(
            issues,
            vec![
                "4 pods not running".to_string(),
                "2 pods in failed state".to_string(),
                "1 pods pending".to_string(),
                "1 pods with high restart counts: a".to_string(),
            ]
        );
        assert_eq!(recommendations_for(&c).len(), 5);
    }
}
