use std::collections::BTreeMap;

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::backend::{BackendSet, ToolBackend};
use crate::domain::{HealthStatus, ServiceId};
use crate::error::AppError;
use crate::probes::{fetch, list_items, str_field, ProbeContext};

/// Result of one lightweight reachability call against a service backend.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConnectionCheck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Normalized reply of the check call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ConnectionCheck {
    fn connected(message: String, data: Value) -> Self {
        Self {
            success: true,
            message: Some(message),
            error: None,
            data: Some(data),
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConnectionReport {
    /// HEALTHY only when every checked backend answered.
    pub overall_status: HealthStatus,
    pub successful_connections: usize,
    pub total_connections: usize,
    pub results: BTreeMap<ServiceId, ConnectionCheck>,
}

fn label(service: ServiceId) -> &'static str {
    match service {
        ServiceId::K8s => "Kubernetes",
        ServiceId::Aws => "AWS",
        ServiceId::Github => "GitHub",
    }
}

/// `count` when the backend reports one, otherwise the length of the `key` list.
fn item_count(data: &Value, key: &str) -> usize {
    data.get("count")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or_else(|| list_items(data, key, key).map_or(0, <[Value]>::len))
}

async fn call(
    backend: &dyn ToolBackend,
    service: ServiceId,
    ctx: &ProbeContext,
) -> Result<ConnectionCheck, AppError> {
    let check = match service {
        ServiceId::K8s => {
            let data = fetch(backend, "list_pods", json!({ "namespace": ctx.k8s_namespace })).await?;
            let pods = item_count(&data, "pods");
            ConnectionCheck::connected(format!("Kubernetes connected successfully - {pods} pods found"), data)
        }
        ServiceId::Aws => {
            let data = fetch(backend, "list_log_groups", json!({})).await?;
            let groups = item_count(&data, "log_groups");
            ConnectionCheck::connected(format!("AWS connected successfully - {groups} log groups found"), data)
        }
        ServiceId::Github => {
            if ctx.github_owner.trim().is_empty() || ctx.github_repo.trim().is_empty() {
                return Ok(ConnectionCheck::failed("GitHub owner and repository not configured"));
            }
            let args = json!({ "owner": ctx.github_owner, "repo": ctx.github_repo });
            let data = fetch(backend, "check_workflow_health", args).await?;
            let status = str_field(&data, "status").unwrap_or("unknown").to_string();
            ConnectionCheck::connected(format!("GitHub connected successfully - Status: {status}"), data)
        }
    };
    Ok(check)
}

/// Check one service backend. Never fails: errors come back as `success: false`.
pub async fn check_connection(
    backends: &BackendSet,
    service: ServiceId,
    ctx: &ProbeContext,
) -> ConnectionCheck {
    let Some(backend) = backends.get(service) else {
        warn!(%service, "no backend configured");
        return ConnectionCheck::failed(format!("No backend configured for {}", label(service)));
    };
    match call(backend.as_ref(), service, ctx).await {
        Ok(check) => {
            info!(%service, backend = backend.name(), success = check.success, "connection checked");
            check
        }
        Err(e) => {
            warn!(%service, backend = backend.name(), code = %e.code, error = %e.message, "connection failed");
            ConnectionCheck::failed(format!("{} connection failed: {}", label(service), e.outcome_message()))
        }
    }
}

/// Check the given services concurrently and roll the results up.
pub async fn check_connections(
    backends: &BackendSet,
    services: &[ServiceId],
    ctx: &ProbeContext,
) -> ConnectionReport {
    let checks = join_all(services.iter().map(|&s| check_connection(backends, s, ctx))).await;
    let results: BTreeMap<ServiceId, ConnectionCheck> =
        services.iter().copied().zip(checks).collect();

    let successful_connections = results.values().filter(|c| c.success).count();
    let total_connections = results.len();
    let overall_status = if successful_connections == total_connections {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };
    ConnectionReport {
        overall_status,
        successful_connections,
        total_connections,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_prefer_the_reported_total() {
        assert_eq!(item_count(&json!({"pods": [1, 2], "count": 8}), "pods"), 8);
        assert_eq!(item_count(&json!({"log_groups": [{}, {}]}), "log_groups"), 2);
        assert_eq!(item_count(&json!([{}, {}, {}]), "pods"), 3);
        assert_eq!(item_count(&json!("text"), "pods"), 0);
    }
}
