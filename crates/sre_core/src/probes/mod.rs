use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{BackendSet, ToolBackend};
use crate::config::AgentConfig;
use crate::domain::{ServiceFinding, ServiceId};
use crate::error::AppError;
use crate::normalize::{extract_error, has_error, normalize};

pub mod ci;
pub mod k8s;
pub mod logs;

pub use ci::CiProbe;
pub use k8s::K8sProbe;
pub use logs::LogStorageProbe;

/// Per-run inputs the probes need from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeContext {
    pub k8s_namespace: String,
    pub aws_region: String,
    pub github_owner: String,
    pub github_repo: String,
}

impl ProbeContext {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            k8s_namespace: config.k8s_namespace.clone(),
            aws_region: config.aws_region.clone(),
            github_owner: config.github_owner.clone(),
            github_repo: config.github_repo.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeOutcome {
    Success { finding: ServiceFinding },
    Error { message: String },
}

impl ProbeOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        ProbeOutcome::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }
}

/// A per-backend health check.
///
/// Implementors only write `check`; `probe` is the failure boundary that folds any
/// error into an `ERROR` outcome so nothing escapes to the coordinator.
#[async_trait]
pub trait Probe: Send + Sync {
    fn service(&self) -> ServiceId;

    async fn check(&self, ctx: &ProbeContext) -> Result<ServiceFinding, AppError>;

    async fn probe(&self, ctx: &ProbeContext) -> ProbeOutcome {
        let service = self.service();
        match self.check(ctx).await {
            Ok(finding) => {
                info!(
                    %service,
                    status = finding.status().as_str(),
                    score = finding.score(),
                    issues = finding.issues().len(),
                    "probe finished"
                );
                ProbeOutcome::Success { finding }
            }
            Err(e) => {
                warn!(%service, code = %e.code, error = %e.message, "probe failed");
                ProbeOutcome::error(e.outcome_message())
            }
        }
    }
}

/// The probes available to the coordinator, keyed by service.
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    probes: BTreeMap<ServiceId, Arc<dyn Probe>>,
}

impl fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("services", &self.probes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three standard probes over their respective backends.
    pub fn standard(
        orchestration: Arc<dyn ToolBackend>,
        log_storage: Arc<dyn ToolBackend>,
        ci: Arc<dyn ToolBackend>,
    ) -> Self {
        Self::from_backends(&BackendSet::standard(orchestration, log_storage, ci))
    }

    /// One probe per service that has a backend.
    pub fn from_backends(backends: &BackendSet) -> Self {
        backends.iter().fold(Self::new(), |registry, (service, backend)| {
            let backend = Arc::clone(backend);
            let probe: Arc<dyn Probe> = match service {
                ServiceId::K8s => Arc::new(K8sProbe::new(backend)),
                ServiceId::Aws => Arc::new(LogStorageProbe::new(backend)),
                ServiceId::Github => Arc::new(CiProbe::new(backend)),
            };
            registry.with_probe(probe)
        })
    }

    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probes.insert(probe.service(), probe);
        self
    }

    pub fn get(&self, service: ServiceId) -> Option<Arc<dyn Probe>> {
        self.probes.get(&service).cloned()
    }
}

fn shape_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Call one backend operation, normalize its result and surface embedded error markers.
pub(crate) async fn fetch(
    backend: &dyn ToolBackend,
    op: &str,
    args: Value,
) -> Result<Value, AppError> {
    let raw = backend.call_tool(op, args).await?;
    let value = normalize(raw);
    debug!(backend = backend.name(), op, shape = shape_of(&value), "tool result normalized");
    if has_error(&value) {
        return Err(AppError::new("PROBE_BACKEND_ERROR", extract_error(&value)));
    }
    Ok(value)
}

/// Accept either a bare list or an object carrying the list under `key`.
/// An object without `key` yields no items.
pub(crate) fn list_items<'a>(value: &'a Value, key: &str, what: &str) -> Result<&'a [Value], AppError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(o) => match o.get(key) {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(AppError::new(
                "PROBE_SHAPE_INVALID",
                format!("Unexpected {what} data format: {key} is a {}", shape_of(other)),
            )),
        },
        other => Err(AppError::new(
            "PROBE_SHAPE_INVALID",
            format!("Unexpected {what} data format: {}", shape_of(other)),
        )),
    }
}

pub(crate) fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.as_object().and_then(|o| o.get(key)).and_then(Value::as_str)
}

pub(crate) fn u64_field(item: &Value, key: &str) -> u64 {
    item.as_object()
        .and_then(|o| o.get(key))
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_items_tolerates_both_shapes() {
        let list = json!([{"a": 1}]);
        assert_eq!(list_items(&list, "pods", "pods").unwrap().len(), 1);

        let obj = json!({"pods": [{"a": 1}, {"a": 2}], "count": 2});
        assert_eq!(list_items(&obj, "pods", "pods").unwrap().len(), 2);

        let missing = json!({"count": 0});
        assert!(list_items(&missing, "pods", "pods").unwrap().is_empty());

        let err = list_items(&json!("text"), "pods", "pods").expect_err("should fail");
        assert_eq!(err.code, "PROBE_SHAPE_INVALID");
        assert_eq!(err.message, "Unexpected pods data format: string");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let v = serde_json::to_value(ProbeOutcome::error("boom")).unwrap();
        assert_eq!(v, json!({"status": "ERROR", "message": "boom"}));
    }
}
