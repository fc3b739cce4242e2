use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use sre_core::backend::{BackendSet, ToolBackend};
use sre_core::domain::ServiceId;
use sre_core::error::AppError;
use sre_core::normalize::{RawResult, ToolResponse};
use sre_core::probes::ProbeRegistry;

/// Envelope key marking a fixture as a tool-response wrapper rather than plain data.
pub const WRAPPER_KEY: &str = "tool_response";

/// Answers `op` from `<root>/<service>/<op>.json`.
///
/// A file holding `{"tool_response": {...}}` is replayed as a wrapped response;
/// anything else is replayed as plain data. A missing file is a transport error.
#[derive(Debug, Clone)]
pub struct FixtureBackend {
    name: String,
    dir: PathBuf,
}

impl FixtureBackend {
    pub fn new(root: &Path, service: ServiceId) -> Self {
        Self {
            name: format!("fixtures:{service}"),
            dir: root.join(service.as_str()),
        }
    }

    fn path_for(&self, op: &str) -> Result<PathBuf, AppError> {
        if op.is_empty() || !op.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(AppError::new("BACKEND_OP_UNSUPPORTED", "Invalid operation name")
                .with_details(format!("op={op}")));
        }
        Ok(self.dir.join(format!("{op}.json")))
    }
}

#[async_trait]
impl ToolBackend for FixtureBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call_tool(&self, op: &str, args: Value) -> Result<RawResult, AppError> {
        let path = self.path_for(op)?;
        debug!(backend = %self.name, op, %args, path = %path.display(), "replaying fixture");
        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            AppError::new("BACKEND_UNREACHABLE", format!("No fixture for {op}"))
                .with_details(format!("path={}; err={e}", path.display()))
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            AppError::new("BACKEND_BAD_RESPONSE", format!("Fixture for {op} is not valid JSON"))
                .with_details(format!("path={}; err={e}", path.display()))
        })?;
        into_raw_result(value)
    }
}

fn into_raw_result(value: Value) -> Result<RawResult, AppError> {
    match value {
        Value::Object(mut obj) if obj.len() == 1 && obj.contains_key(WRAPPER_KEY) => {
            let inner = obj.remove(WRAPPER_KEY).unwrap_or(Value::Null);
            let wrapper: ToolResponse = serde_json::from_value(inner).map_err(|e| {
                AppError::new("BACKEND_BAD_RESPONSE", "Fixture wrapper has an invalid shape")
                    .with_details(e.to_string())
            })?;
            Ok(RawResult::Wrapped(wrapper))
        }
        other => Ok(RawResult::Value(other)),
    }
}

/// One fixture backend per service, each over its own directory.
pub fn fixture_backends(root: &Path) -> BackendSet {
    ServiceId::ALL.into_iter().fold(BackendSet::new(), |set, service| {
        let backend: Arc<dyn ToolBackend> = Arc::new(FixtureBackend::new(root, service));
        set.with_backend(service, backend)
    })
}

/// The standard probes over `fixture_backends`.
pub fn fixture_registry(root: &Path) -> ProbeRegistry {
    ProbeRegistry::from_backends(&fixture_backends(root))
}
