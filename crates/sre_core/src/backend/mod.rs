use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ServiceId;
use crate::error::AppError;
use crate::normalize::RawResult;

/// One backend adapter (orchestration, log storage, CI). Transport, auth and retry
/// policy live behind this seam; the engine only sees opaque tool results.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn call_tool(&self, op: &str, args: Value) -> Result<RawResult, AppError>;
}

/// The backend behind each service. Probes and connection checks are both built over it.
#[derive(Clone, Default)]
pub struct BackendSet {
    backends: BTreeMap<ServiceId, Arc<dyn ToolBackend>>,
}

impl fmt::Debug for BackendSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: BTreeMap<ServiceId, &str> =
            self.backends.iter().map(|(s, b)| (*s, b.name())).collect();
        f.debug_struct("BackendSet").field("backends", &names).finish()
    }
}

impl BackendSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard(
        orchestration: Arc<dyn ToolBackend>,
        log_storage: Arc<dyn ToolBackend>,
        ci: Arc<dyn ToolBackend>,
    ) -> Self {
        Self::new()
            .with_backend(ServiceId::K8s, orchestration)
            .with_backend(ServiceId::Aws, log_storage)
            .with_backend(ServiceId::Github, ci)
    }

    pub fn with_backend(mut self, service: ServiceId, backend: Arc<dyn ToolBackend>) -> Self {
        self.backends.insert(service, backend);
        self
    }

    pub fn get(&self, service: ServiceId) -> Option<Arc<dyn ToolBackend>> {
        self.backends.get(&service).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ServiceId, &Arc<dyn ToolBackend>)> {
        self.backends.iter().map(|(s, b)| (*s, b))
    }
}

/// In-memory backend answering each op with a canned reply. Used by the demo mode and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
    name: String,
    replies: BTreeMap<String, Result<RawResult, AppError>>,
}

impl StaticBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: BTreeMap::new(),
        }
    }

    pub fn with_reply(mut self, op: &str, reply: impl Into<RawResult>) -> Self {
        self.replies.insert(op.to_string(), Ok(reply.into()));
        self
    }

    pub fn with_failure(mut self, op: &str, err: AppError) -> Self {
        self.replies.insert(op.to_string(), Err(err));
        self
    }
}

#[async_trait]
impl ToolBackend for StaticBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call_tool(&self, op: &str, _args: Value) -> Result<RawResult, AppError> {
        match self.replies.get(op) {
            Some(reply) => reply.clone(),
            None => Err(AppError::new("BACKEND_OP_UNSUPPORTED", "Backend has no such operation")
                .with_details(format!("backend={}; op={op}", self.name))),
        }
    }
}
