use std::sync::Arc;

use serde_json::{json, Value};

use crate::backend::{BackendSet, StaticBackend, ToolBackend};
use crate::normalize::{ContentChunk, ToolResponse};
use crate::probes::ProbeRegistry;

fn demo_pods() -> Value {
    // Deterministic namespace: 8 pods, 6 running, one crash-looping.
    let mut pods = Vec::new();
    for i in 1..=6 {
        let restarts = if i == 3 { 9 } else { 0 };
        pods.push(json!({
            "name": format!("checkout-{i}"),
            "phase": "Running",
            "restarts": restarts,
        }));
    }
    pods.push(json!({"name": "payments-worker-1", "phase": "Failed", "restarts": 14}));
    pods.push(json!({"name": "payments-worker-2", "phase": "Pending", "restarts": 0}));
    json!({ "pods": pods, "count": 8 })
}

/// Orchestration backend answering in the structured-content wrapper shape.
pub fn demo_orchestration_backend() -> StaticBackend {
    StaticBackend::new("demo-k8s")
        .with_reply(
            "list_pods",
            ToolResponse {
                structured_content: Some(json!({ "result": demo_pods() })),
                ..Default::default()
            },
        )
        .with_reply(
            "get_nodes",
            json!([
                {"name": "node-a", "status": "Ready"},
                {"name": "node-b", "status": "Ready"},
            ]),
        )
}

/// Log-storage backend answering with JSON text chunks.
pub fn demo_log_storage_backend() -> StaticBackend {
    let groups = json!({
        "log_groups": [
            {"name": "/aws/lambda/checkout-handler", "stored_bytes": 1_048_576},
            {"name": "/ecs/payments", "stored_bytes": 0},
        ]
    });
    StaticBackend::new("demo-logs").with_reply(
        "list_log_groups",
        ToolResponse {
            content: vec![ContentChunk::text(groups.to_string())],
            ..Default::default()
        },
    )
}

/// CI backend with a failing latest workflow.
pub fn demo_ci_backend() -> StaticBackend {
    StaticBackend::new("demo-ci")
        .with_reply(
            "check_workflow_health",
            json!({"status": "failure", "workflow": "deploy.yml"}),
        )
        .with_reply(
            "list_workflow_runs",
            ToolResponse {
                data: Some(json!({
                    "runs": [
                        {"id": 105, "conclusion": "failure"},
                        {"id": 104, "conclusion": "success"},
                        {"id": 103, "conclusion": "success"},
                        {"id": 102, "conclusion": "success"},
                        {"id": 101, "conclusion": "failure"},
                    ]
                })),
                ..Default::default()
            },
        )
}

pub fn demo_backends() -> BackendSet {
    let k8s: Arc<dyn ToolBackend> = Arc::new(demo_orchestration_backend());
    let logs: Arc<dyn ToolBackend> = Arc::new(demo_log_storage_backend());
    let ci: Arc<dyn ToolBackend> = Arc::new(demo_ci_backend());
    BackendSet::standard(k8s, logs, ci)
}

pub fn demo_registry() -> ProbeRegistry {
    ProbeRegistry::from_backends(&demo_backends())
}
