use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;

use sre_core::domain::{HealthScore, ServiceFinding, ServiceId, Thresholds};
use sre_core::error::AppError;
use sre_core::fanout::FanOutCoordinator;
use sre_core::probes::{Probe, ProbeContext, ProbeOutcome, ProbeRegistry};

enum Behavior {
    Healthy { delay_ms: u64 },
    Fail,
    Panic,
    Hang,
}

struct ScriptedProbe {
    service: ServiceId,
    behavior: Behavior,
}

impl ScriptedProbe {
    fn arc(service: ServiceId, behavior: Behavior) -> Arc<dyn Probe> {
        Arc::new(Self { service, behavior })
    }
}

fn healthy_finding() -> ServiceFinding {
    let health: HealthScore = Thresholds::new(80, 50).classify(90);
    ServiceFinding::new(
        health,
        Vec::new(),
        Vec::new(),
        json!({}),
        "2026-01-01T00:00:00Z".to_string(),
    )
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn service(&self) -> ServiceId {
        self.service
    }

    async fn check(&self, _ctx: &ProbeContext) -> Result<ServiceFinding, AppError> {
        match self.behavior {
            Behavior::Healthy { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(healthy_finding())
            }
            Behavior::Fail => Err(AppError::new("PROBE_BACKEND_ERROR", "backend down")),
            Behavior::Panic => panic!("probe exploded"),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(healthy_finding())
            }
        }
    }
}

fn message(outcome: &ProbeOutcome) -> &str {
    match outcome {
        ProbeOutcome::Error { message } => message,
        ProbeOutcome::Success { .. } => panic!("expected an error outcome"),
    }
}

#[tokio::test]
async fn outcomes_follow_selection_order_not_completion_order() {
    let registry = ProbeRegistry::new()
        .with_probe(ScriptedProbe::arc(ServiceId::K8s, Behavior::Healthy { delay_ms: 60 }))
        .with_probe(ScriptedProbe::arc(ServiceId::Aws, Behavior::Healthy { delay_ms: 0 }))
        .with_probe(ScriptedProbe::arc(ServiceId::Github, Behavior::Healthy { delay_ms: 20 }));

    let selected = [ServiceId::K8s, ServiceId::Aws, ServiceId::Github];
    let outcomes = FanOutCoordinator::new(registry)
        .run(&selected, &ProbeContext::default())
        .await;

    let services: Vec<ServiceId> = outcomes.iter().map(|(s, _)| *s).collect();
    assert_eq!(services, selected.to_vec());
    assert!(outcomes.iter().all(|(_, o)| o.is_success()));
}

#[tokio::test]
async fn a_panicking_probe_does_not_disturb_its_siblings() {
    let registry = ProbeRegistry::new()
        .with_probe(ScriptedProbe::arc(ServiceId::K8s, Behavior::Panic))
        .with_probe(ScriptedProbe::arc(ServiceId::Aws, Behavior::Fail))
        .with_probe(ScriptedProbe::arc(ServiceId::Github, Behavior::Healthy { delay_ms: 5 }));

    let outcomes = FanOutCoordinator::new(registry)
        .run(&ServiceId::ALL, &ProbeContext::default())
        .await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(message(&outcomes[0].1), "Probe task panicked: probe exploded");
    assert_eq!(message(&outcomes[1].1), "backend down");
    assert!(outcomes[2].1.is_success());
}

#[tokio::test]
async fn slow_probes_time_out_individually() {
    let registry = ProbeRegistry::new()
        .with_probe(ScriptedProbe::arc(ServiceId::K8s, Behavior::Hang))
        .with_probe(ScriptedProbe::arc(ServiceId::Github, Behavior::Healthy { delay_ms: 0 }));

    let outcomes = FanOutCoordinator::new(registry)
        .with_probe_timeout(Some(Duration::from_millis(50)))
        .run(&[ServiceId::K8s, ServiceId::Github], &ProbeContext::default())
        .await;

    assert_eq!(message(&outcomes[0].1), "Probe timed out after 50ms");
    assert!(outcomes[1].1.is_success());
}

#[tokio::test]
async fn unregistered_services_report_an_error() {
    let outcomes = FanOutCoordinator::new(ProbeRegistry::new())
        .run(&[ServiceId::Aws], &ProbeContext::default())
        .await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].0, ServiceId::Aws);
    assert_eq!(message(&outcomes[0].1), "No probe registered for service");
}

#[tokio::test]
async fn empty_selection_runs_nothing() {
    let outcomes = FanOutCoordinator::new(ProbeRegistry::new())
        .run(&[], &ProbeContext::default())
        .await;
    assert!(outcomes.is_empty());
}
