use std::time::Instant;

use pretty_assertions::assert_eq;
use serde_json::json;

use sre_core::domain::{HealthStatus, ServiceFinding, ServiceId, Severity, Thresholds, Verdict};
use sre_core::probes::ProbeOutcome;
use sre_core::report::IncidentReportBuilder;

const CHECKED_AT: &str = "2026-03-01T10:00:00Z";

fn verdict() -> Verdict {
    Verdict {
        overall_status: HealthStatus::Critical,
        root_cause_narrative: "CI is failing".to_string(),
        immediate_actions: Vec::new(),
        long_term_recommendations: Vec::new(),
        suggested_commands: Vec::new(),
        severity: Severity::High,
        confidence: 60,
    }
}

#[test]
fn every_requested_service_gets_a_finding() {
    let healthy = ServiceFinding::new(
        Thresholds::new(95, 70).classify(100),
        Vec::new(),
        Vec::new(),
        json!({"metrics": {}}),
        CHECKED_AT.to_string(),
    );
    let requested = vec![ServiceId::K8s, ServiceId::Aws, ServiceId::Github];
    let builder = IncidentReportBuilder::new("analysis_x", "is prod ok", requested.clone(), Instant::now())
        .with_outcomes(
            vec![
                (ServiceId::Github, ProbeOutcome::error("GitHub owner and repo not configured")),
                (ServiceId::K8s, ProbeOutcome::Success { finding: healthy.clone() }),
            ],
            CHECKED_AT,
        );

    assert_eq!(builder.id(), "analysis_x");
    let keys: Vec<ServiceId> = builder.findings().keys().copied().collect();
    assert_eq!(keys, requested);
    assert_eq!(builder.findings()[&ServiceId::K8s], healthy);

    let github = &builder.findings()[&ServiceId::Github];
    assert_eq!(github.status(), HealthStatus::Critical);
    assert_eq!(github.score(), 0);
    assert_eq!(
        github.issues(),
        ["Analysis failed: GitHub owner and repo not configured".to_string()]
    );
    assert_eq!(
        github.raw_evidence(),
        &json!({"error": "GitHub owner and repo not configured"})
    );

    let aws = &builder.findings()[&ServiceId::Aws];
    assert_eq!(aws.issues(), ["Analysis failed: No result returned".to_string()]);
    assert_eq!(aws.checked_at(), CHECKED_AT);

    let analysis = builder.build(verdict(), "2026-03-01T10:00:02Z".to_string());
    assert_eq!(analysis.query, "is prod ok");
    assert_eq!(analysis.services_requested, requested);
    assert_eq!(analysis.findings.len(), 3);
    assert_eq!(analysis.verdict, verdict());
    assert!(analysis.execution_time_seconds >= 0.0);
}

#[test]
fn outcomes_for_unrequested_services_are_dropped() {
    let builder = IncidentReportBuilder::new("a", "q", vec![ServiceId::Aws], Instant::now())
        .with_outcomes(vec![(ServiceId::K8s, ProbeOutcome::error("ignored"))], CHECKED_AT);
    let keys: Vec<ServiceId> = builder.findings().keys().copied().collect();
    assert_eq!(keys, vec![ServiceId::Aws]);
}

#[test]
fn failed_finding_serializes_a_consistent_score_and_status() {
    let finding = ServiceFinding::failed("timed out", CHECKED_AT.to_string());
    let value = serde_json::to_value(&finding).unwrap();
    assert_eq!(value["status"], json!("CRITICAL"));
    assert_eq!(value["score"], json!(0));
    assert_eq!(value["issues"], json!(["Analysis failed: timed out"]));
    assert_eq!(value["checked_at"], json!(CHECKED_AT));
}
