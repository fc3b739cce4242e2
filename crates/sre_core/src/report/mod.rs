use std::collections::BTreeMap;
use std::time::Instant;

use crate::domain::{IncidentAnalysis, ServiceFinding, ServiceId, Verdict};
use crate::probes::ProbeOutcome;

/// Assembles one `IncidentAnalysis`.
///
/// Contract:
/// - `with_outcomes` yields exactly one finding per requested service. ERROR and missing
///   outcomes become CRITICAL/score-0 placeholders, so the mapping is never partial.
/// - The findings are readable before `build` so the verdict can be synthesized from them.
/// - `execution_time_seconds` is wall-clock time from `started_at` to `build`.
#[derive(Debug)]
pub struct IncidentReportBuilder {
    id: String,
    query: String,
    services_requested: Vec<ServiceId>,
    started_at: Instant,
    findings: BTreeMap<ServiceId, ServiceFinding>,
}

impl IncidentReportBuilder {
    pub fn new(
        id: impl Into<String>,
        query: impl Into<String>,
        services_requested: Vec<ServiceId>,
        started_at: Instant,
    ) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            services_requested,
            started_at,
            findings: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn with_outcomes(mut self, outcomes: Vec<(ServiceId, ProbeOutcome)>, checked_at: &str) -> Self {
        let mut by_service: BTreeMap<ServiceId, ProbeOutcome> = outcomes.into_iter().collect();
        for service in &self.services_requested {
            let finding = match by_service.remove(service) {
                Some(ProbeOutcome::Success { finding }) => finding,
                Some(ProbeOutcome::Error { message }) => {
                    ServiceFinding::failed(&message, checked_at.to_string())
                }
                None => ServiceFinding::failed("No result returned", checked_at.to_string()),
            };
            self.findings.insert(*service, finding);
        }
        self
    }

    pub fn findings(&self) -> &BTreeMap<ServiceId, ServiceFinding> {
        &self.findings
    }

    pub fn build(self, verdict: Verdict, timestamp: String) -> IncidentAnalysis {
        IncidentAnalysis {
            id: self.id,
            timestamp,
            query: self.query,
            services_requested: self.services_requested,
            findings: self.findings,
            verdict,
            execution_time_seconds: self.started_at.elapsed().as_secs_f64(),
        }
    }
}
