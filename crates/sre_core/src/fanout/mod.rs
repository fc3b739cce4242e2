use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

use crate::domain::ServiceId;
use crate::probes::{ProbeContext, ProbeOutcome, ProbeRegistry};

/// Runs the selected probes concurrently, one task each.
///
/// Every task is awaited. A panic, timeout or missing probe becomes that service's
/// `ERROR` outcome and never disturbs the others. Outcomes are paired with services by
/// index, so the result follows `selected` order regardless of completion order.
#[derive(Debug, Clone)]
pub struct FanOutCoordinator {
    registry: ProbeRegistry,
    probe_timeout: Option<Duration>,
}

impl FanOutCoordinator {
    pub fn new(registry: ProbeRegistry) -> Self {
        Self {
            registry,
            probe_timeout: None,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout.filter(|d| !d.is_zero());
        self
    }

    pub async fn run(
        &self,
        selected: &[ServiceId],
        ctx: &ProbeContext,
    ) -> Vec<(ServiceId, ProbeOutcome)> {
        let ctx = Arc::new(ctx.clone());

        let handles: Vec<_> = selected
            .iter()
            .map(|&service| {
                let probe = self.registry.get(service);
                let ctx = Arc::clone(&ctx);
                let limit = self.probe_timeout;
                tokio::spawn(async move {
                    let Some(probe) = probe else {
                        warn!(%service, "no probe registered");
                        return ProbeOutcome::error("No probe registered for service");
                    };
                    match limit {
                        None => probe.probe(&ctx).await,
                        Some(limit) => match tokio::time::timeout(limit, probe.probe(&ctx)).await {
                            Ok(outcome) => outcome,
                            Err(_) => {
                                warn!(%service, ?limit, "probe timed out");
                                ProbeOutcome::error(format!("Probe timed out after {limit:?}"))
                            }
                        },
                    }
                })
            })
            .collect();

        debug!(tasks = handles.len(), "probe tasks spawned");
        let joined = join_all(handles).await;

        selected
            .iter()
            .copied()
            .zip(joined)
            .map(|(service, res)| {
                let outcome = res.unwrap_or_else(|e| {
                    error!(%service, error = %e, "probe task aborted");
                    ProbeOutcome::error(join_failure_message(e))
                });
                (service, outcome)
            })
            .collect()
    }
}

fn join_failure_message(e: JoinError) -> String {
    if !e.is_panic() {
        return "Probe task was cancelled".to_string();
    }
    let payload = e.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match detail {
        Some(d) => format!("Probe task panicked: {d}"),
        None => "Probe task panicked".to_string(),
    }
}
