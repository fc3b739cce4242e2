pub mod backend;
pub mod config;
pub mod connections;
pub mod demo;
pub mod domain;
pub mod error;
pub mod fanout;
pub mod history;
pub mod ids;
pub mod metrics;
pub mod normalize;
pub mod probes;
pub mod report;
pub mod router;

#[cfg(test)]
mod tests {
    use super::error::AppError;

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("PROBE_BACKEND_ERROR", "boom")
            .with_details("op=list_pods")
            .with_retryable(true);
        assert_eq!(err.code, "PROBE_BACKEND_ERROR");
        assert_eq!(err.to_string(), "[PROBE_BACKEND_ERROR] boom");
        assert_eq!(err.outcome_message(), "boom (op=list_pods)");
        assert!(err.retryable);

        let err = AppError::new("PROBE_BACKEND_ERROR", "boom").with_context("Failed to get pods");
        assert_eq!(err.outcome_message(), "Failed to get pods: boom");
    }
}
