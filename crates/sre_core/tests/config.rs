use std::collections::HashMap;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use sre_core::config::{AgentConfig, ServiceToggle};
use sre_core::domain::ServiceId;

#[test]
fn defaults_are_sensible() {
    let c = AgentConfig::default();
    assert_eq!(c.k8s_namespace, "default");
    assert_eq!(c.aws_region, "us-east-1");
    assert_eq!(c.analysis_timeout_secs, 30);
    assert_eq!(c.max_history_items, 100);
    assert!(ServiceId::ALL.iter().all(|s| c.is_enabled(*s)));

    let v = c.validate();
    assert!(!v.valid);
    assert_eq!(v.issues, vec!["GitHub owner and repository not configured"]);
}

#[test]
fn save_then_load_preserves_values() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("agent.json");

    let mut c = AgentConfig::default();
    c.github_owner = "acme".to_string();
    c.github_repo = "shop".to_string();
    c.services.insert(ServiceId::Aws, ServiceToggle { enabled: false });
    c.save(&path).expect("save");

    let loaded = AgentConfig::from_file(&path).expect("load");
    assert_eq!(loaded, c);
    assert!(!loaded.is_enabled(ServiceId::Aws));
    assert!(loaded.validate().valid);
}

#[test]
fn partial_files_fill_in_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("agent.json");
    std::fs::write(&path, r#"{"k8s_namespace": "payments", "services": {"github": {}}}"#)
        .expect("write");

    let c = AgentConfig::from_file(&path).expect("load");
    assert_eq!(c.k8s_namespace, "payments");
    assert_eq!(c.aws_region, "us-east-1");
    assert!(c.is_enabled(ServiceId::Github));
    assert!(c.is_enabled(ServiceId::K8s));
}

#[test]
fn invalid_json_is_reported() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("agent.json");
    std::fs::write(&path, "{not json").expect("write");

    let err = AgentConfig::from_file(&path).expect_err("should fail");
    assert_eq!(err.code, "CONFIG_PARSE_FAILED");

    let err = AgentConfig::from_file(&dir.path().join("missing.json")).expect_err("should fail");
    assert_eq!(err.code, "CONFIG_READ_FAILED");
}

#[test]
fn environment_overrides_file_values() {
    let env: HashMap<&str, &str> = [
        ("GITHUB_OWNER", "acme"),
        ("GITHUB_REPO", "shop"),
        ("K8S_NAMESPACE", ""),
        ("ANALYSIS_TIMEOUT", "5"),
        ("OLLAMA_MODEL", "qwen2.5"),
    ]
    .into_iter()
    .collect();

    let mut c = AgentConfig::default();
    c.apply_env(|k| env.get(k).map(|v| v.to_string())).expect("apply");
    assert_eq!(c.github_owner, "acme");
    assert_eq!(c.github_repo, "shop");
    assert_eq!(c.k8s_namespace, "default");
    assert_eq!(c.analysis_timeout_secs, 5);
    assert_eq!(c.ollama_model, "qwen2.5");
}

#[test]
fn non_numeric_overrides_are_rejected() {
    let mut c = AgentConfig::default();
    let err = c
        .apply_env(|k| (k == "MAX_HISTORY_ITEMS").then(|| "lots".to_string()))
        .expect_err("should fail");
    assert_eq!(err.code, "CONFIG_ENV_INVALID");
    assert_eq!(err.details.as_deref(), Some("MAX_HISTORY_ITEMS=lots"));
}
