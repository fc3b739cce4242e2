use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::ServiceId;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceToggle {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ServiceToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Agent configuration: a JSON file, then environment overrides on top.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    pub github_owner: String,
    pub github_repo: String,
    pub k8s_namespace: String,
    pub aws_region: String,
    /// Bound on each probe and on the synthesis call. 0 disables it.
    pub analysis_timeout_secs: u64,
    pub max_history_items: usize,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub services: BTreeMap<ServiceId, ServiceToggle>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            github_owner: String::new(),
            github_repo: String::new(),
            k8s_namespace: "default".to_string(),
            aws_region: "us-east-1".to_string(),
            analysis_timeout_secs: 30,
            max_history_items: 100,
            ollama_base_url: "http://127.0.0.1:11434".to_string(),
            ollama_model: "llama3.1".to_string(),
            services: ServiceId::ALL
                .iter()
                .map(|s| (*s, ServiceToggle::default()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigValidation {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl AgentConfig {
    /// Load from `path` when given and present, then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|e| {
            AppError::new("CONFIG_READ_FAILED", "Failed to read config file")
                .with_details(format!("path={}; err={e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            AppError::new("CONFIG_PARSE_FAILED", "Config file is not valid JSON")
                .with_details(format!("path={}; err={e}", path.display()))
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::new("CONFIG_WRITE_FAILED", "Failed to serialize config")
                .with_details(e.to_string())
        })?;
        fs::write(path, json).map_err(|e| {
            AppError::new("CONFIG_WRITE_FAILED", "Failed to write config file")
                .with_details(format!("path={}; err={e}", path.display()))
        })
    }

    /// Non-empty environment values win over file values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), AppError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GITHUB_OWNER") {
            self.github_owner = v;
        }
        if let Some(v) = get("GITHUB_REPO") {
            self.github_repo = v;
        }
        if let Some(v) = get("K8S_NAMESPACE") {
            self.k8s_namespace = v;
        }
        if let Some(v) = get("AWS_REGION") {
            self.aws_region = v;
        }
        if let Some(v) = get("ANALYSIS_TIMEOUT") {
            self.analysis_timeout_secs = parse_env("ANALYSIS_TIMEOUT", &v)?;
        }
        if let Some(v) = get("MAX_HISTORY_ITEMS") {
            self.max_history_items = parse_env("MAX_HISTORY_ITEMS", &v)?;
        }
        if let Some(v) = get("OLLAMA_BASE_URL") {
            self.ollama_base_url = v;
        }
        if let Some(v) = get("OLLAMA_MODEL") {
            self.ollama_model = v;
        }
        Ok(())
    }

    /// Services missing from the `services` table count as enabled.
    pub fn is_enabled(&self, service: ServiceId) -> bool {
        self.services.get(&service).map(|t| t.enabled).unwrap_or(true)
    }

    pub fn validate(&self) -> ConfigValidation {
        let mut issues = Vec::new();
        if self.github_owner.trim().is_empty() || self.github_repo.trim().is_empty() {
            issues.push("GitHub owner and repository not configured".to_string());
        }
        if self.k8s_namespace.trim().is_empty() {
            issues.push("Kubernetes namespace not configured".to_string());
        }
        if self.aws_region.trim().is_empty() {
            issues.push("AWS region not configured".to_string());
        }
        if self.max_history_items == 0 {
            issues.push("max_history_items must be at least 1".to_string());
        }
        ConfigValidation {
            valid: issues.is_empty(),
            issues,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim().parse::<T>().map_err(|_| {
        AppError::new("CONFIG_ENV_INVALID", "Environment override is not a valid number")
            .with_details(format!("{key}={raw}"))
    })
}
