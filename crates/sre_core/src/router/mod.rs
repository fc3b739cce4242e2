use crate::domain::ServiceId;

const K8S_KEYWORDS: &[&str] = &["k8s", "kubernetes", "pod", "container", "cluster", "node"];
const AWS_KEYWORDS: &[&str] = &["aws", "cloudwatch", "lambda", "log", "metric", "alarm"];
const GITHUB_KEYWORDS: &[&str] = &["github", "workflow", "ci/cd", "pipeline", "action", "deploy"];

fn keywords(service: ServiceId) -> &'static [&'static str] {
    match service {
        ServiceId::K8s => K8S_KEYWORDS,
        ServiceId::Aws => AWS_KEYWORDS,
        ServiceId::Github => GITHUB_KEYWORDS,
    }
}

/// Pick services by case-insensitive substring match against each domain vocabulary.
///
/// Output order is the fixed domain priority, not keyword order in the query.
/// No match selects every service.
pub fn decide_services(query: &str) -> Vec<ServiceId> {
    let q = query.to_lowercase();
    let selected: Vec<ServiceId> = ServiceId::ALL
        .into_iter()
        .filter(|s| keywords(*s).iter().any(|k| q.contains(k)))
        .collect();
    if selected.is_empty() {
        ServiceId::ALL.to_vec()
    } else {
        selected
    }
}

/// Caller-provided services (deduplicated, first occurrence kept) or routed ones.
pub fn resolve_services(requested: Option<&[ServiceId]>, query: &str) -> Vec<ServiceId> {
    match requested {
        Some(list) if !list.is_empty() => {
            let mut out: Vec<ServiceId> = Vec::with_capacity(list.len());
            for s in list {
                if !out.contains(s) {
                    out.push(*s);
                }
            }
            out
        }
        _ => decide_services(query),
    }
}
