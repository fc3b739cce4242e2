/// The single reasoning request: the literal query plus the pretty-printed findings.
pub fn verdict_prompt(query: &str, findings_json: &str) -> String {
    format!(
        r#"You are a Site Reliability Engineering assistant. Analyze the operator's question about a possible incident using the health findings gathered from each service.

Rules (non-negotiable):
1) Use ONLY the question and the findings below. Do not invent services, metrics or events.
2) Treat scores and statuses in the findings as already computed; do not recompute them.
3) If the findings show everything healthy, say so plainly.

OPERATOR QUESTION:
"{query}"

SERVICE FINDINGS (JSON):
{findings_json}

Output:
Return ONLY a JSON object with exactly these keys:
- "overall_status": one of "HEALTHY", "DEGRADED", "CRITICAL", "UNKNOWN".
- "root_cause_narrative": string, the most likely root cause across services.
- "immediate_actions": list of 3-5 strings, high-priority steps to stabilize now.
- "long_term_recommendations": list of 2-3 strings, prevention work.
- "suggested_commands": list of strings, specific kubectl, aws or gh commands that help diagnose or fix (may be empty).
- "severity": one of "LOW", "MEDIUM", "HIGH", "CRITICAL".
- "confidence": integer 0-100.
No introduction, no Markdown, no trailing text.
"#
    )
}
