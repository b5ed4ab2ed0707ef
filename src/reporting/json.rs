use crate::reporting::model::{Finding, Severity};
use crate::sqli::session::SessionOutcome;
use serde::Serialize;

#[derive(Serialize)]
struct Report<'a> {
    scan_metadata: ScanMetadata,
    summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a SessionOutcome>,
    findings: &'a [Finding],
}

#[derive(Serialize)]
struct ScanMetadata {
    tool: String,
    version: String,
    scan_date: String,
    report_format: String,
}

#[derive(Serialize)]
struct Summary {
    total_findings: usize,
    critical: usize,
    high: usize,
    medium: usize,
    low: usize,
    info: usize,
}

impl Summary {
    fn of(findings: &[Finding]) -> Self {
        let count = |sev: Severity| findings.iter().filter(|f| f.severity == sev).count();
        Self {
            total_findings: findings.len(),
            critical: count(Severity::Critical),
            high: count(Severity::High),
            medium: count(Severity::Medium),
            low: count(Severity::Low),
            info: count(Severity::Info),
        }
    }
}

fn metadata() -> ScanMetadata {
    ScanMetadata {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        scan_date: chrono::Utc::now().to_rfc3339(),
        report_format: "application/json".to_string(),
    }
}

pub fn render(findings: &[Finding]) -> anyhow::Result<String> {
    let report = Report {
        scan_metadata: metadata(),
        summary: Summary::of(findings),
        session: None,
        findings,
    };

    let json = serde_json::to_string_pretty(&report)?;
    Ok(json)
}

/// Report for one finished session, including its status and dynamic parameters
pub fn render_outcome(outcome: &SessionOutcome) -> anyhow::Result<String> {
    let report = Report {
        scan_metadata: metadata(),
        summary: Summary::of(&outcome.findings),
        session: Some(outcome),
        findings: &outcome.findings,
    };

    let json = serde_json::to_string_pretty(&report)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::model::Channel;

    #[test]
    fn test_summary_counts_by_severity() {
        let findings = vec![
            Finding::new(Channel::ErrorBased, "t", "u", "id", "1'"),
            Finding::new(Channel::XssHint, "t", "u", "q", "x"),
        ];
        let json = render(&findings).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["total_findings"], 2);
        assert_eq!(value["summary"]["critical"], 1);
        assert_eq!(value["summary"]["info"], 1);
        assert_eq!(value["findings"][0]["channel"], "error_based");
        assert!(value.get("session").is_none());
    }
}
