use chrono::{DateTime, Utc};
use serde::Serialize;

/// Signal that produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// DBMS error signature appeared in the response
    ErrorBased,
    /// Type/format conversion phrase appeared in the response
    TypeException,
    /// TRUE-like and FALSE-like payloads pulled the page in opposite directions
    Differential,
    /// Markup characters reflected unescaped
    XssHint,
    /// File inclusion error text appeared in the response
    FileInclusionHint,
}

impl Channel {
    pub fn confidence(&self) -> f32 {
        match self {
            Channel::ErrorBased => 0.9,
            Channel::TypeException => 0.7,
            Channel::Differential => 0.6,
            Channel::XssHint | Channel::FileInclusionHint => 0.3,
        }
    }

    pub fn is_sqli(&self) -> bool {
        matches!(
            self,
            Channel::ErrorBased | Channel::TypeException | Channel::Differential
        )
    }

    pub fn cwe(&self) -> &'static str {
        match self {
            Channel::XssHint => "CWE-79",
            Channel::FileInclusionHint => "CWE-98",
            _ => "CWE-89",
        }
    }

    pub fn vuln_type(&self) -> &'static str {
        match self {
            Channel::XssHint => "Cross-Site Scripting (hint)",
            Channel::FileInclusionHint => "File Inclusion (hint)",
            _ => "SQL Injection",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::ErrorBased => write!(f, "error-based"),
            Channel::TypeException => write!(f, "type-exception"),
            Channel::Differential => write!(f, "differential"),
            Channel::XssHint => write!(f, "xss-hint"),
            Channel::FileInclusionHint => write!(f, "file-inclusion-hint"),
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn for_channel(channel: Channel) -> Self {
        match channel {
            Channel::XssHint => Severity::Info,
            Channel::FileInclusionHint => Severity::Low,
            _ => Self::from_confidence(channel.confidence()),
        }
    }

    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.9 {
            Severity::Critical
        } else if confidence >= 0.7 {
            Severity::High
        } else if confidence >= 0.5 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "ℹ️  INFO"),
            Severity::Low => write!(f, "🟢 LOW"),
            Severity::Medium => write!(f, "🟡 MEDIUM"),
            Severity::High => write!(f, "🟠 HIGH"),
            Severity::Critical => write!(f, "🔴 CRITICAL"),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Finding {
    pub target: String,
    pub url: String,
    pub parameter: String,
    pub payload: String,
    pub channel: Channel,
    pub engine: Option<String>, // MySQL, PostgreSQL, etc.
    pub evidence: String,       // one-line summary of what matched
    pub request: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub confidence: f32,
    pub http_method: String,
    pub cwe: String,
    /// The parameter's value already changed the page before any injection
    pub dynamic_parameter: bool,
}

impl Finding {
    pub fn new(channel: Channel, target: &str, url: &str, parameter: &str, payload: &str) -> Self {
        Self {
            target: target.to_string(),
            url: url.to_string(),
            parameter: parameter.to_string(),
            payload: payload.to_string(),
            channel,
            engine: None,
            evidence: String::new(),
            request: String::new(),
            response: String::new(),
            timestamp: Utc::now(),
            severity: Severity::for_channel(channel),
            confidence: channel.confidence(),
            http_method: "GET".to_string(),
            cwe: channel.cwe().to_string(),
            dynamic_parameter: false,
        }
    }

    pub fn with_engine(mut self, engine: &str) -> Self {
        self.engine = Some(engine.to_string());
        self
    }

    pub fn with_evidence(mut self, summary: String, request: String, response: String) -> Self {
        self.evidence = summary;
        self.request = request;
        self.response = response;
        self
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.http_method = method.to_string();
        self
    }

    pub fn dynamic(mut self, dynamic_parameter: bool) -> Self {
        self.dynamic_parameter = dynamic_parameter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_channel() {
        let error = Finding::new(Channel::ErrorBased, "t", "http://t/", "id", "1'");
        assert_eq!(error.severity, Severity::Critical);
        assert_eq!(error.cwe, "CWE-89");

        let diff = Finding::new(Channel::Differential, "t", "http://t/", "id", "1");
        assert_eq!(diff.severity, Severity::Medium);

        let xss = Finding::new(Channel::XssHint, "t", "http://t/", "q", "<'\">");
        assert_eq!(xss.severity, Severity::Info);
        assert_eq!(xss.cwe, "CWE-79");
        assert!(!xss.channel.is_sqli());
    }

    #[test]
    fn test_channel_serializes_snake_case() {
        let json = serde_json::to_string(&Channel::FileInclusionHint).unwrap();
        assert_eq!(json, "\"file_inclusion_hint\"");
    }
}
