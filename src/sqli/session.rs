//! Per-endpoint scan state
//!
//! A [`ProbeSession`] lives for exactly one [`crate::sqli::HeuristicEngine::scan`]
//! call. It owns everything the scan mutates (template, dynamic parameters,
//! findings, request counter) and borrows the shared, read-only parts
//! (configuration, dictionary, transport, sink).

use crate::core::config::ScanConfig;
use crate::core::error::TransportError;
use crate::core::rate_limit::RateLimiter;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use crate::http::transport::Transport;
use crate::input::ParameterVariation;
use crate::payload::inject;
use crate::reporting::model::{Channel, Finding};
use crate::reporting::reporter::FindingSink;
use crate::sqli::comparison::Comparator;
use crate::sqli::dictionary::ErrorDictionary;
use crate::sqli::dynamic::DynamicMarking;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Response bytes kept per finding as evidence
const MAX_EVIDENCE_BODY: usize = 4096;

/// Why an endpoint was not tested
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Only GET and POST are probed
    UnsupportedMethod(String),
    /// The unmodified request answers 404
    NotFound,
    /// Nothing to inject into
    NoParameters,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsupportedMethod(m) => write!(f, "unsupported method {}", m),
            SkipReason::NotFound => write!(f, "baseline returned 404"),
            SkipReason::NoParameters => write!(f, "no injectable parameters"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Every parameter was tested
    Completed,
    Skipped(SkipReason),
    /// The page could not be characterised; says nothing about injectability
    Undetermined(String),
    /// Stopped by the caller; findings so far are kept
    Cancelled,
}

/// What a scan returns to its caller
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub target: String,
    pub status: SessionStatus,
    pub findings: Vec<Finding>,
    pub dynamic_params: Vec<String>,
    pub marking: Option<DynamicMarking>,
    /// Status code of the unmodified request, when one was seen
    pub template_code: Option<u16>,
    /// Requests handed to the transport
    pub requests: usize,
    pub waf: Vec<String>,
}

impl SessionOutcome {
    /// Outcome for a scan that ended before a session existed
    pub fn early(target: &str, status: SessionStatus, requests: usize, waf: &[String]) -> Self {
        Self {
            target: target.to_string(),
            status,
            findings: Vec::new(),
            dynamic_params: Vec::new(),
            marking: None,
            template_code: None,
            requests,
            waf: waf.to_vec(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Findings from the SQL channels only
    pub fn sqli_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.channel.is_sqli())
    }
}

/// Reason a session stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Interrupt {
    Cancelled,
    Undetermined(String),
}

/// Paced, cancellable access to the transport
pub(crate) struct SessionClient<'a> {
    transport: &'a dyn Transport,
    limiter: RateLimiter,
    cancel: &'a CancellationToken,
    requests: usize,
}

impl<'a> SessionClient<'a> {
    pub(crate) fn new(
        transport: &'a dyn Transport,
        config: &ScanConfig,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            transport,
            limiter: RateLimiter::new(config.delay()),
            cancel,
            requests: 0,
        }
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests
    }

    /// Issue `request` after the pacing delay.
    ///
    /// The outer error is cancellation, which may land during the delay or
    /// while the request is in flight. The inner error is the transport's.
    pub(crate) async fn send(
        &mut self,
        request: HttpRequest,
    ) -> Result<Result<HttpResponse, TransportError>, Interrupt> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Interrupt::Cancelled),
            _ = self.limiter.wait() => {}
        }

        self.requests += 1;
        tracing::debug!("[REQ #{}] {} {}", self.requests, request.method, request.url);

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupt::Cancelled),
            result = self.transport.issue(request) => Ok(result),
        }
    }
}

pub(crate) struct ProbeSession<'a> {
    pub(crate) target: String,
    pub(crate) method: String,
    pub(crate) base: HttpRequest,
    pub(crate) params: Vec<ParameterVariation>,
    pub(crate) original_body: String,
    pub(crate) template_code: u16,
    pub(crate) template_body: String,
    pub(crate) marking: Option<DynamicMarking>,
    pub(crate) dynamic_params: Vec<String>,
    pub(crate) findings: Vec<Finding>,
    pub(crate) waf: Vec<String>,
    pub(crate) config: &'a ScanConfig,
    pub(crate) dictionary: &'a ErrorDictionary,
    pub(crate) comparator: Comparator,
    pub(crate) rng: StdRng,
    pub(crate) client: SessionClient<'a>,
    sink: &'a dyn FindingSink,
}

impl<'a> ProbeSession<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        target: &str,
        base: HttpRequest,
        params: Vec<ParameterVariation>,
        original_status: u16,
        original_body: String,
        config: &'a ScanConfig,
        dictionary: &'a ErrorDictionary,
        rng: StdRng,
        client: SessionClient<'a>,
        sink: &'a dyn FindingSink,
        waf: Vec<String>,
    ) -> Self {
        Self {
            target: target.to_string(),
            method: base.method.to_string(),
            base,
            params,
            template_body: original_body.clone(),
            original_body,
            template_code: original_status,
            marking: None,
            dynamic_params: Vec::new(),
            findings: Vec::new(),
            waf,
            config,
            dictionary,
            comparator: Comparator::new(config.max_comparison_len),
            rng,
            client,
            sink,
        }
    }

    pub(crate) async fn send(
        &mut self,
        request: HttpRequest,
    ) -> Result<Result<HttpResponse, TransportError>, Interrupt> {
        self.client.send(request).await
    }

    /// Send the base request with `param` set to `value`.
    ///
    /// `Ok(None)` means the attempt was inconclusive (the value could not be
    /// placed, or the transport failed) and the caller should move on.
    pub(crate) async fn send_variation(
        &mut self,
        param: &ParameterVariation,
        value: &str,
    ) -> Result<Option<(HttpRequest, HttpResponse)>, Interrupt> {
        let request = match inject(&self.base, param, value) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Cannot place payload in '{}': {}", param.name, e);
                return Ok(None);
            }
        };

        match self.send(request.clone()).await? {
            Ok(response) => Ok(Some((request, response))),
            Err(e) => {
                tracing::debug!("Probe on '{}' inconclusive: {}", param.name, e);
                Ok(None)
            }
        }
    }

    /// `body` with the page's dynamic zone removed
    pub(crate) fn masked(&self, body: &str) -> String {
        match &self.marking {
            Some(marking) => marking.template(body),
            None => body.to_string(),
        }
    }

    /// Similarity of a response body to the session template
    pub(crate) fn template_ratio(&self, body: &str) -> f64 {
        self.comparator.ratio(&self.masked(body), &self.template_body)
    }

    pub(crate) fn is_dynamic(&self, name: &str) -> bool {
        self.dynamic_params.iter().any(|p| p == name)
    }

    /// Finding skeleton for `param`, with request/response evidence attached
    pub(crate) fn finding(
        &self,
        channel: Channel,
        param: &ParameterVariation,
        payload: &str,
        summary: String,
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> Finding {
        Finding::new(
            channel,
            &self.target,
            request.url.as_str(),
            &param.name,
            payload,
        )
        .with_method(&self.method)
        .with_evidence(
            summary,
            request.to_evidence(),
            response.to_evidence(MAX_EVIDENCE_BODY),
        )
        .dynamic(self.is_dynamic(&param.name))
    }

    /// Record a finding and hand it to the sink
    pub(crate) fn emit(&mut self, finding: Finding) {
        tracing::info!(
            "[{}] {} parameter '{}' with payload {:?}{}",
            finding.channel,
            finding.http_method,
            finding.parameter,
            finding.payload,
            finding
                .engine
                .as_ref()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default()
        );
        self.sink.report(finding.clone());
        self.findings.push(finding);
    }

    pub(crate) fn into_outcome(self, status: SessionStatus) -> SessionOutcome {
        SessionOutcome {
            requests: self.client.requests(),
            target: self.target,
            status,
            findings: self.findings,
            dynamic_params: self.dynamic_params,
            marking: self.marking,
            template_code: Some(self.template_code),
            waf: self.waf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Slow {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for Slow {
        async fn issue(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(HttpResponse::new(200, "late"))
        }
    }

    fn request() -> HttpRequest {
        HttpRequest::get(url::Url::parse("http://t.example/?id=1").unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_in_flight() {
        let transport = Slow {
            calls: AtomicUsize::new(0),
        };
        let config = ScanConfig::deterministic(1);
        let cancel = CancellationToken::new();
        let mut client = SessionClient::new(&transport, &config, &cancel);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = client.send(request()).await;
        assert_eq!(result.err(), Some(Interrupt::Cancelled));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.requests(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_send_issues_nothing() {
        let transport = Slow {
            calls: AtomicUsize::new(0),
        };
        let config = ScanConfig::deterministic(1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut client = SessionClient::new(&transport, &config, &cancel);

        assert!(client.send(request()).await.is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(SessionStatus::Skipped(SkipReason::NotFound)).unwrap();
        assert_eq!(json["state"], "skipped");
        assert_eq!(json["detail"], "not_found");
        let json = serde_json::to_value(SessionStatus::Completed).unwrap();
        assert_eq!(json["state"], "completed");
    }
}
