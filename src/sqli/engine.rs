//! Heuristic SQL injection engine
//!
//! Entry point for one crawled endpoint at a time. The engine itself holds
//! only read-only state and may be shared by many concurrent scans.

use crate::core::config::ScanConfig;
use crate::core::error::ConfigError;
use crate::core::settings::NOT_FOUND_STATUS;
use crate::http::request::HttpRequest;
use crate::http::transport::Transport;
use crate::input::CrawlResult;
use crate::reporting::reporter::{FindingSink, Reporter};
use crate::sqli::dictionary::ErrorDictionary;
use crate::sqli::session::{
    Interrupt, ProbeSession, SessionClient, SessionOutcome, SessionStatus, SkipReason,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Method;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

impl From<Interrupt> for SessionStatus {
    fn from(interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::Cancelled => SessionStatus::Cancelled,
            Interrupt::Undetermined(reason) => SessionStatus::Undetermined(reason),
        }
    }
}

pub struct HeuristicEngine {
    dictionary: Arc<ErrorDictionary>,
    transport: Arc<dyn Transport>,
    config: ScanConfig,
}

impl HeuristicEngine {
    /// Engine using the built-in error dictionary
    pub fn new(transport: Arc<dyn Transport>, config: ScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            dictionary: ErrorDictionary::builtin(),
            transport,
            config,
        })
    }

    pub fn with_dictionary(mut self, dictionary: Arc<ErrorDictionary>) -> Self {
        self.dictionary = dictionary;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &ErrorDictionary {
        &self.dictionary
    }

    /// Scan one endpoint, pushing findings to `sink` as they are produced.
    ///
    /// Never fails: every way a scan can end is a [`SessionStatus`].
    pub async fn scan(
        &self,
        crawl: &CrawlResult,
        sink: &dyn FindingSink,
        cancel: &CancellationToken,
    ) -> SessionOutcome {
        let span = tracing::info_span!("sqli_scan", target = %crawl.target, url = %crawl.url);
        self.run(crawl, sink, cancel).instrument(span).await
    }

    /// Scan without an external sink or cancellation
    pub async fn scan_collect(&self, crawl: &CrawlResult) -> SessionOutcome {
        let sink = Reporter::new();
        self.scan(crawl, &sink, &CancellationToken::new()).await
    }

    async fn run(
        &self,
        crawl: &CrawlResult,
        sink: &dyn FindingSink,
        cancel: &CancellationToken,
    ) -> SessionOutcome {
        let method = crawl.method.to_ascii_uppercase();
        if method != "GET" && method != "POST" {
            tracing::debug!("Method {} not supported for injection tests", method);
            return SessionOutcome::early(
                &crawl.target,
                SessionStatus::Skipped(SkipReason::UnsupportedMethod(method)),
                0,
                &crawl.waf,
            );
        }

        if !crawl.waf.is_empty() {
            tracing::warn!(
                "Target appears to be protected by a WAF/IPS ({}), results may be incomplete",
                crawl.waf.join(", ")
            );
        }

        let base = match build_request(crawl, &method) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Cannot build request for {}: {}", crawl.url, e);
                return SessionOutcome::early(
                    &crawl.target,
                    SessionStatus::Undetermined(e.to_string()),
                    0,
                    &crawl.waf,
                );
            }
        };

        let mut client = SessionClient::new(self.transport.as_ref(), &self.config, cancel);

        // -------------------------------------------------
        // Baseline
        // -------------------------------------------------
        let (status, body) = match &crawl.baseline {
            Some(baseline) => (baseline.status, baseline.body.clone()),
            None => match client.send(base.clone()).await {
                Ok(Ok(response)) => (response.status, response.body_text()),
                Ok(Err(e)) => {
                    tracing::warn!("Baseline request failed: {}", e);
                    return SessionOutcome::early(
                        &crawl.target,
                        SessionStatus::Undetermined(format!("baseline request failed: {}", e)),
                        client.requests(),
                        &crawl.waf,
                    );
                }
                Err(interrupt) => {
                    return SessionOutcome::early(
                        &crawl.target,
                        interrupt.into(),
                        client.requests(),
                        &crawl.waf,
                    );
                }
            },
        };

        tracing::info!("Baseline: status={} size={}", status, body.len());

        if status == NOT_FOUND_STATUS {
            tracing::warn!("{} returned 404, skipping", crawl.url);
            let mut outcome = SessionOutcome::early(
                &crawl.target,
                SessionStatus::Skipped(SkipReason::NotFound),
                client.requests(),
                &crawl.waf,
            );
            outcome.template_code = Some(status);
            return outcome;
        }

        if crawl.params.is_empty() {
            tracing::warn!("{} has no injectable parameters", crawl.url);
            let mut outcome = SessionOutcome::early(
                &crawl.target,
                SessionStatus::Skipped(SkipReason::NoParameters),
                client.requests(),
                &crawl.waf,
            );
            outcome.template_code = Some(status);
            return outcome;
        }

        let params = crawl.params.clone();
        tracing::debug!(
            "Testing {} parameters: {:?}",
            params.len(),
            params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>()
        );

        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let mut session = ProbeSession::new(
            &crawl.target,
            base,
            params,
            status,
            body,
            &self.config,
            &self.dictionary,
            StdRng::seed_from_u64(seed),
            client,
            sink,
            crawl.waf.clone(),
        );

        let status = match Self::drive(&mut session).await {
            Ok(()) => SessionStatus::Completed,
            Err(interrupt) => {
                if interrupt == Interrupt::Cancelled {
                    tracing::info!("Scan cancelled with {} findings", session.findings.len());
                }
                interrupt.into()
            }
        };

        let outcome = session.into_outcome(status);
        tracing::info!(
            "Scan finished: {} findings, {} dynamic parameters, {} requests",
            outcome.findings.len(),
            outcome.dynamic_params.len(),
            outcome.requests
        );
        outcome
    }

    async fn drive(session: &mut ProbeSession<'_>) -> Result<(), Interrupt> {
        session.establish_template().await?;
        session.probe_dynamic_parameters().await?;

        let params = session.params.clone();
        for param in &params {
            session.test_parameter(param).await?;
        }
        Ok(())
    }
}

/// Unmodified request described by `crawl`
fn build_request(crawl: &CrawlResult, method: &str) -> anyhow::Result<HttpRequest> {
    let url = Url::parse(&crawl.url)?;
    let method = Method::from_bytes(method.as_bytes())?;

    let mut request = HttpRequest::new(method, url);
    for (name, value) in &crawl.headers {
        request.set_header(name, value);
    }

    if request.method == Method::POST {
        request.set_body(crawl.request_body.clone());
        if !crawl.content_type.is_empty() && request.header("content-type").is_none() {
            request.set_header("Content-Type", &crawl.content_type);
        }
    }

    Ok(request)
}
