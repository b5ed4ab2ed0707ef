//! Heuristic SQL injection tests
//!
//! For each parameter and each literal-context closer the tester sends
//!
//! 1. a boundary probe: the original value, the closer, and a random tail,
//! 2. a TRUE-like / FALSE-like pair that keeps the statement balanced.
//!
//! Every response goes through the error-based and type-exception channels;
//! the pair additionally feeds the differential channel.

use crate::core::config::ScanConfig;
use crate::core::settings::{
    DUMMY_NON_SQLI_CHECK_APPENDIX, FI_ERROR_REGEX, FORMAT_EXCEPTION_STRINGS, RANDOM_PROBE_MAX,
    RANDOM_TAIL_LENGTH,
};
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use crate::input::ParameterVariation;
use crate::reporting::model::Channel;
use crate::sqli::session::{Interrupt, ProbeSession};
use once_cell::sync::Lazy;
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::Regex;

static FI_ERROR: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(FI_ERROR_REGEX).ok());

/// `original` + `close` + `tail`
pub fn boundary_payload(original: &str, close: &str, tail: &str) -> String {
    format!("{}{}{}", original, close, tail)
}

/// TRUE-like and FALSE-like values for one closer.
///
/// The quote part of `close` wraps the operands; each `)` it closes is
/// re-opened before the comparison, leaving the final quote and parentheses
/// to the application's own SQL:
///
/// * `'`  → `1' AND '7'='7` / `1' AND '7'='8`
/// * ``   → `1 AND 7=7` / `1 AND 7=8`
/// * `')` → `1') AND ('7'='7` / `1') AND ('7'='8`
pub fn boolean_pair(original: &str, close: &str, n: u32) -> (String, String) {
    let quote = close.trim_end_matches(')');
    let reopen = "(".repeat(close.len() - quote.len());
    let build = |rhs: u32| {
        format!(
            "{orig}{close} AND {reopen}{q}{n}{q}={q}{rhs}",
            orig = original,
            close = close,
            reopen = reopen,
            q = quote,
            n = n,
            rhs = rhs,
        )
    };
    (build(n), build(n + 1))
}

/// First format/type conversion phrase in `body` that `original` lacks
pub fn type_exception_signal(body: &str, original: &str) -> Option<&'static str> {
    FORMAT_EXCEPTION_STRINGS
        .iter()
        .copied()
        .find(|phrase| body.contains(phrase) && !original.contains(phrase))
}

/// TRUE-like response closer to the template than the FALSE-like one, by
/// more than the tolerance, with both ratios inside the usable band
pub fn differential_signal(true_ratio: f64, false_ratio: f64, config: &ScanConfig) -> bool {
    true_ratio - false_ratio > config.diff_tolerance
        && true_ratio >= config.lower_ratio_bound
        && false_ratio <= config.upper_ratio_bound
}

/// File inclusion error text in `body` that is not already in `original`
pub fn file_inclusion_signal(body: &str, original: &str) -> Option<String> {
    let re = FI_ERROR.as_ref()?;
    let found = re.find(body)?;
    if re.is_match(original) {
        return None;
    }
    Some(found.as_str().trim().to_string())
}

fn random_tail(rng: &mut impl Rng, len: usize) -> String {
    rng.sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

impl ProbeSession<'_> {
    /// Run every probe for one parameter
    pub(crate) async fn test_parameter(
        &mut self,
        param: &ParameterVariation,
    ) -> Result<(), Interrupt> {
        tracing::info!(
            "Testing {} parameter '{}'{}",
            param.site,
            param.name,
            if self.is_dynamic(&param.name) { " (dynamic)" } else { "" }
        );

        let closes = self.config.close_types.clone();
        let mut differential_reported = false;

        for close in &closes {
            let tail = random_tail(&mut self.rng, RANDOM_TAIL_LENGTH);
            let payload = boundary_payload(&param.value, close, &tail);
            if let Some((request, response)) = self.send_variation(param, &payload).await? {
                self.evaluate_response(param, &payload, &request, &response);
            }

            let n = self.rng.random_range(1..RANDOM_PROBE_MAX);
            let (true_payload, false_payload) = boolean_pair(&param.value, close, n);
            let true_hit = self.send_variation(param, &true_payload).await?;
            let false_hit = self.send_variation(param, &false_payload).await?;

            let mut signalled = false;
            if let Some((request, response)) = &true_hit {
                signalled |= self.evaluate_response(param, &true_payload, request, response);
            }
            if let Some((request, response)) = &false_hit {
                signalled |= self.evaluate_response(param, &false_payload, request, response);
            }

            if signalled || differential_reported {
                continue;
            }
            let (Some((true_req, true_resp)), Some((_, false_resp))) = (&true_hit, &false_hit)
            else {
                continue;
            };

            let rt = self.template_ratio(&true_resp.body_text());
            let rf = self.template_ratio(&false_resp.body_text());
            tracing::debug!("'{}' close {:?}: TRUE={:.3} FALSE={:.3}", param.name, close, rt, rf);

            if differential_signal(rt, rf, self.config) {
                let mut summary = format!(
                    "TRUE-like similarity {:.3}, FALSE-like similarity {:.3} (tolerance {})",
                    rt, rf, self.config.diff_tolerance
                );
                if true_resp.status != self.template_code || false_resp.status != self.template_code
                {
                    summary.push_str(&format!(
                        "; status TRUE={} FALSE={} original={}",
                        true_resp.status, false_resp.status, self.template_code
                    ));
                }
                let finding = self.finding(
                    Channel::Differential,
                    param,
                    &true_payload,
                    summary,
                    true_req,
                    true_resp,
                );
                self.emit(finding);
                differential_reported = true;
            }
        }

        if self.config.non_sqli_checks {
            self.check_non_sqli(param).await?;
        }
        Ok(())
    }

    /// Error-based and type-exception channels; true when either fired
    fn evaluate_response(
        &mut self,
        param: &ParameterVariation,
        payload: &str,
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> bool {
        let body = response.body_text();
        let mut fired = false;

        if let Some(hit) = self.dictionary.find_match(&body, &self.original_body) {
            let finding = self
                .finding(
                    Channel::ErrorBased,
                    param,
                    payload,
                    format!("{} error: {}", hit.engine, hit.excerpt),
                    request,
                    response,
                )
                .with_engine(&hit.engine);
            self.emit(finding);
            fired = true;
        }

        if let Some(phrase) = type_exception_signal(&body, &self.original_body) {
            let finding = self.finding(
                Channel::TypeException,
                param,
                payload,
                format!("type conversion message: {}", phrase),
                request,
                response,
            );
            self.emit(finding);
            fired = true;
        }

        fired
    }

    /// Markup reflection and file inclusion hints from one extra probe
    async fn check_non_sqli(&mut self, param: &ParameterVariation) -> Result<(), Interrupt> {
        let marker = format!(
            "{}{}{}",
            random_tail(&mut self.rng, 10),
            DUMMY_NON_SQLI_CHECK_APPENDIX,
            random_tail(&mut self.rng, 10)
        );
        let payload = format!("{}{}", param.value, marker);

        let Some((request, response)) = self.send_variation(param, &payload).await? else {
            return Ok(());
        };
        let body = response.body_text();

        if body.contains(&marker) {
            let finding = self.finding(
                Channel::XssHint,
                param,
                &payload,
                format!("{} reflected unescaped", DUMMY_NON_SQLI_CHECK_APPENDIX),
                &request,
                &response,
            );
            self.emit(finding);
        }

        if let Some(excerpt) = file_inclusion_signal(&body, &self.original_body) {
            let finding = self.finding(
                Channel::FileInclusionHint,
                param,
                &payload,
                format!("file inclusion error: {}", excerpt),
                &request,
                &response,
            );
            self.emit(finding);
        }

        Ok(())
    }
}
