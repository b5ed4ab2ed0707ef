//! reqwest-backed transport with scope enforcement

use crate::core::config::ScanConfig;
use crate::core::error::TransportError;
use crate::core::scope::Scope;
use crate::http::request::HttpRequest;
use crate::http::response::{hash_body, HttpResponse};
use crate::http::transport::Transport;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client};
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub struct HttpClient {
    client: Client,
    scope: Scope,
    timeout: Duration,
    default_headers: HashMap<String, String>,
}

impl HttpClient {
    pub fn new(scope: Scope, config: &ScanConfig) -> Result<Self> {
        Self::with_headers(scope, config, HashMap::new())
    }

    /// Client that adds `headers` (cookies, auth) to every request that does
    /// not already carry them
    pub fn with_headers(
        scope: Scope,
        config: &ScanConfig,
        headers: HashMap<String, String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(Policy::none())
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            scope,
            timeout: config.request_timeout(),
            default_headers: headers,
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn issue(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        if !self.scope.is_in_scope(&req.url) {
            return Err(TransportError::OutOfScope(req.url.to_string()));
        }

        let start = Instant::now();

        let mut request = self
            .client
            .request(req.method, req.url.clone())
            .headers(req.headers.clone());

        for (key, value) in &self.default_headers {
            if req.headers.contains_key(key.as_str()) {
                continue;
            }
            if let Ok(header_name) = header::HeaderName::from_bytes(key.as_bytes()) {
                if let Ok(header_value) = header::HeaderValue::from_str(value) {
                    request = request.header(header_name, header_value);
                }
            }
        }

        if let Some(body) = req.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout.as_millis() as u64)
            } else {
                TransportError::from(e)
            }
        })?;
        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (k, v) in response.headers().iter() {
            headers.insert(k.to_string(), v.to_str().unwrap_or("").to_string());
        }

        let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body_len: body.len(),
            body_hash: hash_body(&body),
            body,
            elapsed_ms: start.elapsed().as_millis(),
        })
    }
}
