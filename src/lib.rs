//! Heuristic SQL injection detection for crawled HTTP endpoints.
//!
//! ```no_run
//! use sqlheur::{CrawlResult, HeuristicEngine, HttpClient, Reporter, ScanConfig, Scope};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ScanConfig::default();
//! let client = HttpClient::new(Scope::for_target("http://shop.example/")?, &config)?;
//! let engine = HeuristicEngine::new(Arc::new(client), config)?;
//!
//! let crawl = CrawlResult::get("http://shop.example/item?id=3").with_parsed_params();
//! let sink = Reporter::new();
//! let outcome = engine.scan(&crawl, &sink, &CancellationToken::new()).await;
//! println!("{:?}: {} findings", outcome.status, outcome.findings.len());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod http;
pub mod input;
pub mod logging;
pub mod payload;
pub mod reporting;
pub mod sqli;

pub use crate::core::{ConfigError, DictionaryError, ScanConfig, Scope, TransportError};
pub use crate::http::{HttpClient, HttpRequest, HttpResponse, Transport};
pub use crate::input::{BaselineResponse, CrawlResult, InjectionSite, ParameterVariation};
pub use crate::reporting::{Channel, Finding, FindingSink, Reporter, Severity};
pub use crate::sqli::{
    DynamicMarking, ErrorDictionary, HeuristicEngine, SessionOutcome, SessionStatus, SkipReason,
};
