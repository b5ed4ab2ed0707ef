//! Records handed to the engine by the crawler

use crate::payload::variations;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Where in the request a parameter lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionSite {
    Query,
    Body,
    Path,
    Header,
}

impl std::fmt::Display for InjectionSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InjectionSite::Query => write!(f, "query"),
            InjectionSite::Body => write!(f, "body"),
            InjectionSite::Path => write!(f, "path"),
            InjectionSite::Header => write!(f, "header"),
        }
    }
}

/// One injectable parameter.
///
/// `position` is the index within its own site: the n-th query pair, the
/// n-th form field, the n-th path segment. Header parameters are addressed
/// by name and ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterVariation {
    pub name: String,
    pub position: usize,
    pub site: InjectionSite,
    #[serde(default)]
    pub value: String,
}

impl ParameterVariation {
    pub fn new(name: &str, position: usize, site: InjectionSite, value: &str) -> Self {
        Self {
            name: name.to_string(),
            position,
            site,
            value: value.to_string(),
        }
    }

    pub fn query(name: &str, position: usize, value: &str) -> Self {
        Self::new(name, position, InjectionSite::Query, value)
    }

    pub fn body(name: &str, position: usize, value: &str) -> Self {
        Self::new(name, position, InjectionSite::Body, value)
    }
}

/// Response the crawler already observed for the unmodified request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineResponse {
    pub status: u16,
    pub body: String,
}

/// One crawled endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Site the endpoint belongs to, used for reporting
    pub target: String,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub request_body: String,
    #[serde(default)]
    pub content_type: String,
    /// Absent when the crawler did not keep the response; the engine then
    /// performs the baseline fetch itself
    #[serde(default)]
    pub baseline: Option<BaselineResponse>,
    #[serde(default)]
    pub params: Vec<ParameterVariation>,
    /// WAF/IPS products detected upstream; advisory only
    #[serde(default)]
    pub waf: Vec<String>,
}

impl CrawlResult {
    pub fn get(url: &str) -> Self {
        Self {
            target: url.to_string(),
            url: url.to_string(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            request_body: String::new(),
            content_type: String::new(),
            baseline: None,
            params: Vec::new(),
            waf: Vec::new(),
        }
    }

    pub fn post(url: &str, body: &str) -> Self {
        Self {
            method: "POST".to_string(),
            request_body: body.to_string(),
            content_type: "application/x-www-form-urlencoded".to_string(),
            ..Self::get(url)
        }
    }

    pub fn with_baseline(mut self, status: u16, body: &str) -> Self {
        self.baseline = Some(BaselineResponse {
            status,
            body: body.to_string(),
        });
        self
    }

    pub fn with_param(mut self, param: ParameterVariation) -> Self {
        self.params.push(param);
        self
    }

    /// Fill `params` from the URL query and form body when none were given.
    ///
    /// The engine never does this on its own: a record with no parameters is
    /// skipped.
    pub fn with_parsed_params(mut self) -> Self {
        if !self.params.is_empty() {
            return self;
        }
        if let Ok(url) = Url::parse(&self.url) {
            self.params =
                variations::parse(&url, &self.method, &self.request_body, &self.content_type);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{
            "target": "http://shop.example",
            "url": "http://shop.example/item?id=3",
            "method": "GET",
            "params": [{"name": "id", "position": 0, "site": "query", "value": "3"}]
        }"#;
        let crawl: CrawlResult = serde_json::from_str(json).unwrap();
        assert!(crawl.baseline.is_none());
        assert_eq!(crawl.params[0], ParameterVariation::query("id", 0, "3"));
    }

    #[test]
    fn test_parsed_params_fill_only_when_empty() {
        let crawl = CrawlResult::post("http://shop.example/login?next=home", "user=bob")
            .with_parsed_params();
        assert_eq!(
            crawl.params,
            vec![
                ParameterVariation::query("next", 0, "home"),
                ParameterVariation::body("user", 0, "bob"),
            ]
        );

        let given = CrawlResult::get("http://shop.example/item?id=3&page=2")
            .with_param(ParameterVariation::query("page", 1, "2"))
            .with_parsed_params();
        assert_eq!(given.params, vec![ParameterVariation::query("page", 1, "2")]);

        assert!(CrawlResult::get("not a url").with_parsed_params().params.is_empty());
    }
}
