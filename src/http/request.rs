use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Set request body from string
    pub fn set_body(&mut self, body: String) {
        self.body = Some(body.into_bytes());
    }

    /// Set a header, silently ignoring names or values that are not valid HTTP
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) {
            if let Ok(header_value) = HeaderValue::from_str(value) {
                self.headers.insert(header_name, header_value);
            }
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a POST request with a form body
    pub fn post(url: Url, body: String) -> Self {
        let mut req = Self::new(Method::POST, url);
        req.set_body(body);
        req.set_header("Content-Type", "application/x-www-form-urlencoded");
        req
    }

    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// Raw-ish rendering used as finding evidence
    pub fn to_evidence(&self) -> String {
        let mut out = format!("{} {}\n", self.method, self.url);
        for (name, value) in &self.headers {
            out.push_str(&format!(
                "{}: {}\n",
                name,
                value.to_str().unwrap_or("<binary>")
            ));
        }
        if let Some(body) = &self.body {
            out.push('\n');
            out.push_str(&String::from_utf8_lossy(body));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_sets_form_content_type() {
        let req = HttpRequest::post(Url::parse("http://t.example/login").unwrap(), "a=1".into());
        assert_eq!(req.header("content-type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(req.body_text(), "a=1");
    }

    #[test]
    fn test_invalid_header_is_ignored() {
        let mut req = HttpRequest::get(Url::parse("http://t.example/").unwrap());
        req.set_header("bad header", "x");
        req.set_header("X-Ok", "bad\nvalue");
        assert!(req.headers.is_empty());
    }

    #[test]
    fn test_evidence_contains_request_line_and_body() {
        let req = HttpRequest::post(Url::parse("http://t.example/s").unwrap(), "q=1'".into());
        let evidence = req.to_evidence();
        assert!(evidence.starts_with("POST http://t.example/s\n"));
        assert!(evidence.ends_with("q=1'"));
    }
}
