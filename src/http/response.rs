use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body_len: usize,
    pub body_hash: String,
    pub body: Vec<u8>,
    pub elapsed_ms: u128,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            status,
            headers: HashMap::new(),
            body_len: body.len(),
            body_hash: hash_body(&body),
            body,
            elapsed_ms: 0,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Get body as UTF-8 string (lossy conversion)
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Status line, headers and up to `max_body` bytes of body, for evidence
    pub fn to_evidence(&self, max_body: usize) -> String {
        let mut out = format!("HTTP {}\n", self.status);
        let mut names: Vec<_> = self.headers.keys().collect();
        names.sort();
        for name in names {
            out.push_str(&format!("{}: {}\n", name, self.headers[name]));
        }
        out.push('\n');
        let text = self.body_text();
        if text.len() > max_body {
            let mut cut = max_body;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            out.push_str(&text[..cut]);
            out.push_str("\n[truncated]");
        } else {
            out.push_str(&text);
        }
        out
    }
}

pub fn hash_body(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_bodies_hash_equal() {
        let a = HttpResponse::new(200, "same");
        let b = HttpResponse::new(200, "same");
        assert_eq!(a.body_hash, b.body_hash);
        assert_eq!(a.body_len, 4);
    }

    #[test]
    fn test_evidence_truncates_on_char_boundary() {
        let resp = HttpResponse::new(500, "ééé");
        let evidence = resp.to_evidence(3);
        assert!(evidence.contains("HTTP 500"));
        assert!(evidence.contains("é\n[truncated]"));
    }
}
