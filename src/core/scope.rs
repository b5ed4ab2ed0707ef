use url::Url;

/// Hosts the HTTP client is allowed to contact.
///
/// An empty scope allows everything; the engine itself never leaves the
/// target's host, so the scope only guards against redirects and callers
/// feeding foreign URLs into a shared client.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    allowed_hosts: Vec<String>,
}

impl Scope {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn for_target(target: &str) -> anyhow::Result<Self> {
        let url = Url::parse(target)?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("target has no host: {}", target))?;

        Ok(Self {
            allowed_hosts: vec![host.to_ascii_lowercase()],
        })
    }

    pub fn allow(mut self, host: &str) -> Self {
        self.allowed_hosts.push(host.to_ascii_lowercase());
        self
    }

    pub fn is_in_scope(&self, url: &Url) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        match url.host_str() {
            Some(host) => self.allowed_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_host_only() {
        let scope = Scope::for_target("http://shop.example/item?id=1").unwrap();
        assert!(scope.is_in_scope(&Url::parse("http://SHOP.example/other").unwrap()));
        assert!(!scope.is_in_scope(&Url::parse("http://evil.example/").unwrap()));
    }

    #[test]
    fn test_unrestricted_allows_all() {
        let scope = Scope::unrestricted();
        assert!(scope.is_in_scope(&Url::parse("http://anything.example/").unwrap()));
    }
}
