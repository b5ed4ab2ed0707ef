//! Parameter extraction from a raw request

use crate::input::{InjectionSite, ParameterVariation};
use url::{form_urlencoded, Url};

/// Extract query parameters, then form-body parameters, in request order.
///
/// Body parameters are only taken for non-GET requests whose content type is
/// form-encoded, or unset with a body that parses as `k=v` pairs.
pub fn parse(url: &Url, method: &str, body: &str, content_type: &str) -> Vec<ParameterVariation> {
    let mut params: Vec<ParameterVariation> = url
        .query_pairs()
        .enumerate()
        .map(|(i, (k, v))| ParameterVariation::new(&k, i, InjectionSite::Query, &v))
        .collect();

    if method.eq_ignore_ascii_case("GET") || body.is_empty() {
        return params;
    }

    let form_encoded = content_type
        .to_ascii_lowercase()
        .contains("application/x-www-form-urlencoded");
    let looks_like_form = content_type.is_empty() && body.contains('=') && !body.trim_start().starts_with('{');

    if form_encoded || looks_like_form {
        params.extend(
            form_urlencoded::parse(body.as_bytes())
                .enumerate()
                .map(|(i, (k, v))| ParameterVariation::new(&k, i, InjectionSite::Body, &v)),
        );
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_in_order() {
        let url = Url::parse("http://t.example/list?cat=2&sort=name").unwrap();
        let params = parse(&url, "GET", "", "");
        assert_eq!(
            params,
            vec![
                ParameterVariation::query("cat", 0, "2"),
                ParameterVariation::query("sort", 1, "name"),
            ]
        );
    }

    #[test]
    fn test_form_body_after_query() {
        let url = Url::parse("http://t.example/login?next=home").unwrap();
        let params = parse(&url, "POST", "user=bob&pass=x%27", "application/x-www-form-urlencoded");
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], ParameterVariation::body("pass", 1, "x'"));
    }

    #[test]
    fn test_json_body_is_not_form() {
        let url = Url::parse("http://t.example/api").unwrap();
        assert!(parse(&url, "POST", r#"{"a":"b=c"}"#, "").is_empty());
    }
}
