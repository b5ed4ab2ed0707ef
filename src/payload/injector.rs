use crate::http::request::HttpRequest;
use crate::input::{InjectionSite, ParameterVariation};
use url::{form_urlencoded, Url};

/// Copy of `base` with `variation`'s value replaced by `value`
pub fn inject(
    base: &HttpRequest,
    variation: &ParameterVariation,
    value: &str,
) -> anyhow::Result<HttpRequest> {
    let mut req = base.clone();
    match variation.site {
        InjectionSite::Query => {
            req.url = inject_query_param(&base.url, variation, value);
        }
        InjectionSite::Body => {
            let body = base.body_text();
            req.set_body(replace_pair(
                form_urlencoded::parse(body.as_bytes()),
                variation,
                value,
            ));
        }
        InjectionSite::Path => {
            req.url = inject_path_segment(&base.url, variation.position, value)?;
        }
        InjectionSite::Header => {
            req.set_header(&variation.name, value);
        }
    }
    Ok(req)
}

pub fn inject_query_param(base: &Url, variation: &ParameterVariation, payload: &str) -> Url {
    let mut url = base.clone();
    let query = replace_pair(base.query_pairs(), variation, payload);
    url.set_query(Some(&query));
    url
}

/// Re-serialize `pairs` with the pair addressed by `variation` replaced.
///
/// The pair at `variation.position` wins when its name matches; otherwise
/// the first pair with the same name; otherwise the pair is appended.
fn replace_pair<'a>(
    pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    variation: &ParameterVariation,
    payload: &str,
) -> String {
    let mut pairs: Vec<(String, String)> = pairs
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let target = match pairs.get(variation.position) {
        Some((k, _)) if *k == variation.name => Some(variation.position),
        _ => pairs.iter().position(|(k, _)| *k == variation.name),
    };

    match target {
        Some(i) => pairs[i].1 = payload.to_string(),
        None => pairs.push((variation.name.clone(), payload.to_string())),
    }

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn inject_path_segment(base: &Url, position: usize, payload: &str) -> anyhow::Result<Url> {
    let mut segments: Vec<String> = base
        .path_segments()
        .ok_or_else(|| anyhow::anyhow!("URL cannot carry path parameters: {}", base))?
        .map(|s| s.to_string())
        .collect();

    let slot = segments
        .get_mut(position)
        .ok_or_else(|| anyhow::anyhow!("no path segment at position {} in {}", position, base))?;
    *slot = payload.to_string();

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("URL cannot be a base: {}", base))?
        .clear()
        .extend(segments.iter().map(String::as_str));
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> HttpRequest {
        HttpRequest::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_query_replaced_in_place() {
        let req = base("http://t.example/item?id=1&lang=en");
        let var = ParameterVariation::query("id", 0, "1");
        let injected = inject(&req, &var, "1'").unwrap();
        let pairs: Vec<(String, String)> = injected
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("id".to_string(), "1'".to_string()));
        assert_eq!(pairs[1], ("lang".to_string(), "en".to_string()));
    }

    #[test]
    fn test_duplicate_names_use_position() {
        let req = base("http://t.example/?tag=a&tag=b");
        let var = ParameterVariation::query("tag", 1, "b");
        let injected = inject(&req, &var, "X").unwrap();
        assert_eq!(injected.url.query(), Some("tag=a&tag=X"));
    }

    #[test]
    fn test_form_body_injection() {
        let req = HttpRequest::post(Url::parse("http://t.example/login").unwrap(), "user=bob&pass=1".into());
        let var = ParameterVariation::body("pass", 1, "1");
        let injected = inject(&req, &var, "1\")").unwrap();
        assert_eq!(injected.body_text(), "user=bob&pass=1%22%29");
        assert_eq!(injected.url, req.url);
    }

    #[test]
    fn test_path_segment_injection() {
        let req = base("http://t.example/product/42/view");
        let var = ParameterVariation::new("id", 1, InjectionSite::Path, "42");
        let injected = inject(&req, &var, "42'").unwrap();
        assert_eq!(injected.url.path(), "/product/42'/view");
    }

    #[test]
    fn test_missing_path_segment_is_error() {
        let req = base("http://t.example/a");
        let var = ParameterVariation::new("id", 5, InjectionSite::Path, "");
        assert!(inject(&req, &var, "x").is_err());
    }

    #[test]
    fn test_header_injection() {
        let req = base("http://t.example/");
        let var = ParameterVariation::new("X-Forwarded-For", 0, InjectionSite::Header, "1.2.3.4");
        let injected = inject(&req, &var, "1.2.3.4'").unwrap();
        assert_eq!(injected.header("x-forwarded-for"), Some("1.2.3.4'"));
    }
}
