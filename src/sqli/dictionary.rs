//! Per-DBMS error signature dictionary
//!
//! Loaded once from an XML document shaped like
//!
//! ```xml
//! <root>
//!   <dbms value="MySQL">
//!     <error regexp="SQL syntax.*?MySQL"/>
//!   </dbms>
//! </root>
//! ```
//!
//! and shared read-only by every scan session afterwards.

use crate::core::error::DictionaryError;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::{Regex, RegexBuilder};
use std::path::Path;
use std::sync::Arc;

const BUILTIN_XML: &str = include_str!("../../data/errors.xml");

static BUILTIN: Lazy<Arc<ErrorDictionary>> =
    Lazy::new(|| Arc::new(ErrorDictionary::load_or_empty(BUILTIN_XML)));

/// One error signature.
///
/// Signatures are case-insensitive regular expressions; a pattern the regex
/// engine rejects is matched as a plain case-insensitive substring instead.
#[derive(Debug, Clone)]
pub struct Signature {
    pattern: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    Literal(String),
}

impl Signature {
    pub fn new(pattern: &str) -> Self {
        let matcher = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => Matcher::Regex(re),
            Err(e) => {
                tracing::debug!("signature {:?} is not a valid regex ({}), matching literally", pattern, e);
                Matcher::Literal(pattern.to_lowercase())
            }
        };
        Self {
            pattern: pattern.to_string(),
            matcher,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Matched text, if any
    pub fn find<'a>(&self, body: &'a str) -> Option<&'a str> {
        match &self.matcher {
            Matcher::Regex(re) => re.find(body).map(|m| m.as_str()),
            Matcher::Literal(needle) => {
                let lower = body.to_lowercase();
                // lowercasing can shift byte offsets for non-ASCII text, so only
                // hand back a slice when the lengths line up
                let start = lower.find(needle.as_str())?;
                if lower.len() == body.len() && body.is_char_boundary(start) && body.is_char_boundary(start + needle.len()) {
                    Some(&body[start..start + needle.len()])
                } else {
                    Some("")
                }
            }
        }
    }

    pub fn is_match(&self, body: &str) -> bool {
        self.find(body).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct EngineSignatures {
    pub name: String,
    pub signatures: Vec<Signature>,
}

/// A signature hit in a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMatch {
    pub engine: String,
    pub signature: String,
    pub excerpt: String,
}

/// Engine name → ordered signatures, in document order
#[derive(Debug, Clone, Default)]
pub struct ErrorDictionary {
    engines: Vec<EngineSignatures>,
}

impl ErrorDictionary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dictionary embedded in the crate, parsed on first use
    pub fn builtin() -> Arc<ErrorDictionary> {
        Arc::clone(&BUILTIN)
    }

    /// Parse a dictionary document.
    ///
    /// Every attribute of an `<error>` element contributes a signature;
    /// duplicates are kept in source order. A `<dbms>` is named by its
    /// `value` attribute (or its first attribute). A repeated engine name
    /// replaces the earlier list.
    pub fn from_xml(xml: &str) -> Result<Self, DictionaryError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut engines: Vec<EngineSignatures> = Vec::new();
        let mut current: Option<EngineSignatures> = None;
        let mut seen_root = false;
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| DictionaryError::Xml {
                position: reader.buffer_position(),
                message: e.to_string(),
            })?;

            match event {
                Event::Start(e) => match e.name().as_ref() {
                    b"root" => seen_root = true,
                    b"dbms" if seen_root => {
                        current = Some(EngineSignatures {
                            name: engine_name(&e),
                            signatures: Vec::new(),
                        });
                    }
                    b"error" => push_signatures(current.as_mut(), &e),
                    _ => {}
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"error" => push_signatures(current.as_mut(), &e),
                    b"dbms" if seen_root => insert_engine(
                        &mut engines,
                        EngineSignatures {
                            name: engine_name(&e),
                            signatures: Vec::new(),
                        },
                    ),
                    _ => {}
                },
                Event::End(e) => {
                    if e.name().as_ref() == b"dbms" {
                        if let Some(engine) = current.take() {
                            insert_engine(&mut engines, engine);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(DictionaryError::MissingRoot);
        }

        Ok(Self { engines })
    }

    /// Parse `xml`, logging and falling back to an empty dictionary on error.
    ///
    /// An empty dictionary disables only the error-based channel.
    pub fn load_or_empty(xml: &str) -> Self {
        match Self::from_xml(xml) {
            Ok(dict) => {
                tracing::debug!(
                    "Loaded error dictionary: {} engines, {} signatures",
                    dict.engines.len(),
                    dict.signature_count()
                );
                dict
            }
            Err(e) => {
                tracing::error!("Failed to load error dictionary: {}", e);
                Self::empty()
            }
        }
    }

    /// Read a dictionary file, falling back to an empty dictionary on error
    pub fn load_file(path: impl AsRef<Path>) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(xml) => Self::load_or_empty(&xml),
            Err(e) => {
                tracing::error!("{}", DictionaryError::Io(e));
                Self::empty()
            }
        }
    }

    pub fn engines(&self) -> &[EngineSignatures] {
        &self.engines
    }

    pub fn get(&self, engine: &str) -> Option<&[Signature]> {
        self.engines
            .iter()
            .find(|e| e.name == engine)
            .map(|e| e.signatures.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn signature_count(&self) -> usize {
        self.engines.iter().map(|e| e.signatures.len()).sum()
    }

    /// First engine (in document order) with a signature matching `body`.
    ///
    /// Signatures that already match `original` are ignored: an error that is
    /// on the page regardless of input says nothing about the input.
    pub fn find_match(&self, body: &str, original: &str) -> Option<ErrorMatch> {
        for engine in &self.engines {
            for signature in &engine.signatures {
                if let Some(excerpt) = signature.find(body) {
                    if signature.is_match(original) {
                        continue;
                    }
                    return Some(ErrorMatch {
                        engine: engine.name.clone(),
                        signature: signature.pattern.clone(),
                        excerpt: excerpt.to_string(),
                    });
                }
            }
        }
        None
    }
}

fn engine_name(e: &BytesStart<'_>) -> String {
    let mut first = None;
    for attr in e.attributes().filter_map(|a| a.ok()) {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        if attr.key.as_ref() == b"value" {
            return value.into_owned();
        }
        if first.is_none() {
            first = Some(value.into_owned());
        }
    }
    first.unwrap_or_default()
}

fn push_signatures(current: Option<&mut EngineSignatures>, e: &BytesStart<'_>) {
    let Some(engine) = current else {
        return;
    };
    for attr in e.attributes().filter_map(|a| a.ok()) {
        if let Ok(value) = attr.unescape_value() {
            engine.signatures.push(Signature::new(&value));
        }
    }
}

fn insert_engine(engines: &mut Vec<EngineSignatures>, engine: EngineSignatures) {
    match engines.iter_mut().find(|e| e.name == engine.name) {
        Some(existing) => existing.signatures = engine.signatures,
        None => engines.push(engine),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<root>
    <dbms value="MySQL">
        <error regexp="SQL syntax.*?MySQL"/>
        <error regexp="Warning.*?\Wmysqli?_"/>
        <error regexp="SQL syntax.*?MySQL"/>
    </dbms>
    <dbms value="Oracle">
        <error regexp="\bORA-\d{5}"/>
        <error regexp="unbalanced (paren"/>
    </dbms>
</root>"#;

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        let dict = ErrorDictionary::from_xml(SAMPLE).unwrap();
        let names: Vec<&str> = dict.engines().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["MySQL", "Oracle"]);
        let mysql = dict.get("MySQL").unwrap();
        assert_eq!(mysql.len(), 3);
        assert_eq!(mysql[0].pattern(), mysql[2].pattern());
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let dict = ErrorDictionary::from_xml(SAMPLE).unwrap();
        let hit = dict
            .find_match("you have an error in your sql syntax; check the manual for mysql", "")
            .unwrap();
        assert_eq!(hit.engine, "MySQL");
    }

    #[test]
    fn test_invalid_regex_matches_literally() {
        let dict = ErrorDictionary::from_xml(SAMPLE).unwrap();
        let hit = dict.find_match("parse failure: Unbalanced (paren here", "").unwrap();
        assert_eq!(hit.engine, "Oracle");
        assert_eq!(hit.excerpt, "Unbalanced (paren");
    }

    #[test]
    fn test_signature_present_in_original_is_ignored() {
        let dict = ErrorDictionary::from_xml(SAMPLE).unwrap();
        let page = "footer: ORA-00933 shown in docs";
        assert!(dict.find_match(page, page).is_none());
    }

    #[test]
    fn test_malformed_xml_falls_back_to_empty() {
        let dict = ErrorDictionary::load_or_empty("<root><dbms value='x'></root>");
        assert!(dict.is_empty());
        assert!(dict.find_match("SQL syntax MySQL", "").is_none());
    }

    #[test]
    fn test_missing_root_is_error() {
        let err = ErrorDictionary::from_xml("<dbms value='x'/>").unwrap_err();
        assert!(matches!(err, DictionaryError::MissingRoot));
    }

    #[test]
    fn test_repeated_engine_replaces_signatures() {
        let xml = r#"<root>
            <dbms value="SQLite"><error regexp="a"/></dbms>
            <dbms value="SQLite"><error regexp="b"/><error regexp="c"/></dbms>
        </root>"#;
        let dict = ErrorDictionary::from_xml(xml).unwrap();
        assert_eq!(dict.engines().len(), 1);
        assert_eq!(dict.get("SQLite").unwrap().len(), 2);
    }

    #[test]
    fn test_builtin_dictionary_loads() {
        let dict = ErrorDictionary::builtin();
        assert!(dict.get("MySQL").is_some());
        assert!(dict.get("PostgreSQL").is_some());
        assert!(dict.signature_count() > 100);
        let hit = dict
            .find_match("Warning: pg_query(): Query failed: ERROR:  syntax error at or near", "")
            .unwrap();
        assert_eq!(hit.engine, "PostgreSQL");
    }
}
