//! Dynamic content detection and masking
//!
//! Two fetches of the same unmodified page are lined up by their longest
//! common prefix and suffix. Whatever sits between is the dynamic zone; the
//! text immediately around it becomes a pair of boundary markers that can be
//! found again in later responses and used to cut the zone out.

use crate::core::settings::DYNAMICITY_BOUNDARY_LENGTH;
use serde::Serialize;

/// Boundaries of a page's variable region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DynamicMarking {
    /// Text immediately before the dynamic zone
    pub prefix: String,
    /// Text immediately after the dynamic zone
    pub suffix: String,
    /// Full length (bytes) of the common prefix in the original page
    pub prefix_len: usize,
    /// Full length (bytes) of the common suffix in the original page
    pub suffix_len: usize,
}

impl DynamicMarking {
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }

    /// `body` with the dynamic zone removed.
    ///
    /// The zone runs from the end of the first prefix occurrence to the next
    /// suffix occurrence. Bodies where the markers cannot be found are
    /// returned unchanged. Idempotent.
    pub fn template(&self, body: &str) -> String {
        if self.is_empty() {
            return body.to_string();
        }

        let zone_start = if self.prefix.is_empty() {
            0
        } else {
            match body.find(&self.prefix) {
                Some(i) => i + self.prefix.len(),
                None => return body.to_string(),
            }
        };

        let zone_end = if self.suffix.is_empty() {
            body.len()
        } else {
            match body[zone_start..].find(&self.suffix) {
                Some(i) => zone_start + i,
                None => return body.to_string(),
            }
        };

        let mut out = String::with_capacity(body.len() - (zone_end - zone_start));
        out.push_str(&body[..zone_start]);
        out.push_str(&body[zone_end..]);
        out
    }
}

/// Locate the region where two fetches of the same page differ.
///
/// Returns `None` for identical pages and for pages that share neither a
/// prefix nor a suffix (nothing to anchor on).
pub fn find_dynamic_content(first: &str, second: &str) -> Option<DynamicMarking> {
    if first == second {
        return None;
    }

    let prefix_len = common_prefix_len(first, second);
    // the suffix may not reach back into the prefix of the shorter page
    let max_suffix = first.len().min(second.len()) - prefix_len;
    let suffix_len = common_suffix_len(first, second, max_suffix);

    // markers must not carry characters of the variable token itself
    let prefix_len = retreat_to_token_start(first, second, prefix_len);
    let suffix_len = advance_to_token_end(first, second, suffix_len);

    if prefix_len == 0 && suffix_len == 0 {
        return None;
    }

    let prefix_region = &first[..prefix_len];
    let suffix_region = &first[first.len() - suffix_len..];

    Some(DynamicMarking {
        prefix: tail_chars(prefix_region, DYNAMICITY_BOUNDARY_LENGTH).to_string(),
        suffix: head_chars(suffix_region, DYNAMICITY_BOUNDARY_LENGTH).to_string(),
        prefix_len,
        suffix_len,
    })
}

/// Byte length of the longest common prefix, on a char boundary
fn common_prefix_len(a: &str, b: &str) -> usize {
    let mut len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(len) || !b.is_char_boundary(len) {
        len -= 1;
    }
    len
}

/// Byte length of the longest common suffix (at most `max`), on a char boundary
fn common_suffix_len(a: &str, b: &str, max: usize) -> usize {
    let mut len = a
        .bytes()
        .rev()
        .zip(b.bytes().rev())
        .take(max)
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(a.len() - len) || !b.is_char_boundary(b.len() - len) {
        len -= 1;
    }
    len
}

fn is_word(c: Option<char>) -> bool {
    c.is_some_and(char::is_alphanumeric)
}

/// Shorten a common prefix so it does not end inside a word that continues
/// differently in either page
fn retreat_to_token_start(a: &str, b: &str, len: usize) -> usize {
    let shared = &a[..len];
    let straddles = is_word(shared.chars().next_back())
        && (is_word(a[len..].chars().next()) || is_word(b[len..].chars().next()));
    if !straddles {
        return len;
    }
    shared
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_alphanumeric())
        .map_or(0, |(i, c)| i + c.len_utf8())
}

/// Shorten a common suffix so it does not start inside a word that began
/// differently in either page
fn advance_to_token_end(a: &str, b: &str, len: usize) -> usize {
    let shared = &a[a.len() - len..];
    let straddles = is_word(shared.chars().next())
        && (is_word(a[..a.len() - len].chars().next_back())
            || is_word(b[..b.len() - len].chars().next_back()));
    if !straddles {
        return len;
    }
    shared
        .char_indices()
        .find(|(_, c)| !c.is_alphanumeric())
        .map_or(0, |(i, _)| len - i)
}

fn tail_chars(s: &str, n: usize) -> &str {
    match s.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((i, _)) if n > 0 => &s[i..],
        _ if n == 0 => "",
        _ => s,
    }
}

fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
