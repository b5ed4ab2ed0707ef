//! Page comparison utilities

use crate::core::settings::MAX_DIFFLIB_SEQUENCE_LENGTH;
use similar::{Algorithm, TextDiff};
use std::time::Duration;

/// Wall-clock budget for a single diff; past it the ratio is approximate
const DIFF_TIMEOUT: Duration = Duration::from_millis(1500);

/// Similarity ratio between two pages, bounded by a maximum body length.
#[derive(Debug, Clone, Copy)]
pub struct Comparator {
    max_len: usize,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(MAX_DIFFLIB_SEQUENCE_LENGTH)
    }
}

impl Comparator {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    /// True when `body` is too large to diff
    pub fn exceeds(&self, body: &str) -> bool {
        body.len() > self.max_len
    }

    /// Ratio in `[0, 1]`, 1.0 meaning identical.
    ///
    /// Pairs where either side exceeds the length cap are not diffed and
    /// count as identical.
    pub fn ratio(&self, page1: &str, page2: &str) -> f64 {
        if page1 == page2 {
            return 1.0;
        }
        if self.exceeds(page1) || self.exceeds(page2) {
            tracing::debug!(
                "Skipping comparison of oversized pages ({} / {} bytes)",
                page1.len(),
                page2.len()
            );
            return 1.0;
        }
        if page1.is_empty() || page2.is_empty() {
            return 0.0;
        }

        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .timeout(DIFF_TIMEOUT)
            .diff_chars(page1, page2);

        f64::from(diff.ratio()).clamp(0.0, 1.0)
    }
}

/// Similarity with the default length cap
pub fn similarity(page1: &str, page2: &str) -> f64 {
    Comparator::default().ratio(page1, page2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflexive() {
        for page in ["", "a", "<html><body>hello</body></html>", "ünïcödé ✓"] {
            assert_eq!(similarity(page, page), 1.0);
        }
    }

    #[test]
    fn test_bounded() {
        let pairs = [
            ("abc", "xyz"),
            ("", "something"),
            ("<p>1</p>", "<p>2</p>"),
            ("short", "a much longer page body than the other one"),
        ];
        for (a, b) in pairs {
            let r = similarity(a, b);
            assert!((0.0..=1.0).contains(&r), "ratio {} out of range for {:?}", r, (a, b));
        }
    }

    #[test]
    fn test_disjoint_pages_score_zero() {
        assert_eq!(similarity("aaaa", "bbbb"), 0.0);
    }

    #[test]
    fn test_small_change_scores_high() {
        let a = "<html><body><h1>Product</h1><p>Price: 10</p></body></html>";
        let b = "<html><body><h1>Product</h1><p>Price: 11</p></body></html>";
        assert!(similarity(a, b) > 0.95);
    }

    #[test]
    fn test_oversized_pages_treated_as_similar() {
        let cmp = Comparator::new(8);
        assert!(cmp.exceeds("123456789"));
        assert_eq!(cmp.ratio("123456789", "completely different"), 1.0);
        assert!(cmp.ratio("abcd", "wxyz") < 0.5);
    }
}
