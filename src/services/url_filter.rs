// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::{AuditError, Result};
use regex::Regex;

/// Drops URLs matching any of a set of exclusion patterns.
///
/// Patterns are unanchored regular expressions: a match anywhere in the URL
/// excludes it.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    patterns: Vec<Regex>,
}

impl UrlFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|e| AuditError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(url))
    }

    /// Keep the URLs no pattern matches, preserving their order.
    pub fn filter(&self, urls: Vec<String>) -> Vec<String> {
        if self.patterns.is_empty() {
            return urls;
        }
        urls.into_iter().filter(|url| !self.is_excluded(url)).collect()
    }
}

/// Convenience wrapper compiling `patterns` and filtering in one step.
pub fn filter_urls<S: AsRef<str>>(urls: Vec<String>, patterns: &[S]) -> Result<Vec<String>> {
    Ok(UrlFilter::new(patterns)?.filter(urls))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> Vec<String> {
        vec![
            "https://site.test/".to_string(),
            "https://site.test/tag/rust".to_string(),
            "https://site.test/blog/post?page=2".to_string(),
            "https://site.test/blog/post".to_string(),
        ]
    }

    #[test]
    fn test_no_patterns_is_identity() {
        let filtered = filter_urls::<&str>(urls(), &[]).unwrap();
        assert_eq!(filtered, urls());
    }

    #[test]
    fn test_partial_match_excludes() {
        let filtered = filter_urls(urls(), &["/tag/", r"\?page=\d+"]).unwrap();
        assert_eq!(
            filtered,
            vec![
                "https://site.test/".to_string(),
                "https://site.test/blog/post".to_string()
            ]
        );
    }

    #[test]
    fn test_order_preserved() {
        let input = vec![
            "https://site.test/c".to_string(),
            "https://site.test/skip/a".to_string(),
            "https://site.test/b".to_string(),
        ];
        let filtered = filter_urls(input, &["skip"]).unwrap();
        assert_eq!(
            filtered,
            vec![
                "https://site.test/c".to_string(),
                "https://site.test/b".to_string()
            ]
        );
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let err = UrlFilter::new(&["(unclosed"]).unwrap_err();
        assert!(matches!(err, AuditError::InvalidPattern { .. }));
    }
}
