// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Language guessed from a page's title and description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
    Mixed,
    Other,
    #[default]
    Unknown,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Ru => write!(f, "ru"),
            Language::En => write!(f, "en"),
            Language::Mixed => write!(f, "mixed"),
            Language::Other => write!(f, "other"),
            Language::Unknown => write!(f, "unknown"),
        }
    }
}

/// A single SEO problem found on a page.
///
/// Pages carry issues as their rendered labels, see [`PageAudit::seo_issues`].
#[derive(Debug, Clone, PartialEq)]
pub enum SeoIssue {
    MissingTitle,
    TitleShort(usize),
    TitleLong(usize),
    MissingDescription,
    DescriptionShort(usize),
    DescriptionLong(usize),
    NoH1,
    MultipleH1(usize),
    CanonicalMismatch,
    /// Carries the threshold the page fell below
    LowContent(usize),
    /// Carries the rounded response time in seconds
    Slow(f64),
}

impl fmt::Display for SeoIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeoIssue::MissingTitle => write!(f, "Missing title"),
            SeoIssue::TitleShort(len) => write!(f, "Title short ({})", len),
            SeoIssue::TitleLong(len) => write!(f, "Title long ({})", len),
            SeoIssue::MissingDescription => write!(f, "Missing description"),
            SeoIssue::DescriptionShort(len) => write!(f, "Desc short ({})", len),
            SeoIssue::DescriptionLong(len) => write!(f, "Desc long ({})", len),
            SeoIssue::NoH1 => write!(f, "No H1"),
            SeoIssue::MultipleH1(count) => write!(f, "Multiple H1 ({})", count),
            SeoIssue::CanonicalMismatch => write!(f, "Canonical mismatch"),
            SeoIssue::LowContent(threshold) => write!(f, "Low content (<{})", threshold),
            SeoIssue::Slow(secs) => write!(f, "Slow ({}s)", secs),
        }
    }
}

/// Audit row for one crawled URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PageAudit {
    pub url: String,
    /// HTTP status, 0 when the fetch failed before a response arrived
    pub http_code: u16,
    /// Seconds, rounded to two decimals
    pub response_time: f64,
    /// Body size in bytes
    pub content_length: usize,
    pub is_noindex: bool,
    /// Page-level nofollow from headers or meta robots
    pub is_nofollow: bool,
    /// Where each robots directive came from, e.g. `header:noindex`
    pub robots_directives: Vec<String>,
    pub links_total: usize,
    pub links_nofollow: usize,
    pub canonical: String,
    pub title: String,
    pub meta_description: String,
    pub language: Language,
    pub h1_count: usize,
    pub seo_issues: Vec<String>,
    /// Transport error if the page could not be fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageAudit {
    /// Row for a page whose fetch failed outright.
    pub fn failed(url: &str, error: String, http_code: u16) -> Self {
        Self {
            url: url.to_string(),
            http_code,
            error: Some(error),
            ..Self::default()
        }
    }

    /// Transport failure, including a body read that failed after the status
    /// arrived, or a 4xx/5xx response
    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.http_code == 0 || self.http_code >= 400
    }

    pub fn has_issues(&self) -> bool {
        !self.seo_issues.is_empty()
    }
}

/// Request to audit a single page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckPageRequest {
    pub url: String,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_labels() {
        assert_eq!(SeoIssue::MissingTitle.to_string(), "Missing title");
        assert_eq!(SeoIssue::TitleShort(9).to_string(), "Title short (9)");
        assert_eq!(SeoIssue::DescriptionLong(181).to_string(), "Desc long (181)");
        assert_eq!(SeoIssue::MultipleH1(3).to_string(), "Multiple H1 (3)");
        assert_eq!(SeoIssue::LowContent(200).to_string(), "Low content (<200)");
        assert_eq!(SeoIssue::Slow(3.25).to_string(), "Slow (3.25s)");
    }

    #[test]
    fn test_language_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Language::Ru).unwrap(), "\"ru\"");
        assert_eq!(serde_json::to_string(&Language::Mixed).unwrap(), "\"mixed\"");
        assert_eq!(Language::default(), Language::Unknown);
    }

    #[test]
    fn test_failed_audit_has_zero_fields() {
        let audit = PageAudit::failed("https://example.com/", "timed out".to_string(), 0);
        assert_eq!(audit.http_code, 0);
        assert_eq!(audit.response_time, 0.0);
        assert_eq!(audit.language, Language::Unknown);
        assert!(audit.seo_issues.is_empty());
        assert!(audit.is_error());
    }

    #[test]
    fn test_body_read_failure_counts_as_error() {
        let audit = PageAudit::failed(
            "https://example.com/",
            "Failed to read body: connection reset".to_string(),
            200,
        );
        assert_eq!(audit.http_code, 200);
        assert!(audit.is_error());
    }

    #[test]
    fn test_error_omitted_from_json_when_absent() {
        let audit = PageAudit {
            url: "https://example.com/".to_string(),
            http_code: 200,
            ..PageAudit::default()
        };
        let json = serde_json::to_value(&audit).unwrap();
        assert!(json.get("error").is_none());
        assert!(!audit.is_error());
    }
}
