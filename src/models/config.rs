// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use utoipa::ToSchema;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; SitemapAuditBot/0.1)";

/// Length and timing limits used to classify a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SeoThresholds {
    pub min_title_length: usize,
    pub max_title_length: usize,
    pub min_description_length: usize,
    pub max_description_length: usize,
    /// Extra title characters allowed when the page is detected as Russian
    pub ru_title_allowance: usize,
    /// Extra description characters allowed when the page is detected as Russian
    pub ru_description_allowance: usize,
    /// Pages whose visible body text is shorter than this (in characters) are flagged
    pub low_content_chars: usize,
    /// Pages slower than this many seconds are flagged
    pub slow_page_secs: f64,
}

impl Default for SeoThresholds {
    fn default() -> Self {
        Self {
            min_title_length: 10,
            max_title_length: 75,
            min_description_length: 50,
            max_description_length: 160,
            ru_title_allowance: 5,
            ru_description_allowance: 20,
            low_content_chars: 200,
            slow_page_secs: 3.0,
        }
    }
}

/// Settings for a single scan run.
///
/// A config is handed to the controller once per run and never mutated
/// while the run is in progress. Per-page overrides go through
/// [`AuditOverrides`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ScanConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub follow_redirects: bool,
    pub max_urls: usize,
    pub min_urls: usize,
    /// Pause between two consecutive page audits
    pub delay_ms: u64,
    /// Regular expressions; a URL matching any of them is not audited
    pub exclude_patterns: Vec<String>,
    /// Inspect `X-Robots-Tag` response headers
    pub check_headers: bool,
    /// Inspect `<meta name="robots">` tags
    pub check_meta: bool,
    pub check_canonical: bool,
    pub check_language: bool,
    pub thresholds: SeoThresholds,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 15,
            follow_redirects: true,
            max_urls: 200,
            min_urls: 1,
            delay_ms: 250,
            exclude_patterns: Vec::new(),
            check_headers: true,
            check_meta: true,
            check_canonical: true,
            check_language: true,
            thresholds: SeoThresholds::default(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from `SITEMAP_AUDIT_*` environment variables,
    /// falling back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let user_agent =
            env::var("SITEMAP_AUDIT_USER_AGENT").unwrap_or_else(|_| defaults.user_agent.clone());
        let timeout_secs = env_parse("SITEMAP_AUDIT_TIMEOUT_SECS", defaults.timeout_secs);
        let max_urls = env_parse("SITEMAP_AUDIT_MAX_URLS", defaults.max_urls);
        let min_urls = env_parse("SITEMAP_AUDIT_MIN_URLS", defaults.min_urls);
        let delay_ms = env_parse("SITEMAP_AUDIT_DELAY_MS", defaults.delay_ms);
        let follow_redirects =
            env_parse("SITEMAP_AUDIT_FOLLOW_REDIRECTS", defaults.follow_redirects);
        let exclude_patterns = env::var("SITEMAP_AUDIT_EXCLUDE")
            .map(|value| split_patterns(&value))
            .unwrap_or_default();

        Self {
            user_agent,
            timeout_secs,
            follow_redirects,
            max_urls,
            min_urls,
            delay_ms,
            exclude_patterns,
            ..defaults
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Per-call overrides for a single page audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditOverrides {
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Split a comma-separated pattern list, dropping empty entries.
pub fn split_patterns(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
