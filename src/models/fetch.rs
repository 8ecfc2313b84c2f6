// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use super::config::{AuditOverrides, ScanConfig};
use std::time::Duration;

/// Options for a single GET request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// User agent string to send
    pub user_agent: String,
    pub timeout: Duration,
    pub follow_redirects: bool,
    /// Capture response headers into the result
    pub want_headers: bool,
}

impl FetchOptions {
    /// Options for fetching sitemap documents; headers are never needed there.
    pub fn for_sitemap(config: &ScanConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            follow_redirects: config.follow_redirects,
            want_headers: false,
        }
    }

    /// Options for fetching a page, with any per-call overrides applied.
    pub fn for_page(config: &ScanConfig, overrides: &AuditOverrides) -> Self {
        Self {
            user_agent: overrides
                .user_agent
                .clone()
                .unwrap_or_else(|| config.user_agent.clone()),
            timeout: overrides
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.timeout()),
            follow_redirects: config.follow_redirects,
            want_headers: config.check_headers,
        }
    }
}

/// Outcome of one HTTP attempt
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    /// False only when the transport failed; HTTP error statuses still count as success
    pub success: bool,
    /// Response body, already decoded from any transfer compression
    pub body: Vec<u8>,
    /// Response headers in arrival order, when requested
    pub headers: Option<Vec<(String, String)>>,
    /// Last HTTP status seen, 0 if none was received
    pub status_code: u16,
    /// Seconds from sending the request until the body was fully read
    pub elapsed_secs: f64,
    /// Transport error message if the fetch failed
    pub error: Option<String>,
}

impl FetchResult {
    pub fn failure(error: impl Into<String>, status_code: u16) -> Self {
        Self {
            success: false,
            status_code,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Captured response headers as `(name, value)` pairs.
    pub fn header_lines(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .flatten()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}
