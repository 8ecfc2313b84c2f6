// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use super::config::ScanConfig;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A nested sitemap that could not be expanded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SkippedSitemap {
    pub url: String,
    pub reason: String,
}

/// Flat, deduplicated URL set produced from a sitemap tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SitemapResolution {
    /// Page URLs in discovery order, each appearing once
    pub urls: Vec<String>,
    /// Nested sitemaps that failed and were left out of `urls`
    #[serde(default)]
    pub skipped: Vec<SkippedSitemap>,
}

/// Request to expand a sitemap without auditing its pages
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParseSitemapRequest {
    pub url: String,
    #[serde(default)]
    pub config: Option<ScanConfig>,
}
