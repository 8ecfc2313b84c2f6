// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use super::audit::PageAudit;
use super::config::ScanConfig;
use super::sitemap::SkippedSitemap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of one scan run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    #[default]
    Idle,
    Resolving,
    Filtering,
    Auditing,
    Completed,
    Stopped,
    Failed,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanState::Completed | ScanState::Stopped | ScanState::Failed
        )
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanState::Idle => write!(f, "idle"),
            ScanState::Resolving => write!(f, "resolving"),
            ScanState::Filtering => write!(f, "filtering"),
            ScanState::Auditing => write!(f, "auditing"),
            ScanState::Completed => write!(f, "completed"),
            ScanState::Stopped => write!(f, "stopped"),
            ScanState::Failed => write!(f, "failed"),
        }
    }
}

/// Aggregate counts over a set of page audits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScanSummary {
    pub total: usize,
    pub noindex: usize,
    pub nofollow: usize,
    /// Pages with a transport error or a 4xx/5xx status
    pub errors: usize,
    pub with_issues: usize,
    pub slow: usize,
}

impl ScanSummary {
    pub fn from_audits(audits: &[PageAudit], slow_page_secs: f64) -> Self {
        audits.iter().fold(Self::default(), |mut summary, audit| {
            summary.total += 1;
            summary.noindex += usize::from(audit.is_noindex);
            summary.nofollow += usize::from(audit.is_nofollow);
            summary.errors += usize::from(audit.is_error());
            summary.with_issues += usize::from(audit.has_issues());
            summary.slow += usize::from(audit.response_time > slow_page_secs);
            summary
        })
    }
}

/// Final outcome of a scan run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub run_id: Uuid,
    pub sitemap_url: String,
    pub state: ScanState,
    pub results: Vec<PageAudit>,
    pub summary: ScanSummary,
    #[serde(default)]
    pub skipped_sitemaps: Vec<SkippedSitemap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Request to start a background scan
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartScanRequest {
    pub sitemap_url: String,
    #[serde(default)]
    pub config: Option<ScanConfig>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartScanResponse {
    pub run_id: Uuid,
}

/// Progress snapshot of a scan run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanStatusResponse {
    pub run_id: Uuid,
    pub sitemap_url: String,
    pub state: ScanState,
    /// Number of URLs queued for auditing, known once filtering finished
    pub total: Option<usize>,
    pub processed: usize,
    pub summary: ScanSummary,
    pub results: Vec<PageAudit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StopScanResponse {
    pub run_id: Uuid,
    pub state: ScanState,
    pub stop_requested: bool,
}
