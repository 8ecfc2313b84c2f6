// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Scan orchestration: resolve the sitemap, filter, then audit pages one at a
//! time until the list is exhausted or the run is asked to stop.

use crate::error::AuditError;
use crate::models::audit::PageAudit;
use crate::models::config::{AuditOverrides, ScanConfig};
use crate::models::scan::{ScanReport, ScanState, ScanSummary};
use crate::models::sitemap::SkippedSitemap;
use crate::services::fetcher::Fetcher;
use crate::services::page_auditor::PageAuditor;
use crate::services::sitemap::SitemapResolver;
use crate::services::stop_signal::StopSignal;
use crate::services::url_filter::UrlFilter;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time::sleep;
use uuid::Uuid;

/// Receives progress from a running scan.
///
/// Callbacks run inline on the scan task, so they should return quickly.
pub trait ScanObserver: Send {
    fn on_state(&mut self, _state: ScanState) {}

    /// Number of URLs that will be audited, reported once filtering finished
    fn on_queued(&mut self, _total: usize) {}

    /// Called as soon as each page audit completes
    fn on_page(&mut self, _index: usize, _audit: &PageAudit) {}
}

impl ScanObserver for () {}

/// Drives a single scan run through its states
#[derive(Clone)]
pub struct ScanController {
    resolver: SitemapResolver,
    auditor: PageAuditor,
}

impl ScanController {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            resolver: SitemapResolver::new(fetcher.clone()),
            auditor: PageAuditor::new(fetcher),
        }
    }

    pub fn resolver(&self) -> &SitemapResolver {
        &self.resolver
    }

    pub fn auditor(&self) -> &PageAuditor {
        &self.auditor
    }

    /// Execute one run to a terminal state.
    ///
    /// Setup errors (sitemap resolution, URL count) end the run as
    /// [`ScanState::Failed`] before any page is fetched. The stop signal is
    /// checked before each audit; results gathered up to that point are kept.
    pub async fn run<O: ScanObserver>(
        &self,
        run_id: Uuid,
        sitemap_url: &str,
        config: &ScanConfig,
        stop: &StopSignal,
        observer: &mut O,
    ) -> ScanReport {
        let mut run = Run::new(run_id, sitemap_url, observer);

        if let Err(e) = url::Url::parse(sitemap_url) {
            let err = AuditError::InvalidUrl {
                url: sitemap_url.to_string(),
                message: e.to_string(),
            };
            return run.fail(err, config);
        }

        let filter = match UrlFilter::new(&config.exclude_patterns) {
            Ok(filter) => filter,
            Err(e) => return run.fail(e, config),
        };

        run.enter(ScanState::Resolving);
        let resolution = match self.resolver.resolve(sitemap_url, config, stop).await {
            Ok(resolution) => resolution,
            Err(AuditError::Stopped) => return run.finish(ScanState::Stopped, config),
            Err(e) => return run.fail(e, config),
        };
        run.skipped = resolution.skipped;

        if resolution.urls.is_empty() {
            let err = AuditError::NoUrls {
                url: sitemap_url.to_string(),
            };
            return run.fail(err, config);
        }

        run.enter(ScanState::Filtering);
        let mut urls = filter.filter(resolution.urls);
        urls.truncate(config.max_urls);

        if urls.len() < config.min_urls {
            let err = AuditError::UrlCount {
                found: urls.len(),
                min: config.min_urls,
            };
            return run.fail(err, config);
        }
        run.observer.on_queued(urls.len());

        run.enter(ScanState::Auditing);
        let delay = config.delay();
        let overrides = AuditOverrides::default();

        for (index, url) in urls.iter().enumerate() {
            if stop.is_stopped() {
                return run.finish(ScanState::Stopped, config);
            }
            if index > 0 && !delay.is_zero() {
                sleep(delay).await;
                if stop.is_stopped() {
                    return run.finish(ScanState::Stopped, config);
                }
            }

            let audit = self.auditor.audit(url, config, &overrides).await;
            tracing::debug!(
                run_id = %run_id,
                url = %audit.url,
                http_code = audit.http_code,
                issues = audit.seo_issues.len(),
                "page audited"
            );
            run.observer.on_page(index, &audit);
            run.results.push(audit);
        }

        run.finish(ScanState::Completed, config)
    }
}

/// Per-run accumulator; never shared between runs
struct Run<'o, O: ScanObserver> {
    run_id: Uuid,
    sitemap_url: String,
    started_at: DateTime<Utc>,
    state: ScanState,
    results: Vec<PageAudit>,
    skipped: Vec<SkippedSitemap>,
    observer: &'o mut O,
}

impl<'o, O: ScanObserver> Run<'o, O> {
    fn new(run_id: Uuid, sitemap_url: &str, observer: &'o mut O) -> Self {
        Self {
            run_id,
            sitemap_url: sitemap_url.to_string(),
            started_at: Utc::now(),
            state: ScanState::Idle,
            results: Vec::new(),
            skipped: Vec::new(),
            observer,
        }
    }

    fn enter(&mut self, state: ScanState) {
        tracing::info!(
            run_id = %self.run_id,
            from = %self.state,
            to = %state,
            "scan state changed"
        );
        self.state = state;
        self.observer.on_state(state);
    }

    fn fail(self, err: AuditError, config: &ScanConfig) -> ScanReport {
        tracing::warn!(run_id = %self.run_id, error = %err, "scan failed");
        self.build(ScanState::Failed, Some(err.to_string()), config)
    }

    fn finish(self, state: ScanState, config: &ScanConfig) -> ScanReport {
        self.build(state, None, config)
    }

    fn build(
        mut self,
        state: ScanState,
        error: Option<String>,
        config: &ScanConfig,
    ) -> ScanReport {
        self.enter(state);
        let summary = ScanSummary::from_audits(&self.results, config.thresholds.slow_page_secs);
        ScanReport {
            run_id: self.run_id,
            sitemap_url: self.sitemap_url,
            state,
            results: self.results,
            summary,
            skipped_sitemaps: self.skipped,
            error,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
