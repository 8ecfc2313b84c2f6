// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! In-memory bookkeeping for scans started over the HTTP API.
//!
//! Every run gets its own stop signal and result list, keyed by run id, so
//! stopping one run never touches another. Finished runs are kept for a
//! retention window and then evicted.

use crate::models::audit::PageAudit;
use crate::models::config::ScanConfig;
use crate::models::scan::{
    ScanReport, ScanState, ScanStatusResponse, ScanSummary, StopScanResponse,
};
use crate::services::scan::{ScanController, ScanObserver};
use crate::services::stop_signal::StopSignal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How long a finished run stays queryable
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Default)]
struct Progress {
    state: ScanState,
    total: Option<usize>,
    results: Vec<PageAudit>,
    error: Option<String>,
    finished_at: Option<Instant>,
}

/// Shared view of one run: written by the scan task, read by handlers
#[derive(Debug)]
pub struct ScanHandle {
    run_id: Uuid,
    sitemap_url: String,
    slow_page_secs: f64,
    stop: StopSignal,
    progress: Mutex<Progress>,
}

impl ScanHandle {
    fn new(run_id: Uuid, sitemap_url: &str, config: &ScanConfig) -> Self {
        Self {
            run_id,
            sitemap_url: sitemap_url.to_string(),
            slow_page_secs: config.thresholds.slow_page_secs,
            stop: StopSignal::new(),
            progress: Mutex::new(Progress::default()),
        }
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        // A panic while holding the lock leaves plain data behind; keep serving it
        self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> ScanState {
        self.progress().state
    }

    pub fn request_stop(&self) {
        self.stop.stop();
    }

    pub fn status(&self) -> ScanStatusResponse {
        let progress = self.progress();
        ScanStatusResponse {
            run_id: self.run_id,
            sitemap_url: self.sitemap_url.clone(),
            state: progress.state,
            total: progress.total,
            processed: progress.results.len(),
            summary: ScanSummary::from_audits(&progress.results, self.slow_page_secs),
            results: progress.results.clone(),
            error: progress.error.clone(),
        }
    }

    fn complete(&self, report: &ScanReport) {
        let mut progress = self.progress();
        progress.state = report.state;
        progress.error = report.error.clone();
        progress.finished_at = Some(Instant::now());
    }

    fn expired(&self, now: Instant, retention: Duration) -> bool {
        self.progress()
            .finished_at
            .is_some_and(|finished| now.saturating_duration_since(finished) >= retention)
    }
}

struct HandleObserver(Arc<ScanHandle>);

impl ScanObserver for HandleObserver {
    fn on_state(&mut self, state: ScanState) {
        self.0.progress().state = state;
    }

    fn on_queued(&mut self, total: usize) {
        self.0.progress().total = Some(total);
    }

    fn on_page(&mut self, _index: usize, audit: &PageAudit) {
        self.0.progress().results.push(audit.clone());
    }
}

/// All runs started by this process that are still running or within retention
#[derive(Clone)]
pub struct ScanRegistry {
    runs: Arc<RwLock<HashMap<Uuid, Arc<ScanHandle>>>>,
    retention: Duration,
}

impl Default for ScanRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    /// Drop finished runs older than the retention window. Returns how many went.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
        let before = runs.len();
        runs.retain(|_, handle| !handle.expired(now, self.retention));

        let evicted = before - runs.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = runs.len(), "evicted finished scans");
        }
        evicted
    }

    /// Start a run in the background and return its id immediately.
    pub fn start(
        &self,
        controller: Arc<ScanController>,
        sitemap_url: String,
        config: ScanConfig,
    ) -> Uuid {
        self.prune();
        let run_id = Uuid::now_v7();
        let handle = Arc::new(ScanHandle::new(run_id, &sitemap_url, &config));

        self.runs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(run_id, handle.clone());

        tokio::spawn(async move {
            let stop = handle.stop.clone();
            let mut observer = HandleObserver(handle.clone());
            let report = controller
                .run(run_id, &sitemap_url, &config, &stop, &mut observer)
                .await;
            tracing::info!(
                run_id = %run_id,
                state = %report.state,
                pages = report.results.len(),
                "background scan finished"
            );
            handle.complete(&report);
        });

        run_id
    }

    pub fn get(&self, run_id: &Uuid) -> Option<Arc<ScanHandle>> {
        self.runs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(run_id)
            .cloned()
    }

    /// Ask one run to stop. Returns `None` for an unknown id.
    pub fn stop(&self, run_id: &Uuid) -> Option<StopScanResponse> {
        let handle = self.get(run_id)?;
        let state = handle.state();
        let stop_requested = !state.is_terminal();
        if stop_requested {
            handle.request_stop();
        }

        Some(StopScanResponse {
            run_id: handle.run_id(),
            state,
            stop_requested,
        })
    }
}
