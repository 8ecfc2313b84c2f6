// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Sitemap discovery: gzip detection, sitemap-index expansion and the
//! plain-text URL list fallback.

use crate::error::{AuditError, Result};
use crate::models::config::ScanConfig;
use crate::models::fetch::FetchOptions;
use crate::models::sitemap::{SitemapResolution, SkippedSitemap};
use crate::services::fetcher::Fetcher;
use crate::services::stop_signal::StopSignal;
use flate2::read::GzDecoder;
use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use std::collections::HashSet;
use std::io::Read;
use std::sync::{Arc, LazyLock};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const INDEX_MARKER: &str = "<sitemapindex";
/// Index-within-index nesting beyond this is not followed
const MAX_INDEX_DEPTH: usize = 5;

static LOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<loc>(.*?)</loc>").expect("valid <loc> pattern"));

/// Expands a sitemap URL into the page URLs it lists
#[derive(Clone)]
pub struct SitemapResolver {
    fetcher: Arc<dyn Fetcher>,
}

impl SitemapResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolve `url` into a deduplicated URL list capped at `config.max_urls`.
    ///
    /// A failure of the root document is returned as an error. Failures of
    /// nested sitemaps are recorded in [`SitemapResolution::skipped`] and the
    /// expansion continues with the next entry.
    pub async fn resolve(
        &self,
        url: &str,
        config: &ScanConfig,
        stop: &StopSignal,
    ) -> Result<SitemapResolution> {
        let options = FetchOptions::for_sitemap(config);
        let mut walk = Walk::new(config.max_urls);

        self.expand(url, &options, stop, 0, &mut walk).await?;

        tracing::info!(
            sitemap = url,
            urls = walk.urls.len(),
            skipped = walk.skipped.len(),
            "sitemap resolved"
        );
        Ok(walk.into_resolution())
    }

    fn expand<'a>(
        &'a self,
        url: &'a str,
        options: &'a FetchOptions,
        stop: &'a StopSignal,
        depth: usize,
        walk: &'a mut Walk,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            walk.visited.insert(url.to_string());
            let text = self.load(url, options).await?;
            let locations = extract_locations(&text);

            if text.contains(INDEX_MARKER) {
                if locations.is_empty() {
                    return Err(AuditError::EmptyIndex {
                        url: url.to_string(),
                    });
                }

                for location in locations {
                    if stop.is_stopped() {
                        return Err(AuditError::Stopped);
                    }
                    if walk.is_full() {
                        break;
                    }
                    if walk.visited.contains(&location) {
                        continue;
                    }
                    if depth >= MAX_INDEX_DEPTH {
                        walk.skip(&location, "sitemap index nested too deeply".to_string());
                        continue;
                    }

                    match self.expand(&location, options, stop, depth + 1, walk).await {
                        Ok(()) => {}
                        Err(AuditError::Stopped) => return Err(AuditError::Stopped),
                        Err(e) => walk.skip(&location, e.to_string()),
                    }
                }
                return Ok(());
            }

            let candidates = if locations.is_empty() {
                plain_text_urls(&text)
            } else {
                locations
            };

            if candidates.is_empty() {
                return Err(AuditError::NoUrls {
                    url: url.to_string(),
                });
            }

            tracing::debug!(sitemap = url, urls = candidates.len(), "leaf sitemap parsed");
            walk.extend(candidates);
            Ok(())
        }
        .boxed()
    }

    /// Fetch a sitemap document and return it as text, gunzipping if needed.
    async fn load(&self, url: &str, options: &FetchOptions) -> Result<String> {
        let result = self.fetcher.fetch(url, options).await;
        if !result.success {
            return Err(AuditError::Transport {
                url: url.to_string(),
                message: result
                    .error
                    .unwrap_or_else(|| "unknown transport error".to_string()),
            });
        }

        let bytes = if result.body.starts_with(&GZIP_MAGIC) {
            decompress(&result.body).map_err(|e| AuditError::Decompress {
                url: url.to_string(),
                message: e.to_string(),
            })?
        } else {
            result.body
        };

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Accumulator shared across one recursive expansion
struct Walk {
    max_urls: usize,
    urls: Vec<String>,
    seen: HashSet<String>,
    visited: HashSet<String>,
    skipped: Vec<SkippedSitemap>,
}

impl Walk {
    fn new(max_urls: usize) -> Self {
        Self {
            max_urls,
            urls: Vec::new(),
            seen: HashSet::new(),
            visited: HashSet::new(),
            skipped: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.urls.len() >= self.max_urls
    }

    fn extend(&mut self, candidates: Vec<String>) {
        for candidate in candidates {
            if self.is_full() {
                break;
            }
            if self.seen.insert(candidate.clone()) {
                self.urls.push(candidate);
            }
        }
    }

    fn skip(&mut self, url: &str, reason: String) {
        tracing::warn!(sitemap = url, reason = %reason, "skipping nested sitemap");
        self.skipped.push(SkippedSitemap {
            url: url.to_string(),
            reason,
        });
    }

    fn into_resolution(self) -> SitemapResolution {
        SitemapResolution {
            urls: self.urls,
            skipped: self.skipped,
        }
    }
}

fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

/// All `<loc>` values in document order, trimmed and entity-decoded.
fn extract_locations(text: &str) -> Vec<String> {
    LOC_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| html_escape::decode_html_entities(m.as_str().trim()).into_owned())
        .filter(|loc| !loc.is_empty())
        .collect()
}

/// One absolute http(s) URL per line; anything else is dropped.
fn plain_text_urls(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| is_absolute_url(line))
        .map(str::to_string)
        .collect()
}

fn is_absolute_url(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}
