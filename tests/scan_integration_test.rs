// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use sitemap_audit::models::audit::PageAudit;
use sitemap_audit::models::config::ScanConfig;
use sitemap_audit::models::fetch::{FetchOptions, FetchResult};
use sitemap_audit::models::scan::ScanState;
use sitemap_audit::services::fetcher::Fetcher;
use sitemap_audit::services::scan::{ScanController, ScanObserver};
use sitemap_audit::services::stop_signal::StopSignal;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Serves fixed bodies keyed by URL and records every request
#[derive(Default)]
struct FakeSite {
    bodies: HashMap<String, Vec<u8>>,
    headers: HashMap<String, Vec<(String, String)>>,
    requests: Mutex<Vec<String>>,
}

impl FakeSite {
    fn page(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    fn raw(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    fn header(mut self, url: &str, name: &str, value: &str) -> Self {
        self.headers
            .entry(url.to_string())
            .or_default()
            .push((name.to_string(), value.to_string()));
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeSite {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> FetchResult {
        self.requests.lock().unwrap().push(url.to_string());
        match self.bodies.get(url) {
            Some(body) => FetchResult {
                success: true,
                body: body.clone(),
                headers: options
                    .want_headers
                    .then(|| self.headers.get(url).cloned().unwrap_or_default()),
                status_code: 200,
                elapsed_secs: 0.123,
                error: None,
            },
            None => FetchResult::failure("Failed to fetch: connection refused", 0),
        }
    }
}

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn quiet_config() -> ScanConfig {
    ScanConfig {
        delay_ms: 0,
        ..ScanConfig::default()
    }
}

const GOOD_PAGE: &str = r#"<html><head>
    <title>A perfectly reasonable page title</title>
    <meta name="description" content="A description that is long enough to pass the lower bound check easily.">
    </head><body><h1>Heading</h1>
    <p>Plenty of body copy follows so the page clears the thin content check. It talks about
    products, shipping, returns and the company history in enough detail that a reader would
    find it useful, and it keeps going for a few more sentences just to be safe.</p>
    </body></html>"#;

#[tokio::test]
async fn test_three_page_sitemap_completes() {
    let site = Arc::new(
        FakeSite::default()
            .page(
                "https://shop.test/sitemap.xml",
                r#"<?xml version="1.0"?>
                <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                    <url><loc>https://shop.test/a</loc></url>
                    <url><loc>https://shop.test/b</loc></url>
                    <url><loc>https://shop.test/c</loc></url>
                </urlset>"#,
            )
            .page("https://shop.test/a", GOOD_PAGE)
            .page("https://shop.test/b", GOOD_PAGE)
            .page("https://shop.test/c", "<html><head></head><body></body></html>"),
    );
    let controller = ScanController::new(site.clone());
    let config = ScanConfig {
        max_urls: 10,
        min_urls: 1,
        ..quiet_config()
    };

    let report = controller
        .run(
            Uuid::now_v7(),
            "https://shop.test/sitemap.xml",
            &config,
            &StopSignal::new(),
            &mut (),
        )
        .await;

    assert_eq!(report.state, ScanState::Completed);
    assert!(report.error.is_none());

    let urls: Vec<&str> = report.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://shop.test/a", "https://shop.test/b", "https://shop.test/c"]
    );

    assert!(report.results[0].seo_issues.is_empty());
    assert_eq!(report.results[0].response_time, 0.12);
    assert!(report.results[2]
        .seo_issues
        .contains(&"Missing title".to_string()));
    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.with_issues, 1);
    assert_eq!(report.summary.errors, 0);
}

#[tokio::test]
async fn test_index_with_gzip_child_dedups_urls() {
    let child = r#"<urlset>
        <url><loc>https://shop.test/a</loc></url>
        <url><loc>https://shop.test/b</loc></url>
    </urlset>"#;
    let site = Arc::new(
        FakeSite::default()
            .page(
                "https://shop.test/sitemap_index.xml",
                r#"<sitemapindex>
                    <sitemap><loc>https://shop.test/pages.xml</loc></sitemap>
                    <sitemap><loc>https://shop.test/pages.xml.gz</loc></sitemap>
                    <sitemap><loc>https://shop.test/missing.xml</loc></sitemap>
                </sitemapindex>"#,
            )
            .page("https://shop.test/pages.xml", child)
            .raw("https://shop.test/pages.xml.gz", gzip(child))
            .page("https://shop.test/a", GOOD_PAGE)
            .page("https://shop.test/b", GOOD_PAGE),
    );
    let controller = ScanController::new(site.clone());

    let report = controller
        .run(
            Uuid::now_v7(),
            "https://shop.test/sitemap_index.xml",
            &quiet_config(),
            &StopSignal::new(),
            &mut (),
        )
        .await;

    assert_eq!(report.state, ScanState::Completed);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.skipped_sitemaps.len(), 1);
    assert_eq!(report.skipped_sitemaps[0].url, "https://shop.test/missing.xml");

    let page_requests = site
        .requests()
        .into_iter()
        .filter(|url| !url.contains(".xml"))
        .count();
    assert_eq!(page_requests, 2);
}

#[tokio::test]
async fn test_excluded_urls_are_never_fetched() {
    let site = Arc::new(
        FakeSite::default()
            .page(
                "https://shop.test/sitemap.xml",
                "https://shop.test/a\nhttps://shop.test/tag/x\nhttps://shop.test/b?page=2\n",
            )
            .page("https://shop.test/a", GOOD_PAGE),
    );
    let controller = ScanController::new(site.clone());
    let config = ScanConfig {
        exclude_patterns: vec!["/tag/".to_string(), r"\?page=".to_string()],
        ..quiet_config()
    };

    let report = controller
        .run(
            Uuid::now_v7(),
            "https://shop.test/sitemap.xml",
            &config,
            &StopSignal::new(),
            &mut (),
        )
        .await;

    assert_eq!(report.state, ScanState::Completed);
    assert_eq!(report.results.len(), 1);
    assert_eq!(
        site.requests(),
        vec!["https://shop.test/sitemap.xml", "https://shop.test/a"]
    );
}

#[tokio::test]
async fn test_header_directives_reach_the_report() {
    let site = Arc::new(
        FakeSite::default()
            .page(
                "https://shop.test/sitemap.xml",
                "<urlset><url><loc>https://shop.test/private</loc></url></urlset>",
            )
            .page("https://shop.test/private", GOOD_PAGE)
            .header("https://shop.test/private", "X-Robots-Tag", "noindex"),
    );
    let controller = ScanController::new(site);

    let report = controller
        .run(
            Uuid::now_v7(),
            "https://shop.test/sitemap.xml",
            &quiet_config(),
            &StopSignal::new(),
            &mut (),
        )
        .await;

    let page = &report.results[0];
    assert!(page.is_noindex);
    assert!(!page.is_nofollow);
    assert_eq!(page.robots_directives, vec!["header:noindex"]);
    assert_eq!(report.summary.noindex, 1);
}

/// Requests a stop from inside the progress callback once `after` pages are done
struct StopAfter {
    after: usize,
    stop: StopSignal,
    seen: Vec<String>,
}

impl ScanObserver for StopAfter {
    fn on_page(&mut self, index: usize, audit: &PageAudit) {
        self.seen.push(audit.url.clone());
        if index + 1 == self.after {
            self.stop.stop();
        }
    }
}

#[tokio::test]
async fn test_stop_keeps_completed_pages_only() {
    let mut site = FakeSite::default().page(
        "https://shop.test/sitemap.xml",
        &(0..6)
            .map(|i| format!("<loc>https://shop.test/p{}</loc>", i))
            .collect::<String>(),
    );
    for i in 0..6 {
        site = site.page(&format!("https://shop.test/p{}", i), GOOD_PAGE);
    }
    let site = Arc::new(site);
    let controller = ScanController::new(site.clone());
    let stop = StopSignal::new();
    let mut observer = StopAfter {
        after: 3,
        stop: stop.clone(),
        seen: Vec::new(),
    };

    let report = controller
        .run(
            Uuid::now_v7(),
            "https://shop.test/sitemap.xml",
            &quiet_config(),
            &stop,
            &mut observer,
        )
        .await;

    assert_eq!(report.state, ScanState::Stopped);
    assert_eq!(report.results.len(), 3);
    assert_eq!(observer.seen.len(), 3);
    // sitemap plus exactly three pages
    assert_eq!(site.requests().len(), 4);
}

#[tokio::test]
async fn test_too_few_urls_fails_before_auditing() {
    let site = Arc::new(FakeSite::default().page(
        "https://shop.test/sitemap.xml",
        "<urlset><url><loc>https://shop.test/only</loc></url></urlset>",
    ));
    let controller = ScanController::new(site.clone());
    let config = ScanConfig {
        min_urls: 5,
        ..quiet_config()
    };

    let report = controller
        .run(
            Uuid::now_v7(),
            "https://shop.test/sitemap.xml",
            &config,
            &StopSignal::new(),
            &mut (),
        )
        .await;

    assert_eq!(report.state, ScanState::Failed);
    assert_eq!(
        report.error.as_deref(),
        Some("found 1 URLs to audit, at least 5 required")
    );
    assert!(report.results.is_empty());
    assert_eq!(site.requests().len(), 1);
}
