// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::audit::{Language, PageAudit, SeoIssue};
use crate::models::config::{AuditOverrides, ScanConfig};
use crate::models::fetch::{FetchOptions, FetchResult};
use crate::services::fetcher::Fetcher;
use crate::services::html::{extract_signals, PageSignals};
use std::sync::Arc;
use url::Url;

const ROBOTS_HEADER: &str = "x-robots-tag";

/// Fetches a page and turns it into a [`PageAudit`]
#[derive(Clone)]
pub struct PageAuditor {
    fetcher: Arc<dyn Fetcher>,
}

impl PageAuditor {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Audit one URL. Transport failures come back as a failed row, never as an error.
    pub async fn audit(
        &self,
        url: &str,
        config: &ScanConfig,
        overrides: &AuditOverrides,
    ) -> PageAudit {
        let options = FetchOptions::for_page(config, overrides);
        let fetched = self.fetcher.fetch(url, &options).await;

        if !fetched.success {
            let error = fetched
                .error
                .unwrap_or_else(|| "unknown transport error".to_string());
            tracing::debug!(url, error = %error, "page fetch failed");
            return PageAudit::failed(url, error, fetched.status_code);
        }

        evaluate(url, &fetched, config)
    }
}

/// Build the audit row for a successfully fetched page.
pub fn evaluate(url: &str, fetched: &FetchResult, config: &ScanConfig) -> PageAudit {
    let mut audit = PageAudit {
        url: url.to_string(),
        http_code: fetched.status_code,
        response_time: round_secs(fetched.elapsed_secs),
        content_length: fetched.body.len(),
        ..PageAudit::default()
    };

    if config.check_headers {
        apply_header_directives(&mut audit, fetched.header_lines());
    }

    if fetched.body.is_empty() {
        return audit;
    }

    let signals = extract_signals(&fetched.body);
    if config.check_meta {
        apply_meta_directives(&mut audit, &signals.meta_robots);
    }

    let PageSignals {
        meta_description,
        canonical,
        title,
        h1_count,
        links_total,
        links_nofollow,
        body_text_chars,
        ..
    } = signals;

    audit.meta_description = meta_description;
    audit.canonical = canonical;
    audit.title = title;
    audit.h1_count = h1_count;
    audit.links_total = links_total;
    audit.links_nofollow = links_nofollow;

    if config.check_language {
        audit.language = detect_language(&format!("{} {}", audit.title, audit.meta_description));
    }

    audit.seo_issues = classify(&audit, body_text_chars, config)
        .iter()
        .map(ToString::to_string)
        .collect();
    audit
}

fn apply_header_directives<'a>(
    audit: &mut PageAudit,
    headers: impl Iterator<Item = (&'a str, &'a str)>,
) {
    for (name, value) in headers {
        if name.trim().eq_ignore_ascii_case(ROBOTS_HEADER) {
            apply_directive(audit, &value.to_lowercase(), "header");
        }
    }
}

fn apply_meta_directives(audit: &mut PageAudit, contents: &[String]) {
    for content in contents {
        apply_directive(audit, content, "meta");
    }
}

fn apply_directive(audit: &mut PageAudit, value: &str, source: &str) {
    if value.contains("noindex") {
        audit.is_noindex = true;
        audit.robots_directives.push(format!("{}:noindex", source));
    }
    if value.contains("nofollow") {
        audit.is_nofollow = true;
        audit.robots_directives.push(format!("{}:nofollow", source));
    }
}

/// Classify a page by script: Cyrillic only, Latin only, both, or neither.
pub fn detect_language(text: &str) -> Language {
    let text = text.trim();
    if text.is_empty() {
        return Language::Unknown;
    }

    let cyrillic = text
        .chars()
        .any(|c| matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё'));
    let latin = text.chars().any(|c| c.is_ascii_alphabetic());

    match (cyrillic, latin) {
        (true, false) => Language::Ru,
        (false, true) => Language::En,
        (true, true) => Language::Mixed,
        (false, false) => Language::Other,
    }
}

/// Run every check in order and collect the issues found.
pub fn classify(
    audit: &PageAudit,
    body_text_chars: Option<usize>,
    config: &ScanConfig,
) -> Vec<SeoIssue> {
    let thresholds = &config.thresholds;
    let (title_allowance, description_allowance) = if audit.language == Language::Ru {
        (
            thresholds.ru_title_allowance,
            thresholds.ru_description_allowance,
        )
    } else {
        (0, 0)
    };

    let mut issues = Vec::new();

    if audit.title.is_empty() {
        issues.push(SeoIssue::MissingTitle);
    } else {
        let len = audit.title.chars().count();
        if len < thresholds.min_title_length {
            issues.push(SeoIssue::TitleShort(len));
        } else if len > thresholds.max_title_length.saturating_add(title_allowance) {
            issues.push(SeoIssue::TitleLong(len));
        }
    }

    if audit.meta_description.is_empty() {
        issues.push(SeoIssue::MissingDescription);
    } else {
        let len = audit.meta_description.chars().count();
        if len < thresholds.min_description_length {
            issues.push(SeoIssue::DescriptionShort(len));
        } else if len > thresholds.max_description_length.saturating_add(description_allowance) {
            issues.push(SeoIssue::DescriptionLong(len));
        }
    }

    match audit.h1_count {
        0 => issues.push(SeoIssue::NoH1),
        1 => {}
        count => issues.push(SeoIssue::MultipleH1(count)),
    }

    if config.check_canonical
        && !audit.canonical.is_empty()
        && !canonical_matches(&audit.url, &audit.canonical)
    {
        issues.push(SeoIssue::CanonicalMismatch);
    }

    if let Some(chars) = body_text_chars {
        if chars < thresholds.low_content_chars {
            issues.push(SeoIssue::LowContent(thresholds.low_content_chars));
        }
    }

    if audit.response_time > thresholds.slow_page_secs {
        issues.push(SeoIssue::Slow(audit.response_time));
    }

    issues
}

/// Compare host and path only; scheme, query and fragment are ignored.
/// A relative canonical is resolved against the page URL first.
pub fn canonical_matches(page_url: &str, canonical: &str) -> bool {
    let Ok(page) = Url::parse(page_url) else {
        return page_url == canonical;
    };

    page.join(canonical)
        .map(|canonical| host_and_path(&canonical) == host_and_path(&page))
        .unwrap_or(false)
}

fn host_and_path(url: &Url) -> String {
    format!("{}{}", url.host_str().unwrap_or(""), url.path())
}

fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
