// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! On-page signal extraction.
//!
//! Parsing never fails: malformed markup yields a best-effort tree and the
//! parser's diagnostics are dropped.

use scraper::{ElementRef, Html, Selector};

/// Raw SEO signals read from a page's markup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSignals {
    /// Lowercased `content` of every `<meta name="robots">`
    pub meta_robots: Vec<String>,
    /// Trimmed content of the last `<meta name="description">`
    pub meta_description: String,
    /// `href` of the last `<link rel="canonical">`
    pub canonical: String,
    /// Trimmed text of the first `<title>`
    pub title: String,
    pub h1_count: usize,
    pub links_total: usize,
    /// Anchors whose `rel` contains "nofollow"
    pub links_nofollow: usize,
    /// Character count of the trimmed `<body>` text, if the document has a body
    pub body_text_chars: Option<usize>,
}

/// Parse a document, discarding parse errors.
pub fn parse_lenient(body: &str) -> Html {
    let mut document = Html::parse_document(body);
    if !document.errors.is_empty() {
        tracing::trace!(count = document.errors.len(), "discarding HTML parse errors");
        document.errors.clear();
    }
    document
}

/// Extract the signals the auditor classifies.
///
/// Bytes are decoded as UTF-8 (invalid sequences replaced) so character
/// counts downstream are code-point accurate.
pub fn extract_signals(body: &[u8]) -> PageSignals {
    let text = String::from_utf8_lossy(body);
    let document = parse_lenient(&text);

    let mut signals = PageSignals::default();
    read_meta(&document, &mut signals);
    read_links(&document, &mut signals);

    signals.title = select(&document, "title")
        .first()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    signals.h1_count = select(&document, "h1").len();
    signals.body_text_chars = select(&document, "body")
        .first()
        .map(|el| el.text().collect::<String>().trim().chars().count());

    signals
}

fn read_meta(document: &Html, signals: &mut PageSignals) {
    for meta in select(document, "meta") {
        let name = meta.value().attr("name").unwrap_or("").to_lowercase();
        let content = meta.value().attr("content").unwrap_or("");

        match name.as_str() {
            "robots" => signals.meta_robots.push(content.to_lowercase()),
            "description" => signals.meta_description = content.trim().to_string(),
            _ => {}
        }
    }
}

fn read_links(document: &Html, signals: &mut PageSignals) {
    for link in select(document, "link") {
        let rel = link.value().attr("rel").unwrap_or("");
        if rel.trim().eq_ignore_ascii_case("canonical") {
            signals.canonical = link.value().attr("href").unwrap_or("").trim().to_string();
        }
    }

    for anchor in select(document, "a") {
        signals.links_total += 1;
        let rel = anchor.value().attr("rel").unwrap_or("").to_lowercase();
        if rel.contains("nofollow") {
            signals.links_nofollow += 1;
        }
    }
}

fn select<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    document.select(&selector).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_head_signals() {
        let html = r#"
            <html>
                <head>
                    <title>  Example Page Title  </title>
                    <META NAME="Robots" CONTENT="NoIndex, Follow">
                    <meta name="description" content="first">
                    <meta name="description" content="  second description  ">
                    <link rel="canonical" href="https://a.com/one">
                    <link rel="Canonical" href="https://a.com/two">
                </head>
                <body><h1>One</h1><h1>Two</h1></body>
            </html>
        "#;

        let signals = extract_signals(html.as_bytes());
        assert_eq!(signals.title, "Example Page Title");
        assert_eq!(signals.meta_robots, vec!["noindex, follow"]);
        assert_eq!(signals.meta_description, "second description");
        assert_eq!(signals.canonical, "https://a.com/two");
        assert_eq!(signals.h1_count, 2);
    }

    #[test]
    fn test_counts_nofollow_links() {
        let html = r#"
            <a href="/a" rel="external nofollow sponsored">A</a>
            <a href="/b" rel="noopener">B</a>
            <a href="/c" rel="NOFOLLOW">C</a>
            <a name="anchor">D</a>
        "#;

        let signals = extract_signals(html.as_bytes());
        assert_eq!(signals.links_total, 4);
        assert_eq!(signals.links_nofollow, 2);
    }

    #[test]
    fn test_malformed_markup_degrades() {
        let html = "<html><head><title>Broken</head><body><div><p>text</span></b>";

        let signals = extract_signals(html.as_bytes());
        assert_eq!(signals.h1_count, 0);
        assert_eq!(signals.links_total, 0);
        assert!(signals.body_text_chars.is_some());
    }

    #[test]
    fn test_body_text_counts_code_points() {
        let html = "<html><body>  Привет мир  </body></html>";

        let signals = extract_signals(html.as_bytes());
        assert_eq!(signals.body_text_chars, Some(10));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut body = b"<title>ok".to_vec();
        body.push(0xff);
        body.extend_from_slice(b"</title>");

        let signals = extract_signals(&body);
        assert_eq!(signals.title, "ok\u{fffd}");
    }

    #[test]
    fn test_parse_lenient_clears_errors() {
        let document = parse_lenient("<p><b>unclosed");
        assert!(document.errors.is_empty());
    }
}
