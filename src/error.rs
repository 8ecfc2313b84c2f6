// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Error taxonomy for sitemap resolution and scan setup.
//!
//! Per-page fetch failures are not errors at this level: they are recorded
//! on the page's [`PageAudit`](crate::models::audit::PageAudit) and the scan
//! carries on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// The request never produced a usable response
    #[error("failed to fetch {url}: {message}")]
    Transport { url: String, message: String },

    #[error("failed to decompress gzipped sitemap {url}: {message}")]
    Decompress { url: String, message: String },

    #[error("no sitemap files found in index {url}")]
    EmptyIndex { url: String },

    #[error("no URLs found in sitemap {url}")]
    NoUrls { url: String },

    /// Fewer URLs survived filtering than the configured minimum
    #[error("found {found} URLs to audit, at least {min} required")]
    UrlCount { found: usize, min: usize },

    #[error("invalid exclusion pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("scan stopped")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, AuditError>;
