// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, route handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::error::AuditError;
use crate::models::audit::{CheckPageRequest, PageAudit};
use crate::models::config::{AuditOverrides, ScanConfig};
use crate::models::scan::{
    ScanStatusResponse, StartScanRequest, StartScanResponse, StopScanResponse,
};
use crate::models::sitemap::{ParseSitemapRequest, SitemapResolution};
use crate::models::version::VersionResponse;
use crate::services::fetcher::Fetcher;
use crate::services::registry::ScanRegistry;
use crate::services::scan::ScanController;
use crate::services::stop_signal::StopSignal;
use crate::services::url_filter::UrlFilter;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `SITEMAP_AUDIT_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("SITEMAP_AUDIT_VERSION");

type ApiError = (StatusCode, String);

/// OpenAPI description of every route, served at `/api-docs/openapi.json`
#[derive(OpenApi)]
#[openapi(
    paths(
        version_handler,
        parse_sitemap_handler,
        check_page_handler,
        start_scan_handler,
        scan_status_handler,
        stop_scan_handler
    ),
    tags((name = "sitemap-audit", description = "Sitemap crawling and on-page SEO audits"))
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ScanController>,
    pub registry: ScanRegistry,
    /// Used when a request does not carry its own config
    pub default_config: ScanConfig,
}

impl AppState {
    pub fn new(fetcher: Arc<dyn Fetcher>, default_config: ScanConfig) -> Self {
        Self {
            controller: Arc::new(ScanController::new(fetcher)),
            registry: ScanRegistry::new(),
            default_config,
        }
    }
}

fn validate_url(raw: &str) -> Result<(), ApiError> {
    let parsed =
        url::Url::parse(raw).map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid URL: {e}")))?;

    if parsed.host_str().is_none() {
        return Err((StatusCode::BAD_REQUEST, "URL has no host".to_string()));
    }
    Ok(())
}

fn error_response(err: AuditError) -> ApiError {
    let status = match &err {
        AuditError::Transport { .. } => StatusCode::BAD_GATEWAY,
        AuditError::InvalidPattern { .. } | AuditError::InvalidUrl { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, err.to_string())
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/version",
    tag = "sitemap-audit",
    responses((status = 200, description = "Build version", body = VersionResponse))
)]
pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: "sitemap-audit".to_string(),
        version: VERSION.to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/sitemap/parse",
    tag = "sitemap-audit",
    request_body = ParseSitemapRequest,
    responses(
        (status = 200, description = "Flattened sitemap URLs", body = SitemapResolution),
        (status = 400, description = "Invalid URL"),
        (status = 422, description = "Sitemap has no usable entries"),
        (status = 502, description = "Sitemap could not be fetched")
    )
)]
pub async fn parse_sitemap_handler(
    State(state): State<AppState>,
    Json(payload): Json<ParseSitemapRequest>,
) -> Result<Json<SitemapResolution>, ApiError> {
    validate_url(&payload.url)?;
    let config = payload.config.unwrap_or_else(|| state.default_config.clone());

    state
        .controller
        .resolver()
        .resolve(&payload.url, &config, &StopSignal::new())
        .await
        .map(Json)
        .map_err(error_response)
}

#[utoipa::path(
    post,
    path = "/page/check",
    tag = "sitemap-audit",
    request_body = CheckPageRequest,
    responses(
        (status = 200, description = "Audit row, including failed fetches", body = PageAudit),
        (status = 400, description = "Invalid URL")
    )
)]
pub async fn check_page_handler(
    State(state): State<AppState>,
    Json(payload): Json<CheckPageRequest>,
) -> Result<Json<PageAudit>, ApiError> {
    validate_url(&payload.url)?;
    let overrides = AuditOverrides {
        user_agent: payload.user_agent,
        timeout_secs: payload.timeout_secs,
    };

    let audit = state
        .controller
        .auditor()
        .audit(&payload.url, &state.default_config, &overrides)
        .await;
    Ok(Json(audit))
}

#[utoipa::path(
    post,
    path = "/scans",
    tag = "sitemap-audit",
    request_body = StartScanRequest,
    responses(
        (status = 200, description = "Scan started in the background", body = StartScanResponse),
        (status = 400, description = "Invalid URL or exclusion pattern")
    )
)]
pub async fn start_scan_handler(
    State(state): State<AppState>,
    Json(payload): Json<StartScanRequest>,
) -> Result<Json<StartScanResponse>, ApiError> {
    validate_url(&payload.sitemap_url)?;
    let config = payload.config.unwrap_or_else(|| state.default_config.clone());
    UrlFilter::new(&config.exclude_patterns).map_err(error_response)?;

    let run_id = state
        .registry
        .start(state.controller.clone(), payload.sitemap_url, config);
    Ok(Json(StartScanResponse { run_id }))
}

#[utoipa::path(
    get,
    path = "/scans/{run_id}",
    tag = "sitemap-audit",
    params(("run_id" = Uuid, Path, description = "Scan run id")),
    responses(
        (status = 200, description = "Progress and results so far", body = ScanStatusResponse),
        (status = 404, description = "Unknown run id")
    )
)]
pub async fn scan_status_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<ScanStatusResponse>, ApiError> {
    state
        .registry
        .get(&run_id)
        .map(|handle| Json(handle.status()))
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown scan {run_id}")))
}

#[utoipa::path(
    post,
    path = "/scans/{run_id}/stop",
    tag = "sitemap-audit",
    params(("run_id" = Uuid, Path, description = "Scan run id")),
    responses(
        (status = 200, description = "Stop requested or run already finished", body = StopScanResponse),
        (status = 404, description = "Unknown run id")
    )
)]
pub async fn stop_scan_handler(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<StopScanResponse>, ApiError> {
    state
        .registry
        .stop(&run_id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown scan {run_id}")))
}

pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .route("/sitemap/parse", post(parse_sitemap_handler))
        .route("/page/check", post(check_page_handler))
        .route("/scans", post(start_scan_handler))
        .route("/scans/{run_id}", get(scan_status_handler))
        .route("/scans/{run_id}/stop", post(stop_scan_handler))
        .route("/api-docs/openapi.json", get(openapi_handler))
        .with_state(state)
}
