// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use sitemap_audit::app::{create_router, AppState, VERSION};
use sitemap_audit::models::audit::PageAudit;
use sitemap_audit::models::config::ScanConfig;
use sitemap_audit::models::scan::{ScanReport, ScanState};
use sitemap_audit::services::fetcher::HttpFetcher;
use sitemap_audit::services::logging;
use sitemap_audit::services::scan::{ScanController, ScanObserver};
use sitemap_audit::services::stop_signal::StopSignal;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

/// Crawl a sitemap and audit every listed page for on-page SEO signals
#[derive(Parser, Debug)]
#[command(name = "sitemap-audit")]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "SITEMAP_AUDIT_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,
    },

    /// Run one scan in the foreground
    Scan(ScanArgs),
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Sitemap or sitemap index URL
    sitemap_url: String,

    #[arg(long)]
    max_urls: Option<usize>,

    #[arg(long)]
    min_urls: Option<usize>,

    /// Pause between page requests
    #[arg(long)]
    delay_ms: Option<u64>,

    #[arg(long)]
    timeout_secs: Option<u64>,

    #[arg(long)]
    user_agent: Option<String>,

    /// Regex; matching URLs are not audited. Repeatable.
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    #[arg(long, default_value_t = false)]
    no_follow_redirects: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

impl ScanArgs {
    /// Layer command-line flags over the environment-derived config
    fn apply(&self, config: &mut ScanConfig) {
        if let Some(max_urls) = self.max_urls {
            config.max_urls = max_urls;
        }
        if let Some(min_urls) = self.min_urls {
            config.min_urls = min_urls;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        if !self.exclude.is_empty() {
            config.exclude_patterns = self.exclude.clone();
        }
        if self.no_follow_redirects {
            config.follow_redirects = false;
        }
    }
}

/// Prints one line per audited page to stderr
struct ProgressPrinter {
    total: usize,
}

impl ScanObserver for ProgressPrinter {
    fn on_queued(&mut self, total: usize) {
        self.total = total;
        eprintln!("Auditing {} URLs", total);
    }

    fn on_page(&mut self, index: usize, audit: &PageAudit) {
        let issues = if audit.seo_issues.is_empty() {
            "OK".to_string()
        } else {
            audit.seo_issues.join(", ")
        };
        eprintln!(
            "[{}/{}] {} {} {:.2}s {}",
            index + 1,
            self.total,
            audit.http_code,
            audit.url,
            audit.response_time,
            issues
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => serve(bind).await,
        Command::Scan(args) => scan(args).await,
    }
}

async fn serve(bind: SocketAddr) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::new().context("failed to build HTTP client")?;
    let state = AppState::new(Arc::new(fetcher), ScanConfig::from_env());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;

    tracing::info!(version = VERSION, addr = %bind, "sitemap-audit listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn scan(args: ScanArgs) -> anyhow::Result<()> {
    let mut config = ScanConfig::from_env();
    args.apply(&mut config);

    let fetcher = HttpFetcher::new().context("failed to build HTTP client")?;
    let controller = ScanController::new(Arc::new(fetcher));

    let stop = StopSignal::new();
    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received Ctrl+C, stopping after the current page");
                ctrl_c_stop.stop();
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl+C"),
        }
    });

    let mut printer = ProgressPrinter { total: 0 };
    let report = controller
        .run(
            Uuid::now_v7(),
            &args.sitemap_url,
            &config,
            &stop,
            &mut printer,
        )
        .await;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_summary(&report),
    }

    if report.state == ScanState::Failed {
        bail!(
            "scan failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_summary(report: &ScanReport) {
    let summary = &report.summary;
    println!("Sitemap:      {}", report.sitemap_url);
    println!("State:        {}", report.state);
    println!("Pages:        {}", summary.total);
    println!("Noindex:      {}", summary.noindex);
    println!("Nofollow:     {}", summary.nofollow);
    println!("Errors:       {}", summary.errors);
    println!("With issues:  {}", summary.with_issues);
    println!("Slow:         {}", summary.slow);

    for skipped in &report.skipped_sitemaps {
        println!("Skipped sitemap {}: {}", skipped.url, skipped.reason);
    }
}
