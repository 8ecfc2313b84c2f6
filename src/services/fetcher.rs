// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::fetch::{FetchOptions, FetchResult};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use std::time::Instant;

const MAX_REDIRECTS: usize = 10;

/// Performs a single GET request. Implementations never retry.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> FetchResult;
}

/// `reqwest`-backed fetcher with transparent gzip/deflate decoding
#[derive(Clone)]
pub struct HttpFetcher {
    following: Client,
    direct: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let following = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .deflate(true)
            .build()?;
        let direct = Client::builder()
            .redirect(Policy::none())
            .gzip(true)
            .deflate(true)
            .build()?;

        Ok(Self { following, direct })
    }

    fn client(&self, follow_redirects: bool) -> &Client {
        if follow_redirects {
            &self.following
        } else {
            &self.direct
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> FetchResult {
        if let Err(e) = url::Url::parse(url) {
            return FetchResult::failure(format!("Invalid URL: {}", e), 0);
        }

        let started = Instant::now();
        let response = self
            .client(options.follow_redirects)
            .get(url)
            .header(reqwest::header::USER_AGENT, &options.user_agent)
            .timeout(options.timeout)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url, error = %e, "request failed");
                let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
                return FetchResult::failure(format!("Failed to fetch: {}", e), status);
            }
        };

        let status_code = response.status().as_u16();
        let headers = options.want_headers.then(|| collect_headers(&response));

        match response.bytes().await {
            Ok(body) => FetchResult {
                success: true,
                body: body.to_vec(),
                headers,
                status_code,
                elapsed_secs: started.elapsed().as_secs_f64(),
                error: None,
            },
            Err(e) => {
                tracing::debug!(url, error = %e, "failed to read response body");
                FetchResult::failure(format!("Failed to read body: {}", e), status_code)
            }
        }
    }
}

fn collect_headers(response: &Response) -> Vec<(String, String)> {
    response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
