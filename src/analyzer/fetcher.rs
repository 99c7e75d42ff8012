use std::future::Future;
use std::time::Duration;

use log::debug;
use reqwest::{Client, ClientBuilder, redirect::Policy};
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Number of leading body bytes inspected for the DOCTYPE declaration.
pub const SNIFF_WINDOW: usize = 8 * 1024;

const USER_AGENT: &str = concat!("web-page-analyzer/", env!("CARGO_PKG_VERSION"));

/// A retrieved page, owned by the analysis that fetched it.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL after redirects.
    pub url: Url,
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchedDocument {
    /// Leading part of the body used for version sniffing. The body itself is
    /// untouched, so the parser still sees every byte.
    pub fn inspection_window(&self) -> &[u8] {
        &self.body[..self.body.len().min(SNIFF_WINDOW)]
    }
}

/// Outbound HTTP used by the analyzer: one full page retrieval and any number
/// of reachability probes.
pub trait Transport: Send + Sync + 'static {
    /// GETs the page. Transport failures are `FetchError`, a status of 400 or
    /// above is `BadStatus`.
    fn fetch_page(&self, url: &Url) -> impl Future<Output = Result<FetchedDocument>> + Send;

    /// HEADs the link. Any transport error or a status of 400 or above means
    /// unreachable. Never fails.
    fn probe_reachable(&self, url: &Url) -> impl Future<Output = bool> + Send;
}

/// reqwest-backed transport sharing one pooled client across all calls.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    fetch_timeout: Duration,
    probe_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = ClientBuilder::new()
            .redirect(Policy::limited(config.max_redirects))
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpFetcher {
            client,
            fetch_timeout: config.fetch_timeout,
            probe_timeout: config.probe_timeout,
        })
    }
}

impl Transport for HttpFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<FetchedDocument> {
        let mut response = self
            .client
            .get(url.clone())
            .timeout(self.fetch_timeout)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(AppError::BadStatus {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        if final_url != *url {
            debug!("{} redirected to {}", url, final_url);
        }

        let mut body = Vec::with_capacity(SNIFF_WINDOW);
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) if e.is_timeout() => {
                    return Err(AppError::FetchError(format!("timed out reading body: {}", e)));
                }
                Err(e) => {
                    return Err(AppError::ParseError(format!("failed to read body: {}", e)));
                }
            }
        }

        Ok(FetchedDocument {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }

    async fn probe_reachable(&self, url: &Url) -> bool {
        match self
            .client
            .head(url.clone())
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                let reachable = !(status.is_client_error() || status.is_server_error());
                if !reachable {
                    debug!("probe {} answered {}", url, status.as_u16());
                }
                reachable
            }
            Err(e) => {
                debug!("probe {} failed: {}", url, e);
                false
            }
        }
    }
}
