//! The page-analysis engine.
//!
//! One call to [`Analyzer::analyze_page`] normalizes the input, fetches the
//! page, extracts its features, probes every link concurrently and assembles a
//! [`PageSummary`]. Whole-page failures abort the analysis; unreachable links
//! only show up in the broken-link count.

pub mod extract;
pub mod fetcher;
pub mod links;
pub mod normalize;
pub mod summary;

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};

use crate::config::Config;
use crate::error::Result;

pub use extract::{Features, HtmlVersion, detect_html_version, extract};
pub use fetcher::{FetchedDocument, HttpFetcher, Transport};
pub use links::{LinkCounts, classify_and_probe};
pub use normalize::normalize;
pub use summary::{PageSummary, assemble};

pub struct Analyzer<T: Transport = HttpFetcher> {
    transport: Arc<T>,
}

impl Analyzer<HttpFetcher> {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Analyzer::new(HttpFetcher::new(config)?))
    }
}

impl<T: Transport> Analyzer<T> {
    pub fn new(transport: T) -> Self {
        Analyzer {
            transport: Arc::new(transport),
        }
    }

    pub async fn analyze_page(&self, raw_url: &str) -> Result<PageSummary> {
        let started_at = Instant::now();

        let request = normalize(raw_url)?;
        debug!("analyzing {}", request);

        let document = self.transport.fetch_page(&request).await?;
        debug!(
            "fetched {} ({} bytes, status {})",
            document.url,
            document.body.len(),
            document.status
        );

        let mut features = extract(&document);
        let anchors = std::mem::take(&mut features.anchors);
        debug!("{}: {} anchors, version {}", request, anchors.len(), features.html_version);

        let counts = classify_and_probe(Arc::clone(&self.transport), &document.url, anchors).await;

        let summary = assemble(&request, features, counts, started_at.elapsed());
        info!(
            "analyzed {} in {:.2}s: {} internal, {} external, {} broken",
            summary.url,
            summary.elapsed_seconds,
            summary.internal_links,
            summary.external_links,
            summary.broken_links
        );
        Ok(summary)
    }
}
