use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};
use serde::Serialize;
use tokio::task::JoinSet;
use url::{ParseError, Url};

use super::fetcher::Transport;

/// Aggregated outcome of one sweep. `broken` overlaps the other two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkCounts {
    pub internal: usize,
    pub external: usize,
    pub broken: usize,
}

impl LinkCounts {
    fn record(&mut self, link: &LinkCandidate) {
        if link.is_internal {
            self.internal += 1;
        } else {
            self.external += 1;
        }
        if !link.is_reachable {
            self.broken += 1;
        }
    }
}

/// One anchor on its way through the sweep.
#[derive(Debug, Clone)]
pub struct LinkCandidate {
    pub href: String,
    pub url: Url,
    pub is_internal: bool,
    pub is_reachable: bool,
}

/// Resolves `href` against `base`. `None` means the link is skipped: it does
/// not parse, or it is a `mailto:` link.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => base.join(href).ok()?,
        Err(_) => return None,
    };

    if resolved.scheme() == "mailto" {
        return None;
    }
    Some(resolved)
}

/// `host[:port]` of a URL, empty for URLs without a host.
pub fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Substring containment, so `blog.example.com` is internal to `example.com`.
/// This also makes `notexample.com` internal to `example.com`.
pub fn is_internal(link: &Url, base: &Url) -> bool {
    authority(link).contains(&authority(base))
}

/// Classifies every href against `base` and probes each one on its own task.
/// Returns once every probe has finished.
pub async fn classify_and_probe<T: Transport>(
    transport: Arc<T>,
    base: &Url,
    hrefs: Vec<String>,
) -> LinkCounts {
    if hrefs.is_empty() {
        return LinkCounts::default();
    }

    let counts = Arc::new(Mutex::new(LinkCounts::default()));
    let mut tasks = JoinSet::new();

    for href in hrefs {
        let transport = Arc::clone(&transport);
        let counts = Arc::clone(&counts);
        let base = base.clone();

        tasks.spawn(async move {
            let Some(url) = resolve_href(&base, &href) else {
                debug!("skipping link {:?}", href);
                return;
            };

            let is_internal = is_internal(&url, &base);
            let is_reachable = transport.probe_reachable(&url).await;
            let candidate = LinkCandidate {
                href,
                url,
                is_internal,
                is_reachable,
            };

            if !candidate.is_reachable {
                debug!("broken link {:?} ({})", candidate.href, candidate.url);
            }

            // Never held across an await.
            counts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(&candidate);
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!("link probe task failed: {}", e);
        }
    }

    *counts.lock().unwrap_or_else(PoisonError::into_inner)
}
