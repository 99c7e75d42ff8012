use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::extract::{Features, HtmlVersion};
use super::links::LinkCounts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub html_version: HtmlVersion,
    #[serde(rename = "head_tags")]
    pub headings: BTreeMap<String, usize>,
    pub has_login_form: bool,
    pub internal_links: usize,
    pub external_links: usize,
    pub broken_links: usize,
    /// Wall-clock seconds from normalization to the end of the link sweep.
    #[serde(rename = "query_time")]
    pub elapsed_seconds: f64,
}

pub fn assemble(
    request: &Url,
    features: Features,
    counts: LinkCounts,
    elapsed: Duration,
) -> PageSummary {
    PageSummary {
        url: request.to_string(),
        title: features.title,
        html_version: features.html_version,
        headings: features.headings,
        has_login_form: features.has_login_form,
        internal_links: counts.internal,
        external_links: counts.external,
        broken_links: counts.broken,
        elapsed_seconds: round_to(elapsed.as_secs_f64(), 2),
    }
}

/// Rounds half up at `precision` decimal places. Negative precision leaves
/// the value alone.
pub fn round_to(value: f64, precision: i32) -> f64 {
    if precision < 0 {
        return value;
    }
    let scale = 10f64.powi(precision);
    (value * scale + 0.5).floor() / scale
}
