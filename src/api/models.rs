use serde::Deserialize;

/// Query string of `GET /api/analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    pub url: Option<String>,
}
