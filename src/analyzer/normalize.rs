use url::Url;

use crate::error::{AppError, Result};

/// Turns raw user input into an absolute http(s) URL, defaulting to `https://`
/// when no scheme is given.
pub fn normalize(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::InvalidUrl("url is empty".to_string()));
    }

    let candidate = ensure_scheme(raw);
    let parsed = Url::parse(&candidate)
        .map_err(|e| AppError::InvalidUrl(format!("{}: {}", candidate, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AppError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                other, candidate
            )));
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::InvalidUrl(format!("missing host in {}", candidate)));
    }

    Ok(parsed)
}

fn ensure_scheme(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}
