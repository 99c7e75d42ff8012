use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;

use crate::error::{AppError, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    /// Timeout for the GET that retrieves the analyzed page.
    pub fetch_timeout: Duration,
    /// Timeout for each HEAD reachability probe.
    pub probe_timeout: Duration,
    pub max_redirects: usize,
    /// Overall deadline the HTTP handler gives one analysis.
    pub request_timeout: Duration,
    /// Cached summaries younger than this are served as-is. Zero disables the cache.
    pub cache_ttl: Duration,
    pub log_level: LevelFilter,
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            fetch_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(3),
            max_redirects: 10,
            request_timeout: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            log_level: LevelFilter::Info,
            log_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    /// for every key the lookup does not know.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;
        let port = parse_or(&lookup, "PORT", defaults.server_addr.port())?;

        let log_level = match lookup("LOG_LEVEL") {
            Some(level) => LevelFilter::from_str(&level)
                .map_err(|e| AppError::ConfigError(format!("Invalid LOG_LEVEL: {}", e)))?,
            None => defaults.log_level,
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            fetch_timeout: secs_or(&lookup, "FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?,
            probe_timeout: secs_or(&lookup, "PROBE_TIMEOUT_SECS", defaults.probe_timeout)?,
            max_redirects: parse_or(&lookup, "MAX_REDIRECTS", defaults.max_redirects)?,
            request_timeout: secs_or(&lookup, "REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            cache_ttl: secs_or(&lookup, "CACHE_TTL_SECS", defaults.cache_ttl)?,
            log_level,
            log_path: lookup("LOG_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

fn secs_or<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default.as_secs()).map(Duration::from_secs)
}
