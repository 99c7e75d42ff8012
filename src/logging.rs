use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use log::LevelFilter;

use crate::error::{AppError, Result};

/// Initializes the global `env_logger` logger.
///
/// `RUST_LOG` is read first and `level` is applied on top of it. When
/// `log_path` is set, records are appended to that file (created if missing)
/// instead of stderr. Calling this more than once is harmless: later calls
/// return `Ok(())` without replacing the installed logger.
pub fn init_logger(level: LevelFilter, log_path: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("reqwest", LevelFilter::Info);

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} [{}] {}",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(path) = log_path {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                AppError::ConfigError(format!("cannot open log file {}: {}", path.display(), e))
            })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // try_init: tests and embedders may already have installed a logger
    if let Err(e) = builder.try_init()
        && let Some(path) = log_path
    {
        log::warn!("not logging to {}: {}", path.display(), e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        assert!(init_logger(LevelFilter::Info, None).is_ok());
        assert!(init_logger(LevelFilter::Debug, None).is_ok());
    }

    #[test]
    fn unopenable_log_path_is_reported() {
        let result = init_logger(
            LevelFilter::Info,
            Some(Path::new("/nonexistent-dir/for/sure/analyzer.log")),
        );
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn log_path_after_logger_installed_is_not_an_error() {
        init_logger(LevelFilter::Info, None).unwrap();

        let path = std::env::temp_dir().join(format!("analyzer-{}.log", std::process::id()));
        let result = init_logger(LevelFilter::Info, Some(&path));
        let _ = std::fs::remove_file(&path);

        assert!(result.is_ok());
    }
}
