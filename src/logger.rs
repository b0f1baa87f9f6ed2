//! `tracing_subscriber` init, CLI-verbosity-vs-`RUST_LOG` precedence.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        other => Err(AppError::Internal(format!("unknown log level: {other}"))),
    }
}

/// Initialize the global subscriber. `prefer_level` is set when the level
/// came from an explicit CLI flag rather than `LOG_LEVEL`/defaults, in
/// which case it wins over `RUST_LOG`.
pub fn init(level: &str, prefer_level: bool) -> Result<(), AppError> {
    let default_level = parse_level(level)?;

    let filter = if prefer_level {
        EnvFilter::new(default_level.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()))
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_levels_parse() {
        for lvl in ["trace", "debug", "info", "warn", "error", "INFO"] {
            assert!(parse_level(lvl).is_ok(), "{lvl} should parse");
        }
    }

    #[test]
    fn invalid_level_errors() {
        assert!(parse_level("verbose").is_err());
    }

    #[test]
    fn init_succeeds_or_already_init() {
        assert!(init("info", true).is_ok());
        assert!(init("info", false).is_ok());
    }
}
