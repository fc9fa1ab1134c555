//! Structured logging for the terrain streamer.
//!
//! Installs a `tracing` subscriber with an uptime-stamped console layer and,
//! in debug builds, a JSON file layer. The filter comes from `RUST_LOG` when
//! set, otherwise from the config's `debug.log_level`.

use std::path::{Path, PathBuf};

use nebula_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default directives: `info` everywhere, per-patch build chatter muted.
pub const DEFAULT_FILTER: &str = "info,nebula_mesh=warn";

/// File the JSON layer writes to inside the log directory.
pub const LOG_FILE_NAME: &str = "nebula-terrain.log";

/// Filter directives for `config`, falling back to [`DEFAULT_FILTER`].
pub fn filter_directives(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.trim().to_string()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Path of the JSON log file under `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables the file layer
/// * `config` - supplies `debug.log_level` when `RUST_LOG` is unset
///
/// ```no_run
/// use nebula_config::Config;
/// use nebula_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let directives = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_file_path(log_dir))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// An `EnvFilter` built from [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let filter_str = default_env_filter().to_string();
        assert!(filter_str.contains("info"));
        assert!(filter_str.contains("nebula_mesh=warn"));
    }

    #[test]
    fn test_directives_without_config() {
        assert_eq!(filter_directives(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_directives_from_config() {
        let mut config = Config::default();
        config.debug.log_level = " debug,nebula_streaming=trace ".to_string();
        assert_eq!(
            filter_directives(Some(&config)),
            "debug,nebula_streaming=trace"
        );
    }

    #[test]
    fn test_blank_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level = "   ".to_string();
        assert_eq!(filter_directives(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_subsystem_filters_parse() {
        for directives in [
            "info",
            "debug,nebula_streaming=trace",
            "warn,nebula_lod=debug,nebula_mesh=trace",
            DEFAULT_FILTER,
        ] {
            assert!(
                EnvFilter::try_new(directives).is_ok(),
                "failed to parse filter: {directives}"
            );
        }
    }

    #[test]
    fn test_log_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_file_path(dir.path());
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(path.file_name().unwrap(), LOG_FILE_NAME);
    }
}
