//! Tracing subscriber setup.

use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

const LOG_FILE_NAME: &str = "iris-predict.log";

/// Full logging for the server: console (text or JSON) plus an optional daily
/// rolling file. `RUST_LOG` overrides the configured level.
pub fn init_logging(cfg: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&cfg.level)));

    let file_layer = cfg.dir.as_deref().and_then(file_writer).map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false) // No color codes in file
            .with_target(true)
    });
    let file_dir = file_layer.as_ref().and(cfg.dir.as_deref());

    // Console layer, one of the two is active
    let console_json = cfg
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_target(true));
    let console_text = (!cfg.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .init();

    if let Some(dir) = file_dir {
        eprintln!("Logging to: {}/{}", dir.display(), LOG_FILE_NAME);
    }
}

/// Minimal logging for one-shot CLI commands
pub fn init_logging_simple() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

fn default_directives(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    format!("{level},iris_predict={level},tower_http={level}")
}

/// Non-blocking daily appender, or `None` when the directory is not writable.
fn file_writer(log_dir: &Path) -> Option<tracing_appender::non_blocking::NonBlocking> {
    // `tracing_appender::rolling::daily` panics (and in release, aborts) if it
    // can't create the initial log file, so preflight writability.
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!(
            "Warning: Could not create log directory {} ({}), file logging disabled",
            log_dir.display(),
            e
        );
        return None;
    }

    let test_path = log_dir.join(".iris_predict_write_test");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&test_path)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&test_path);

            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Keep the guard alive by leaking it (acceptable for long-running process)
            Box::leak(Box::new(guard));

            Some(non_blocking)
        }
        Err(e) => {
            eprintln!(
                "Warning: Could not write to log directory {} ({}), file logging disabled",
                log_dir.display(),
                e
            );
            None
        }
    }
}
