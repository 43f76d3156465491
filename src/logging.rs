use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Logger that writes to a rotating file and echoes important lines to stderr
struct MonitorLogger {
    file_writer: Arc<Mutex<RollingFileAppender>>,
    file_level: LevelFilter,
    stderr_level: LevelFilter,
}

impl Log for MonitorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.file_level || metadata.level() <= self.stderr_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = record.level();
        let line = format_line(
            &chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            level,
            &record.args().to_string(),
        );

        if level <= self.file_level
            && let Ok(mut writer) = self.file_writer.lock()
        {
            let _ = writeln!(writer, "{}", line);
        }

        if level <= self.stderr_level {
            let _ = writeln!(io::stderr().lock(), "{}", line);
        }
    }

    fn flush(&self) {
        // RollingFileAppender writes through on every line
    }
}

fn format_line(timestamp: &str, level: log::Level, message: &str) -> String {
    format!("{} [{}] {}", timestamp, level, message)
}

/// Parse a level name; None for anything unrecognised
pub fn parse_level(level_str: &str) -> Option<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Initialize the file logger as the global logger
///
/// Fails if another logger is already installed.
pub fn init_logger(log_file_path: &Path, file_level: &str, stderr_level: &str) -> Result<()> {
    let parent = log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).context("Failed to create log directory")?;

    // tracing-appender has no size-based rotation, daily is close enough
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(3)
        .filename_prefix(
            log_file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("clipmon"),
        )
        .filename_suffix(
            log_file_path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("log"),
        )
        .build(parent)
        .context("Failed to create rotating file appender")?;

    let file_level = parse_level(file_level).unwrap_or(LevelFilter::Info);
    let stderr_level = parse_level(stderr_level).unwrap_or(LevelFilter::Warn);

    let logger = MonitorLogger {
        file_writer: Arc::new(Mutex::new(file_appender)),
        file_level,
        stderr_level,
    };

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(file_level.max(stderr_level));

    Ok(())
}

/// Install `env_logger` driven by RUST_LOG unless a logger is already set
pub fn init_default() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some(LevelFilter::Debug));
        assert_eq!(parse_level("warn"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("Off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_line_format() {
        assert_eq!(
            format_line("2026-01-02 03:04:05", Level::Info, "Clipboard changed"),
            "2026-01-02 03:04:05 [INFO] Clipboard changed"
        );
    }
}
