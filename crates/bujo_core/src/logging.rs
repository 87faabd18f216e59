//! Process logging bootstrap and safety policy.
//!
//! # Responsibility
//! - Initialize rolling file logs, or stderr output when no log directory is
//!   configured, exactly once per process.
//! - Emit stable, metadata-only diagnostic events.
//!
//! # Invariants
//! - Logging init is idempotent for the same level and target.
//! - Logging initialization must not panic.
//! - Re-initialization with a different target or level is rejected.
//! - Bullet content never appears in log lines; events carry ids and counts.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "bujo";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_SUMMARY_CHARS: usize = 120;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Verbosity accepted by the config file and `BUJO_LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Case-insensitive; `warning` is accepted for `warn`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// `debug` in debug builds, `info` in release builds.
    pub fn build_default() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Rolling files under this absolute directory.
    Directory(PathBuf),
    Stderr,
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(dir) => write!(f, "{}", dir.display()),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Logging bootstrap failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnknownLevel(String),
    /// Log directory is relative or cannot be created.
    LogDir { path: PathBuf, reason: String },
    /// The backend refused to start.
    Backend(String),
    /// Logging is already running with another level or target.
    Reconfigure {
        active: (LogLevel, LogTarget),
        requested: (LogLevel, LogTarget),
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::LogDir { path, reason } => {
                write!(f, "log directory `{}` {reason}", path.display())
            }
            Self::Backend(message) => write!(f, "failed to start logger: {message}"),
            Self::Reconfigure { active, requested } => write!(
                f,
                "logging already runs at {} to {}; refusing {} to {}",
                active.0, active.1, requested.0, requested.1
            ),
        }
    }
}

impl Error for LoggingError {}

struct LoggingState {
    level: LogLevel,
    target: LogTarget,
    _logger: LoggerHandle,
}

/// Starts rolling file logging under `log_dir`.
///
/// # Errors
/// - `level` is not a known level.
/// - `log_dir` is relative or cannot be created.
/// - Logging already runs with another level or target.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<(), LoggingError> {
    if !log_dir.is_absolute() {
        return Err(LoggingError::LogDir {
            path: log_dir.to_path_buf(),
            reason: "must be absolute".to_string(),
        });
    }
    init_with_target(level, LogTarget::Directory(log_dir.to_path_buf()))
}

/// Starts logging to stderr, for runs without a log directory.
pub fn init_stderr_logging(level: &str) -> Result<(), LoggingError> {
    init_with_target(level, LogTarget::Stderr)
}

fn init_with_target(level: &str, target: LogTarget) -> Result<(), LoggingError> {
    let level =
        LogLevel::parse(level).ok_or_else(|| LoggingError::UnknownLevel(level.to_string()))?;
    let state = LOGGING_STATE.get_or_try_init(|| start_backend(level, target.clone()))?;

    if state.level == level && state.target == target {
        return Ok(());
    }
    Err(LoggingError::Reconfigure {
        active: (state.level, state.target.clone()),
        requested: (level, target),
    })
}

fn start_backend(level: LogLevel, target: LogTarget) -> Result<LoggingState, LoggingError> {
    let logger = Logger::try_with_str(level.as_str())
        .map_err(|err| LoggingError::Backend(err.to_string()))?;
    let logger = match &target {
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| LoggingError::LogDir {
                path: dir.clone(),
                reason: format!("cannot be created: {err}"),
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        }
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format)
            .start(),
    }
    .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook();
    info!(
        "event=logging_init module=core status=ok level={level} target={target} version={}",
        env!("CARGO_PKG_VERSION")
    );

    Ok(LoggingState {
        level,
        target,
        _logger: logger,
    })
}

/// Returns `(level, target)` when logging is active.
pub fn logging_status() -> Option<(LogLevel, LogTarget)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.target.clone()))
}

fn install_panic_hook() {
    PANIC_HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let location = info.location().map_or_else(
                || "unknown".to_string(),
                |loc| format!("{}:{}", loc.file(), loc.line()),
            );
            error!(
                "event=panic module=core status=error location={location} payload={}",
                panic_summary(info.payload())
            );
            previous(info);
        }));
    });
}

/// First line of a string payload, capped. Panic messages may quote bullet
/// text, so nothing past the first line reaches the log.
fn panic_summary(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>");
    let first_line = text.lines().next().unwrap_or_default();

    let mut summary: String = first_line.chars().take(MAX_PANIC_SUMMARY_CHARS).collect();
    if summary.len() < text.len() {
        summary.push_str("...");
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::{
        init_logging, init_stderr_logging, logging_status, panic_summary, LogLevel, LogTarget,
        LoggingError, MAX_PANIC_SUMMARY_CHARS,
    };
    use std::any::Any;
    use std::path::Path;

    #[test]
    fn level_parsing_is_case_insensitive_with_warning_alias() {
        assert_eq!(LogLevel::parse(" INFO "), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("verbose"), None);
        assert!(LogLevel::Trace > LogLevel::Error);
    }

    #[test]
    fn panic_summary_keeps_only_the_capped_first_line() {
        let payload: Box<dyn Any + Send> = Box::new("bad position\nbullet text here");
        assert_eq!(panic_summary(payload.as_ref()), "bad position...");

        let long: Box<dyn Any + Send> = Box::new("x".repeat(500));
        let summary = panic_summary(long.as_ref());
        assert_eq!(summary.len(), MAX_PANIC_SUMMARY_CHARS + 3);

        let opaque: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_summary(opaque.as_ref()), "<non-string payload>");
    }

    #[test]
    fn relative_log_dir_is_rejected_before_start() {
        let err = init_logging("info", Path::new("logs/dev")).unwrap_err();
        assert!(matches!(err, LoggingError::LogDir { .. }));
    }

    #[test]
    fn init_is_idempotent_and_rejects_reconfiguration() {
        let log_dir = tempfile::tempdir().unwrap().into_path();
        let other_dir = tempfile::tempdir().unwrap().into_path();

        init_logging("info", &log_dir).unwrap();
        init_logging("INFO", &log_dir).unwrap();

        assert!(matches!(
            init_logging("debug", &log_dir),
            Err(LoggingError::Reconfigure { .. })
        ));
        assert!(matches!(
            init_logging("info", &other_dir),
            Err(LoggingError::Reconfigure { .. })
        ));
        assert!(matches!(
            init_stderr_logging("info"),
            Err(LoggingError::Reconfigure { .. })
        ));
        assert!(matches!(
            init_stderr_logging("loud"),
            Err(LoggingError::UnknownLevel(_))
        ));

        assert_eq!(
            logging_status(),
            Some((LogLevel::Info, LogTarget::Directory(log_dir)))
        );
    }
}
