//! Shell logging bootstrap and line format policy.
//!
//! # Responsibility
//! - Initialize the single shell logfile exactly once per process.
//! - Prefix every line with its fixed marker and write it unbuffered.
//!
//! # Invariants
//! - Logging init is idempotent for the same logfile path.
//! - Re-initialization with a different logfile or level is rejected.
//! - Before initialization every logging call is a silent no-op.
//! - A logged line is visible in the file when the logging call returns.

use flexi_logger::{DeferredNow, Duplicate, FileSpec, Logger, LoggerHandle, WriteMode};
use log::{error, info, Level, Record};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

/// Default logfile name, created in the working directory.
pub const LOG_FILE_NAME: &str = "JSLOG.TXT";

/// Line marker for system messages.
pub const SYSTEM_PREFIX: &str = ">>> ";
/// Line marker for debug messages.
pub const DEBUG_PREFIX: &str = "[DEBUG] ";

const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_file: PathBuf,
    logger: LoggerHandle,
}

/// Initializes shell logging with level and logfile path.
///
/// Returns `Ok(())` when logging is active, or a human-readable error string
/// when initialization fails.
///
/// # Invariants
/// - Calling this function repeatedly with the same `log_file` is idempotent.
/// - Calling this function repeatedly with a different `level` is rejected.
/// - Re-initialization with a different `log_file` is rejected.
/// - Initialization never panics.
///
/// # Errors
/// - Returns an error when `level` is unsupported.
/// - Returns an error when `log_file` is empty or its directory cannot be
///   created.
/// - Returns an error when logger backend setup fails.
pub fn init_logging(level: &str, log_file: &str) -> Result<(), String> {
    let normalized_level = normalize_level(level)?;
    let normalized_file = normalize_log_file(log_file)?;

    if let Some(state) = LOGGING_STATE.get() {
        return check_existing(state, normalized_level, &normalized_file);
    }

    let init_level = normalized_level;
    let init_file = normalized_file.clone();

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        if let Some(parent) = init_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "failed to create log directory `{}`: {err}",
                    parent.display()
                )
            })?;
        }

        let logger = Logger::try_with_str(init_level)
            .map_err(|err| format!("invalid log level `{init_level}`: {err}"))?
            .log_to_file(file_spec(&init_file)?)
            // WriteMode::Direct keeps the immediate-flush contract: the line
            // is on disk when the logging call returns.
            .write_mode(WriteMode::Direct)
            .append()
            .format(marker_format)
            .duplicate_to_stdout(debug_echo())
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        install_panic_hook_once();

        info!(
            "event=log_open module=logging status=ok level={} file={} platform={}",
            init_level,
            init_file.display(),
            std::env::consts::OS
        );

        Ok(LoggingState {
            level: init_level,
            log_file: init_file,
            logger,
        })
    })?;

    check_existing(state, normalized_level, &normalized_file)
}

/// Flushes any pending log output to the logfile.
///
/// A no-op when logging was never initialized.
pub fn flush_log() {
    if let Some(state) = LOGGING_STATE.get() {
        state.logger.flush();
    }
}

/// Returns active logging status metadata.
///
/// Returns `None` when logging has not been initialized.
/// Returns `(level, log_file)` when logging is active.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_file.clone()))
}

/// Returns the default log level for the current build mode.
///
/// - `debug` builds -> `debug` (debug lines compiled in)
/// - `release` builds -> `info` (debug lines filtered out)
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Selects the line marker for one record level.
pub fn marker_for_level(level: Level) -> &'static str {
    if level >= Level::Debug {
        DEBUG_PREFIX
    } else {
        SYSTEM_PREFIX
    }
}

fn marker_format(
    w: &mut dyn std::io::Write,
    _now: &mut DeferredNow,
    record: &Record<'_>,
) -> Result<(), std::io::Error> {
    write!(w, "{}{}", marker_for_level(record.level()), record.args())
}

fn debug_echo() -> Duplicate {
    if cfg!(debug_assertions) {
        Duplicate::All
    } else {
        Duplicate::None
    }
}

fn check_existing(
    state: &LoggingState,
    level: &'static str,
    log_file: &Path,
) -> Result<(), String> {
    if state.log_file != log_file {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            state.log_file.display(),
            log_file.display()
        ));
    }
    if state.level != level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, level
        ));
    }
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_file(log_file: &str) -> Result<PathBuf, String> {
    let trimmed = log_file.trim();
    if trimmed.is_empty() {
        return Err("log_file cannot be empty".to_string());
    }
    Ok(PathBuf::from(trimmed))
}

fn file_spec(log_file: &Path) -> Result<FileSpec, String> {
    let stem = log_file
        .file_stem()
        .and_then(|value| value.to_str())
        .ok_or_else(|| format!("log_file has no usable name: `{}`", log_file.display()))?;

    let mut spec = FileSpec::default().basename(stem).suppress_timestamp();
    match log_file.extension().and_then(|value| value.to_str()) {
        Some(extension) => spec = spec.suffix(extension),
        None => spec = spec.o_suffix(None::<String>),
    }
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        spec = spec.directory(parent);
    }
    Ok(spec)
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!(
            "event=panic_captured module=logging status=error location={} payload={}",
            location, payload
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
