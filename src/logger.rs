use std::fs::{create_dir_all, read_to_string, write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tklog::{Format, LEVEL, LOG};

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static FILE_LOGGING_ENABLED: AtomicBool = AtomicBool::new(false);
static FILE_HANDLER_INITIALIZED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_ENV: &str = "MEMOS_ADMIN_LOG_FILE";
const LOGGING_STATE_FILE: &str = "logging_enabled";

/// `MEMOS_ADMIN_LOG_FILE`, else `logs/admin.log` in the app data dir.
pub fn log_file_path() -> PathBuf {
    LOG_PATH
        .get_or_init(|| {
            std::env::var_os(LOG_FILE_ENV)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| crate::config::app_data_dir().join("logs").join("admin.log"))
        })
        .clone()
}

fn logging_state_path() -> PathBuf {
    crate::config::app_data_dir().join(LOGGING_STATE_FILE)
}

fn parse_logging_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn read_logging_flag(path: &Path) -> bool {
    read_to_string(path)
        .map(|raw| parse_logging_flag(&raw))
        .unwrap_or(false)
}

fn write_logging_flag(path: &Path, enabled: bool) {
    let result = match path.parent() {
        Some(parent) => create_dir_all(parent),
        None => Ok(()),
    }
    .and_then(|()| write(path, if enabled { "1" } else { "0" }));
    if let Err(err) = result {
        eprintln!("[log] cannot remember logging state at {}: {}", path.display(), err);
    }
}

pub fn file_logging_enabled() -> bool {
    FILE_LOGGING_ENABLED.load(Ordering::Relaxed)
}

/// Switches the rotating file handler on. Returns false when the log
/// directory cannot be created.
pub fn enable_file_logging() -> bool {
    if file_logging_enabled() {
        return true;
    }

    let path = log_file_path();
    if let Some(parent) = path.parent()
        && let Err(err) = create_dir_all(parent)
    {
        eprintln!("[log] cannot create {}: {}", parent.display(), err);
        return false;
    }

    if !FILE_HANDLER_INITIALIZED.swap(true, Ordering::Relaxed) {
        // 10 MiB per file, five rotated files kept.
        LOG.set_cutmode_by_size(&path.to_string_lossy(), 10 * 1024 * 1024, 5, true);
    }

    FILE_LOGGING_ENABLED.store(true, Ordering::Relaxed);
    write_logging_flag(&logging_state_path(), true);
    true
}

pub fn disable_file_logging() {
    FILE_LOGGING_ENABLED.store(false, Ordering::Relaxed);
    write_logging_flag(&logging_state_path(), false);
}

pub fn initialize() {
    LOG.set_level(LEVEL::Debug)
        .set_console(true)
        .set_format(Format::LevelFlag | Format::Date | Format::Time | Format::ShortFileName)
        .set_formatter("{level}{time} {file}:{message}\n");

    if read_logging_flag(&logging_state_path()) {
        enable_file_logging();
    }
}

/// Diagnostic trace, written only while file logging is switched on.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        if $crate::logger::file_logging_enabled() {
            tklog::debug!(format!($($arg)*));
        }
    }};
}

/// Failures the user did not get a notification for. Always written.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {{
        tklog::error!(format!($($arg)*));
    }};
}
