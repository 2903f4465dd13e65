//! Session logger — writes editor log output to a single file in the OS data directory.
//!
//! The file is **truncated at each `init()`**, so it only ever contains output
//! from the most recent editing session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\SnapEdit\snapedit.log`
//!   Linux:    `~/.local/share/SnapEdit/snapedit.log`
//!   macOS:    `~/Library/Application Support/SnapEdit/snapedit.log`
//!
//! Use the `log_info!` / `log_warn!` / `log_err!` macros anywhere in the crate.
//! Until `init()` (or `init_at()`) has been called every log call is a no-op,
//! so embedding applications that don't want a log file pay nothing.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Returns the path to the current session log file.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Write a line to the session log.  Silently ignores I/O errors so that
/// logging never interrupts editing.
pub fn write_line(line: &str) {
    if let Some(mutex) = LOG_FILE.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

/// Severity tag written in front of every log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn tag(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Format one log line.  `scope` names the editing session (or other
/// source) the line belongs to; an empty scope is left out.
pub fn format_line(level: Level, scope: &str, msg: &str) -> String {
    if scope.is_empty() {
        format!("[{}] [{}] {}", timestamp(), level.tag(), msg)
    } else {
        format!("[{}] [{}] [{}] {}", timestamp(), level.tag(), scope, msg)
    }
}

/// Write a timestamped, level-tagged line to the session log.
pub fn write(level: Level, scope: &str, msg: &str) {
    if LOG_FILE.get().is_none() {
        return;
    }
    write_line(&format_line(level, scope, msg));
}

/// Log macros.  An optional leading `scope = expr;` tags the line with the
/// session it came from:
///
/// ```ignore
/// log_info!(scope = session.tag(); "crop applied: {}x{}", w, h);
/// log_warn!("present skipped");
/// ```
#[macro_export]
macro_rules! log_info {
    (scope = $scope:expr; $($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Info, &$scope, &format!($($arg)*))
    };
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Info, "", &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    (scope = $scope:expr; $($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Warn, &$scope, &format!($($arg)*))
    };
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Warn, "", &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    (scope = $scope:expr; $($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Error, &$scope, &format!($($arg)*))
    };
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Error, "", &format!($($arg)*))
    };
}

/// Initialise the session logger at the platform default location.
pub fn init() {
    init_at(&log_file_path());
}

/// Initialise the session logger at `path`.  Only the first successful call
/// in a process takes effect.
///
/// * Creates (or truncates) the log file.
/// * Installs a panic hook that writes the panic message to the log before
///   propagating to the default handler.
pub fn init_at(path: &Path) {
    if LOG_FILE.get().is_some() {
        return;
    }

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path);

    match file {
        Ok(f) => {
            let _ = LOG_PATH.set(path.to_path_buf());
            let _ = LOG_FILE.set(Mutex::new(f));
        }
        Err(e) => {
            // Log file unavailable: keep editing without one
            eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
            return;
        }
    }

    write_line(&format!(
        "=== SnapEdit session started (unix {}) ===",
        unix_seconds()
    ));
    write_line(&format!("Log file: {}", path.display()));
    write_line("");

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write_line(&format!("[{}] [PANIC] {}", timestamp(), info));
        prev(info);
    }));
}

fn log_file_path() -> PathBuf {
    data_dir().join("SnapEdit").join("snapedit.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// HH:MM:SS within the current (UTC) day.
fn timestamp() -> String {
    let secs = unix_seconds();
    let h = (secs % 86400) / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}
