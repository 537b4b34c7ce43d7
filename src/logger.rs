//! Terminal output: prefixed log lines and the rebuild status block.
//!
//! Everything goes to stderr; stdout is reserved for command output
//! (`livepack build` without `-o` writes the bundle there).
//!
//! ```ignore
//! log!("serve"; "preview at http://{}", addr);
//! debug!("ws"; "client connected");
//! status_error("bundle #4 failed", &diagnostics);
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stderr},
    sync::atomic::{AtomicBool, Ordering},
    time::SystemTime,
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Prefix color group of a log module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tint {
    Server,
    Watch,
    Failure,
    Pipeline,
    Other,
}

impl Tint {
    fn of(module: &str) -> Self {
        match module.to_ascii_lowercase().as_str() {
            "serve" | "ws" | "preview" => Self::Server,
            "watch" | "editor" => Self::Watch,
            "error" | "runtime" => Self::Failure,
            "bundle" | "inject" | "engine" => Self::Pipeline,
            _ => Self::Other,
        }
    }

    fn paint(self, prefix: &str) -> String {
        match self {
            Self::Server => prefix.bright_blue().bold().to_string(),
            Self::Watch => prefix.bright_green().bold().to_string(),
            Self::Failure => prefix.bright_red().bold().to_string(),
            Self::Pipeline => prefix.bright_magenta().bold().to_string(),
            Self::Other => prefix.bright_yellow().bold().to_string(),
        }
    }
}

/// Write one `[module] message` line.
pub fn log(module: &str, message: &str) {
    let prefix = Tint::of(module).paint(&format!("[{module}]"));
    let mut err = stderr().lock();
    execute!(err, Clear(ClearType::UntilNewLine)).ok();
    writeln!(err, "{prefix} {message}").ok();
    err.flush().ok();
}

// ============================================================================
// Rebuild status
// ============================================================================

/// `HH:MM:SS` (UTC) for a Unix timestamp.
fn clock(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

fn now() -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    clock(secs)
}

/// Block of lines describing the latest build; each report replaces the
/// previous block.
struct StatusBlock {
    /// Terminal rows printed by the previous report
    rows: usize,
}

static STATUS: Mutex<StatusBlock> = Mutex::new(StatusBlock { rows: 0 });

impl StatusBlock {
    fn show(&mut self, mark: String, text: &str) {
        let mut err = stderr().lock();
        if self.rows > 0 {
            #[allow(clippy::cast_possible_truncation)]
            execute!(err, cursor::MoveUp(self.rows as u16)).ok();
            execute!(err, Clear(ClearType::FromCursorDown)).ok();
        }

        let stamp = format!("[{}]", now()).dimmed().to_string();
        writeln!(err, "{stamp} {mark} {text}").ok();
        err.flush().ok();
        self.rows = rows(text);
    }
}

fn rows(text: &str) -> usize {
    text.lines().count().max(1)
}

/// Report a successful build.
pub fn status_success(message: &str) {
    STATUS.lock().show("✓".green().to_string(), message);
}

/// Report a failed build; `detail` goes on the following lines.
pub fn status_error(summary: &str, detail: &str) {
    let text = if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    };
    STATUS.lock().show("✗".red().to_string(), &text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_format() {
        assert_eq!(clock(0), "00:00:00");
        assert_eq!(clock(3600 + 61), "01:01:01");
        // wraps at midnight
        assert_eq!(clock(86_400 + 59), "00:00:59");
    }

    #[test]
    fn test_tint_groups() {
        assert_eq!(Tint::of("WS"), Tint::Server);
        assert_eq!(Tint::of("runtime"), Tint::Failure);
        assert_eq!(Tint::of("inject"), Tint::Pipeline);
        assert_eq!(Tint::of("config"), Tint::Other);
    }

    #[test]
    fn test_rows_counts_detail_lines() {
        assert_eq!(rows("bundle #2 ok"), 1);
        assert_eq!(rows("bundle #2 failed\na.ts:1:7: ERROR: x\nb.ts:2:1: ERROR: y"), 3);
        assert_eq!(rows(""), 1);
    }
}
