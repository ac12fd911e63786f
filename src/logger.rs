//! Logging utilities with colored output.
//!
//! Messages go to stderr so a stylesheet written to stdout stays clean.
//!
//! # Example
//!
//! ```ignore
//! log!("rewrite"; "processing {}", path.display());
//! debug!("svg"; "loading {}", path.display());
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Stream};
use std::{
    io::{IsTerminal, Write, stderr},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

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
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());

    let mut stderr = stderr().lock();
    if stderr.is_terminal() {
        execute!(stderr, Clear(ClearType::UntilNewLine)).ok();
    }
    writeln!(stderr, "{prefix} {message}").ok();
    stderr.flush().ok();
}

/// Apply color to a module prefix based on module type
///
/// Honors `--color` through the owo-colors override.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "rewrite" => prefix
            .if_supports_color(Stream::Stderr, |p| p.bright_blue().bold().to_string())
            .to_string(),
        "svg" => prefix
            .if_supports_color(Stream::Stderr, |p| p.bright_green().bold().to_string())
            .to_string(),
        "error" => prefix
            .if_supports_color(Stream::Stderr, |p| p.bright_red().bold().to_string())
            .to_string(),
        _ => prefix
            .if_supports_color(Stream::Stderr, |p| p.bright_yellow().bold().to_string())
            .to_string(),
    }
}
