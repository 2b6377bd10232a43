//! Terminal logging with colored prefixes and a build progress line.
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "compiling {} templates", count);
//!
//! let progress = Progress::new("posts", posts.len());
//! for post in &posts {
//!     progress.inc();
//! }
//! progress.finish();
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    cell::Cell,
    io::{IsTerminal, Write, stdout},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

/// Log a message with a colored module prefix.
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

pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();

    // multiline messages (error chains) are printed whole
    let message = if message.contains('\n') {
        message
    } else {
        let max_msg_len = (get_terminal_width() as usize).saturating_sub(calc_prefix_len(module.len()));
        truncate_str(message, max_msg_len)
    };

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "error" => prefix.bright_red().bold(),
        "compile" => prefix.bright_blue().bold(),
        "init" => prefix.bright_green().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    // last UTF-8 boundary within max_len
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Single progress line, redrawn in place with `\r`.
///
/// Only drawn when stdout is a terminal.
pub struct Progress {
    prefix: ColoredString,
    prefix_len: usize,
    total: usize,
    current: Cell<usize>,
    enabled: bool,
}

impl Progress {
    pub fn new(module: &str, total: usize) -> Self {
        Self {
            prefix: colorize_prefix(module, &module.to_ascii_lowercase()),
            prefix_len: calc_prefix_len(module.len()),
            total,
            current: Cell::new(0),
            enabled: total > 1 && stdout().is_terminal(),
        }
    }

    pub fn inc(&self) {
        let current = self.current.get() + 1;
        self.current.set(current);
        if self.enabled {
            self.display(current);
        }
    }

    fn display(&self, current: usize) {
        let count = format!("{current}/{}", self.total);
        let available = (get_terminal_width() as usize)
            .saturating_sub(self.prefix_len + count.len() + 4);
        let line = render_bar(current, self.total, available.clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH));

        let mut stdout = stdout().lock();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "\r{} [{line}] {count}", self.prefix).ok();
        stdout.flush().ok();
    }

    /// Clear the progress line.
    pub fn finish(&self) {
        if self.enabled {
            let mut stdout = stdout().lock();
            execute!(stdout, Clear(ClearType::CurrentLine)).ok();
            write!(stdout, "\r").ok();
            stdout.flush().ok();
        }
    }
}

fn render_bar(current: usize, total: usize, width: usize) -> String {
    let filled = if total > 0 {
        (current.min(total) * width) / total
    } else {
        0
    };
    "█".repeat(filled) + &"░".repeat(width - filled)
}
