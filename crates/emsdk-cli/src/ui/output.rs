//! The terminal [`Reporter`].
//!
//! Everything goes to stderr so that `construct_env` can print shell code on
//! stdout. Download progress is redrawn in place on a terminal and left out
//! otherwise.

use super::theme::{Theme, format_size};
use crossterm::{
    QueueableCommand,
    cursor::MoveToColumn,
    style::Stylize,
    terminal::{Clear, ClearType},
    tty::IsTty,
};
use emsdk_core::Reporter;
use emsdk_schema::ItemName;
use std::io::{Write, stderr};
use std::sync::Mutex;

#[derive(Debug)]
pub struct Output {
    pub theme: Theme,
    quiet: bool,
    live: bool,
    /// A progress line is on screen and must be ended before other output.
    progress_open: Mutex<bool>,
}

impl Output {
    pub fn new(quiet: bool, notty: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
            live: !notty && stderr().is_tty(),
            progress_open: Mutex::new(false),
        }
    }

    fn line(&self, text: &str) {
        let mut err = stderr().lock();
        if let Ok(mut open) = self.progress_open.lock() {
            if *open {
                let _ = writeln!(err);
                *open = false;
            }
        }
        let _ = writeln!(err, "{text}");
    }

    fn note(&self, text: &str) {
        if !self.quiet {
            self.line(text);
        }
    }
}

/// One-line download status: `name  [#####     ]  45%  1.2 MB / 2.6 MB`.
pub fn progress_line(file: &str, current: u64, total: Option<u64>, bar_width: usize) -> String {
    match total.filter(|&t| t > 0) {
        Some(total) => {
            let current = current.min(total);
            let filled = usize::try_from(current.saturating_mul(bar_width as u64) / total).unwrap_or(bar_width);
            let percent = current * 100 / total;
            format!(
                "{file}  [{}{}] {percent:>3}%  {} / {}",
                "#".repeat(filled),
                " ".repeat(bar_width - filled),
                format_size(current),
                format_size(total)
            )
        }
        None => format!("{file}  {}", format_size(current)),
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        if !self.quiet {
            self.line("");
            self.line(&title.bold().to_string());
        }
    }

    fn downloading(&self, file: &str, current: u64, total: Option<u64>) {
        if self.quiet || !self.live {
            return;
        }
        let text = progress_line(file, current, total, self.theme.layout.bar_width);
        let mut err = stderr().lock();
        let _ = err.queue(MoveToColumn(0));
        let _ = err.queue(Clear(ClearType::CurrentLine));
        let _ = write!(err, "  {} {}", self.theme.icons.active.with(self.theme.colors.active), text);
        let _ = err.flush();
        if let Ok(mut open) = self.progress_open.lock() {
            *open = true;
        }
    }

    fn extracting(&self, archive: &str, dest: &str) {
        self.note(&format!("  Unpacking '{archive}' to '{dest}'"));
    }

    fn installing(&self, name: &ItemName) {
        self.note(&format!(
            "  {} Installing tool '{}'..",
            self.theme.icons.active.with(self.theme.colors.active),
            name.as_str().with(self.theme.colors.item_name)
        ));
    }

    fn skipped(&self, name: &ItemName, reason: &str) {
        self.note(&format!(
            "  {} {} {}",
            self.theme.icons.skipped.with(self.theme.colors.secondary),
            name.as_str().with(self.theme.colors.item_name),
            reason.with(self.theme.colors.secondary)
        ));
    }

    fn removing(&self, name: &ItemName) {
        self.note(&format!(
            "  {} Uninstalling tool '{}'..",
            self.theme.icons.active.with(self.theme.colors.active),
            name.as_str().with(self.theme.colors.item_name)
        ));
    }

    fn done(&self, name: &ItemName, detail: &str) {
        self.note(&format!(
            "  {} {} {detail}",
            self.theme.icons.success.with(self.theme.colors.success),
            name.as_str().with(self.theme.colors.item_name)
        ));
    }

    fn info(&self, msg: &str) {
        self.note(msg);
    }

    fn success(&self, msg: &str) {
        self.note(&format!(
            "{} {msg}",
            self.theme.icons.success.with(self.theme.colors.success)
        ));
    }

    fn warning(&self, msg: &str) {
        self.line(&format!(
            "{} {msg}",
            self.theme.icons.warning.with(self.theme.colors.warning)
        ));
    }

    fn error(&self, msg: &str) {
        self.line(&format!("{} {msg}", self.theme.icons.error.with(self.theme.colors.error)));
    }
}
