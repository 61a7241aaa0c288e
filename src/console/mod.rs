//! Terminal output: progress bar, cursor visibility and error reports

mod progress;
mod report;

pub use progress::{hide_cursor, render_progress, show_progress, CursorGuard};
pub use report::{write_error, write_error_to};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use termcolor::ColorChoice;

/// When to use colors on the terminal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when the stream is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}
