//! Command-line arguments

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::EncoderConfig;
use crate::console::ColorMode;
use crate::error::Result;
use crate::profile::CONTAINER_EXTENSION;

/// Transcode an audio file to AAC in an MPEG-4 (.m4a) container.
#[derive(Parser, Debug, Clone)]
#[command(name = "m4aenc")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input media file.
    pub input: PathBuf,

    /// Output file. Defaults to the input path with a .m4a extension.
    pub output: Option<PathBuf>,

    /// Quality level: 1 = 96kbps, 2 = 128kbps, 3 = 160kbps, 4 = 192kbps.
    /// Values outside that range are clamped.
    #[arg(allow_negative_numbers = true)]
    pub quality: Option<i32>,

    /// Overwrite the output file if it exists.
    #[arg(short, long)]
    pub force: bool,

    /// Debug logging and detailed error messages.
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// When to use colors.
    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,
}

impl Args {
    /// Load the configuration file named on the command line, or the defaults.
    pub fn load_config(&self) -> Result<EncoderConfig> {
        match &self.config {
            Some(path) => EncoderConfig::from_file(path),
            None => Ok(EncoderConfig::default()),
        }
    }

    /// Output path: the one given, or derived from the input.
    pub fn output_path(&self) -> PathBuf {
        output_path(&self.input, self.output.as_deref())
    }

    /// Quality level: the one given, or the configured one.
    pub fn quality(&self, config: &EncoderConfig) -> i32 {
        self.quality.unwrap_or(config.quality)
    }

    pub fn color(&self, config: &EncoderConfig) -> ColorMode {
        self.color.unwrap_or(config.color)
    }
}

/// Derive the output path. Without an explicit output the input's extension
/// is replaced with `.m4a`, or appended when there is none.
pub fn output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(output) if !output.as_os_str().is_empty() => output.to_path_buf(),
        _ => input.with_extension(CONTAINER_EXTENSION),
    }
}

/// Whether `a` and `b` name the same existing file, following symlinks and
/// relative components.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
