//! Encode one file: print its details, run the session and draw progress

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use crate::cli::{is_same_file, Args};
use crate::config::EncoderConfig;
use crate::console::{hide_cursor, show_progress, write_error, ColorMode};
use crate::duration::DurationPrinter;
use crate::error::{EncodeError, Result};
use crate::profile::aac_quality_bitrate;
use crate::session::TranscodeSession;
use crate::source::MediaSource;

/// Terminal and timing options for [`encode_file`].
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub color: ColorMode,
    pub poll_interval: Duration,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        let config = EncoderConfig::default();
        Self {
            color: config.color,
            poll_interval: config.poll_interval(),
        }
    }
}

/// Ends the progress line when dropped, whether or not encoding succeeded.
struct ProgressLine;

impl Drop for ProgressLine {
    fn drop(&mut self) {
        let mut stdout = std::io::stdout();
        let _ = writeln!(stdout);
        let _ = stdout.flush();
    }
}

/// Transcode `input` into `output` at the given quality level.
pub fn encode_file(input: &Path, output: &Path, quality: i32, options: &EncodeOptions) -> Result<()> {
    let source = MediaSource::open(input)?;
    let attributes = source.attributes();
    println!("Input: {}", input.display());
    println!("Output: {}", output.display());
    println!(
        "Duration: {}; bit depth: {}; sample rate: {}; channels: {}; bitrate: {}kbps",
        DurationPrinter::new(attributes.duration),
        attributes.bits_per_sample,
        attributes.samples_per_second,
        attributes.channels,
        aac_quality_bitrate(quality) / 1000
    );

    let mut session = TranscodeSession::new(source, output, quality)?;
    session.start()?;

    let _cursor = hide_cursor();
    let _line = ProgressLine;
    show_progress(0.0, options.color)?;

    let mut prev_progress = 0.0;
    while !session.wait(options.poll_interval)? {
        let progress = session.progress();
        if progress > prev_progress {
            show_progress(progress, options.color)?;
            prev_progress = progress;
        }
    }

    show_progress(1.0, options.color)?;
    tracing::debug!(output = %output.display(), "encode finished");
    Ok(())
}

/// Run the command line: returns the process exit code.
pub fn run(args: &Args, config: &EncoderConfig) -> ExitCode {
    let color = args.color(config);
    match try_run(args, config, color) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = if args.verbose { e.detailed() } else { e.to_string() };
            write_error(&message, color);
            ExitCode::FAILURE
        }
    }
}

pub(crate) fn try_run(args: &Args, config: &EncoderConfig, color: ColorMode) -> Result<()> {
    crate::ffmpeg::init()?;
    crate::ffmpeg::install_log_filter(args.verbose);

    let output = args.output_path();
    if is_same_file(&args.input, &output) {
        return Err(EncodeError::OutputIsInput(output));
    }
    if !args.force && output.exists() {
        return Err(EncodeError::OutputExists(output));
    }

    let options = EncodeOptions {
        color,
        poll_interval: config.poll_interval(),
    };
    encode_file(&args.input, &output, args.quality(config), &options)
}
