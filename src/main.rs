//! m4aenc command-line entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use m4aenc::cli::Args;
use m4aenc::console::write_error;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.load_config();

    let log_level = match (&config, args.verbose) {
        (_, true) => "debug",
        (Ok(config), false) => config.log_level.as_str(),
        (Err(_), false) => "warn",
    };
    init_logging(log_level);

    tracing::debug!("m4aenc v{} ({})", VERSION, m4aenc::ffmpeg::version_info());

    match config {
        Ok(config) => m4aenc::encode::run(&args, &config),
        Err(e) => {
            write_error(&e.to_string(), args.color.unwrap_or_default());
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with tracing. Logs go to stderr so they do not mix
/// with the progress line.
fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn default_filter(level: &str) -> String {
    format!("m4aenc={}", level)
}
