//! End-to-end transcode tests

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use ffmpeg_next as ffmpeg;

use crate::cli::Args;
use crate::config::EncoderConfig;
use crate::console::ColorMode;
use crate::encode::{encode_file, try_run, EncodeOptions};
use crate::error::EncodeError;
use crate::source::MediaSource;
use crate::tests::fixtures::write_sine_wav;

/// Codec, sample rate and channel count of the first audio stream in `path`.
fn inspect_output(path: &Path) -> (ffmpeg::codec::Id, u32, u16) {
    let input = ffmpeg::format::input(&path).unwrap();
    let stream = input.streams().best(ffmpeg::media::Type::Audio).unwrap();
    let params = stream.parameters();
    let id = params.id();
    (
        id,
        crate::ffmpeg::helpers::codec_params_sample_rate(&params),
        crate::ffmpeg::helpers::codec_params_channels(&params),
    )
}

fn quiet_options() -> EncodeOptions {
    EncodeOptions {
        color: ColorMode::Never,
        poll_interval: Duration::from_millis(10),
    }
}

#[test]
fn test_encode_stereo_wav() {
    crate::ffmpeg::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    let output = dir.path().join("tone.m4a");
    write_sine_wav(&input, 44_100, 2, 2.0).unwrap();

    encode_file(&input, &output, 2, &quiet_options()).unwrap();

    let (id, rate, channels) = inspect_output(&output);
    assert_eq!(id, ffmpeg::codec::Id::AAC);
    assert_eq!(rate, 44_100);
    assert_eq!(channels, 2);

    let attributes = MediaSource::open(&output).unwrap().attributes();
    assert!((attributes.duration.as_secs_f64() - 2.0).abs() < 0.2);
}

#[test]
fn test_encode_downmixes_and_resamples() {
    crate::ffmpeg::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("surround.wav");
    let output = dir.path().join("surround.m4a");
    write_sine_wav(&input, 96_000, 6, 1.0).unwrap();

    encode_file(&input, &output, 4, &quiet_options()).unwrap();

    let (id, rate, channels) = inspect_output(&output);
    assert_eq!(id, ffmpeg::codec::Id::AAC);
    assert_eq!(rate, 48_000);
    assert_eq!(channels, 2);
}

#[test]
fn test_encode_mono() {
    crate::ffmpeg::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("mono.wav");
    let output = dir.path().join("mono.m4a");
    write_sine_wav(&input, 22_050, 1, 1.0).unwrap();

    encode_file(&input, &output, 1, &quiet_options()).unwrap();

    let (_, rate, channels) = inspect_output(&output);
    assert_eq!(rate, 22_050);
    assert_eq!(channels, 1);
}

#[test]
fn test_encode_missing_input() {
    crate::ffmpeg::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let err = encode_file(
        &dir.path().join("missing.wav"),
        &dir.path().join("missing.m4a"),
        2,
        &quiet_options(),
    )
    .unwrap_err();
    assert!(matches!(err, EncodeError::Ffmpeg(_)));
    assert!(!dir.path().join("missing.m4a").exists());
}

#[test]
fn test_run_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    let output = dir.path().join("tone.m4a");
    write_sine_wav(&input, 44_100, 2, 0.5).unwrap();
    std::fs::write(&output, b"keep me").unwrap();

    let args = Args::try_parse_from([
        OsStr::new("m4aenc"),
        input.as_os_str(),
        OsStr::new("--color"),
        OsStr::new("never"),
    ])
    .unwrap();
    let err = try_run(&args, &EncoderConfig::default(), ColorMode::Never).unwrap_err();
    assert!(matches!(err, EncodeError::OutputExists(ref path) if *path == output));
    assert_eq!(std::fs::read(&output).unwrap(), b"keep me");
}

#[test]
fn test_run_never_overwrites_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    write_sine_wav(&input, 44_100, 2, 0.5).unwrap();
    let original = std::fs::read(&input).unwrap();

    // Same file through a different spelling of the path.
    let alias = dir.path().join(".").join("tone.wav");
    let args = Args::try_parse_from([
        OsStr::new("m4aenc"),
        input.as_os_str(),
        alias.as_os_str(),
        OsStr::new("--force"),
    ])
    .unwrap();

    let err = try_run(&args, &EncoderConfig::default(), ColorMode::Never).unwrap_err();
    assert!(matches!(err, EncodeError::OutputIsInput(_)));
    assert_eq!(std::fs::read(&input).unwrap(), original);
}

#[test]
fn test_run_force_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    let output = dir.path().join("tone.m4a");
    write_sine_wav(&input, 44_100, 2, 0.5).unwrap();
    std::fs::write(&output, b"replace me").unwrap();

    let args = Args::try_parse_from([
        OsStr::new("m4aenc"),
        input.as_os_str(),
        OsStr::new("--force"),
        OsStr::new("--color"),
        OsStr::new("never"),
    ])
    .unwrap();
    try_run(&args, &EncoderConfig::default(), ColorMode::Never).unwrap();

    let (id, _, _) = inspect_output(&output);
    assert_eq!(id, ffmpeg::codec::Id::AAC);
}
