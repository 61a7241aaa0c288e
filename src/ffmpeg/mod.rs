//! FFmpeg module - provides wrappers and utilities for FFmpeg library access
//!
//! This module handles:
//! - FFmpeg initialization
//! - Routing FFmpeg's own log output into `tracing`
//! - Raw field accessors that `ffmpeg-next` does not expose
//! - Timestamp conversion

pub mod helpers;
pub mod utils;

pub use ffmpeg_next as ffmpeg;

/// Initialize the FFmpeg library.
///
/// This should be called once at startup, before a [`MediaSource`] is opened.
///
/// [`MediaSource`]: crate::source::MediaSource
pub fn init() -> Result<(), crate::error::FfmpegError> {
    ffmpeg::init().map_err(|e| {
        crate::error::FfmpegError::InitFailed(format!("ffmpeg::init() failed: {}", e))
    })?;

    tracing::debug!("FFmpeg initialized");

    Ok(())
}

/// Install a custom FFmpeg log callback that forwards messages to `tracing`
/// and suppresses known-noisy ones.
///
/// With `verbose` set, FFmpeg's informational messages are kept as well.
///
/// **Safety & Ordering:** Must be called after `init()` and before the
/// session thread starts, because altering the global log callback is not
/// thread-safe.
pub fn install_log_filter(verbose: bool) {
    let level = if verbose {
        ffmpeg::ffi::AV_LOG_INFO
    } else {
        ffmpeg::ffi::AV_LOG_WARNING
    };

    // SAFETY: both functions modify global FFmpeg state and are safe to call
    // after `ffmpeg::init()`. They are called exactly once at startup.
    unsafe {
        ffmpeg::ffi::av_log_set_level(level as i32);
        ffmpeg::ffi::av_log_set_callback(Some(ffmpeg_log_callback));
    }
}

/// Messages that are expected while transcoding arbitrary inputs and carry no
/// actionable information.
const SUPPRESSED_MESSAGES: &[&str] = &[
    "Estimating duration from bitrate",
    "Could not update timestamps for skipped samples",
    "Could not update timestamps for discarded samples",
    "Queue input is backward in time",
];

unsafe extern "C" fn ffmpeg_log_callback(
    avcl: *mut std::ffi::c_void,
    level: std::ffi::c_int,
    fmt: *const std::ffi::c_char,
    vl: ffmpeg::ffi::va_list,
) {
    use std::ffi::CStr;

    if level > unsafe { ffmpeg::ffi::av_log_get_level() } {
        return;
    }

    let mut buf = [0 as std::ffi::c_char; 1024];
    let mut print_prefix: std::ffi::c_int = 1;
    ffmpeg::ffi::av_log_format_line(
        avcl,
        level,
        fmt,
        vl,
        buf.as_mut_ptr(),
        buf.len() as std::ffi::c_int,
        &mut print_prefix,
    );

    let msg = CStr::from_ptr(buf.as_ptr()).to_string_lossy();
    let msg = msg.trim_end();
    if msg.is_empty() {
        return;
    }

    for suppressed in SUPPRESSED_MESSAGES {
        if msg.contains(suppressed) {
            return;
        }
    }

    if level <= ffmpeg::ffi::AV_LOG_ERROR as std::ffi::c_int {
        tracing::error!(target: "m4aenc::ffmpeg", "{}", msg);
    } else if level <= ffmpeg::ffi::AV_LOG_WARNING as std::ffi::c_int {
        tracing::warn!(target: "m4aenc::ffmpeg", "{}", msg);
    } else {
        tracing::debug!(target: "m4aenc::ffmpeg", "{}", msg);
    }
}

/// Get the version information of the linked FFmpeg libraries.
pub fn version_info() -> String {
    let version = unsafe { ffmpeg::ffi::avformat_version() };
    format!(
        "libavformat {}.{}.{}",
        version >> 16,
        (version >> 8) & 0xff,
        version & 0xff
    )
}
