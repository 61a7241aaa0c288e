//! FFmpeg utility functions

use ffmpeg_next as ffmpeg;

/// `AV_TIME_BASE_Q`: the microsecond timebase FFmpeg uses for container-level durations.
pub const MICROSECONDS: ffmpeg::Rational = ffmpeg::Rational(1, 1_000_000);

/// Convert timestamps from one timebase to another
pub fn rescale_ts(ts: i64, from: ffmpeg::Rational, to: ffmpeg::Rational) -> i64 {
    unsafe { ffmpeg::ffi::av_rescale_q(ts, from.into(), to.into()) }
}
