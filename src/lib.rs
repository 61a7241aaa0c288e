//! m4aenc
//!
//! Transcodes an audio file to AAC in an MPEG-4 (`.m4a`) container. FFmpeg
//! does the demuxing, decoding, resampling, encoding and muxing; this crate
//! builds the transcode profile and topology, runs it as a session on a
//! background thread and reports progress.

pub mod cli;
pub mod config;
pub mod console;
pub mod duration;
pub mod encode;
pub mod error;
pub mod ffmpeg;
pub mod profile;
pub mod session;
pub mod source;
pub mod transcode;

#[cfg(test)]
mod tests;

pub use error::{EncodeError, FfmpegError, Result};
