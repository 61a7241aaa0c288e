use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the encoder
#[derive(Error, Debug)]
pub enum EncodeError {
    /// An error originating from the underlying FFmpeg library
    #[error("{0}")]
    Ffmpeg(#[from] FfmpegError),

    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The output file exists and overwriting was not requested
    #[error("The output file already exists. Use --force to overwrite.")]
    OutputExists(PathBuf),

    /// The output path names the input file itself
    #[error("The output file is the same as the input file: {0}")]
    OutputIsInput(PathBuf),

    /// The input file does not contain a decodable audio stream
    #[error("No audio stream found in {0}")]
    NoAudioStream(PathBuf),

    /// The configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transcode session stopped before finishing
    #[error("Session error: {0}")]
    Session(String),
}

/// FFmpeg-specific errors
#[derive(Error, Debug)]
pub enum FfmpegError {
    #[error("FFmpeg initialization failed: {0}")]
    InitFailed(String),

    #[error("Failed to open input file: {0}")]
    OpenInput(String),

    #[error("Failed to find decoder: {0}")]
    DecoderNotFound(String),

    #[error("Failed to find encoder: {0}")]
    EncoderNotFound(String),

    #[error("Failed to configure encoder: {0}")]
    EncoderConfigure(String),

    #[error("Failed to create resampler: {0}")]
    ResamplerCreate(String),

    /// The output file could not be created. Carries the underlying cause.
    #[error("Cannot create {path}: {source}")]
    CannotCreateSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create muxer: {0}")]
    MuxerCreate(String),

    #[error("Failed to write header: {0}")]
    WriteHeader(String),

    #[error("Failed to write packet: {0}")]
    WritePacket(String),

    #[error("Failed to write trailer: {0}")]
    WriteTrailer(String),

    #[error("Failed to decode packet: {0}")]
    DecodePacket(String),

    #[error("Failed to encode frame: {0}")]
    EncodeFrame(String),

    #[error("Failed to resample frame: {0}")]
    Resample(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, EncodeError>;

impl EncodeError {
    /// Format the error together with every error in its `source()` chain.
    pub fn detailed(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_exists_message() {
        let err = EncodeError::OutputExists(PathBuf::from("song.m4a"));
        assert_eq!(
            err.to_string(),
            "The output file already exists. Use --force to overwrite."
        );
    }

    #[test]
    fn test_output_is_input_message() {
        let err = EncodeError::OutputIsInput(PathBuf::from("song.m4a"));
        assert_eq!(
            err.to_string(),
            "The output file is the same as the input file: song.m4a"
        );
    }

    #[test]
    fn test_ffmpeg_error_is_transparent() {
        let err: EncodeError = FfmpegError::OpenInput("missing.wav".into()).into();
        assert_eq!(err.to_string(), "Failed to open input file: missing.wav");
    }

    #[test]
    fn test_detailed_includes_sink_cause() {
        let err: EncodeError = FfmpegError::CannotCreateSink {
            path: PathBuf::from("/nope/out.m4a"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .into();
        let detailed = err.detailed();
        assert!(detailed.starts_with("Cannot create /nope/out.m4a"));
        assert!(detailed.contains("permission denied"));
    }
}
