//! AAC encoder for the transcoding pipeline
//!
//! Wraps an FFmpeg `AVCodecContext` to encode PCM frames (FLTP) to AAC-LC
//! packets at the rate, layout and bitrate of a [`TranscodeProfile`].

use crate::error::{FfmpegError, Result};
use crate::ffmpeg::helpers::encoder_codec_parameters;
use crate::profile::TranscodeProfile;
use ffmpeg_next as ffmpeg;
use ffmpeg_next::codec;

use super::resampler::ENCODER_SAMPLE_FORMAT;

/// AAC frame size used when the encoder does not report one
pub const AAC_FRAME_SIZE: usize = 1024;

/// AAC encoder backed by a real FFmpeg codec context
pub struct AacEncoder {
    encoder: ffmpeg::encoder::Audio,
    frame_size: usize,
    time_base: ffmpeg::Rational,
}

impl AacEncoder {
    /// Open an AAC encoder for `profile`.
    ///
    /// `global_header` must be set when the output container stores codec
    /// extradata out of band (MP4 does).
    pub fn open(profile: &TranscodeProfile, global_header: bool) -> Result<Self> {
        let codec = codec::encoder::find(profile.codec.codec_id()).ok_or_else(|| {
            FfmpegError::EncoderNotFound("AAC encoder not found in this FFmpeg build".into())
        })?;

        let time_base = ffmpeg::Rational::new(1, profile.sample_rate as i32);

        // Build context and configure the audio encoder BEFORE opening
        let mut context = codec::Context::new_with_codec(codec);
        context.set_time_base(time_base);
        if global_header {
            context.set_flags(codec::flag::Flags::GLOBAL_HEADER);
        }

        let mut audio_enc = context.encoder().audio().map_err(|e| {
            FfmpegError::EncoderConfigure(format!("Cannot get audio encoder handle: {}", e))
        })?;

        audio_enc.set_rate(profile.sample_rate as i32);
        audio_enc.set_format(ENCODER_SAMPLE_FORMAT);
        audio_enc.set_channel_layout(profile.channel_layout());
        audio_enc.set_bit_rate(profile.bitrate() as usize);

        let encoder = audio_enc.open_as(codec).map_err(|e| {
            FfmpegError::EncoderConfigure(format!(
                "Failed to open AAC encoder ({} Hz, {} channels, {} bps): {}",
                profile.sample_rate,
                profile.channels,
                profile.bitrate(),
                e
            ))
        })?;

        let frame_size = match encoder.frame_size() as usize {
            0 => AAC_FRAME_SIZE,
            n => n,
        };

        tracing::debug!(
            sample_rate = profile.sample_rate,
            channels = profile.channels,
            bitrate = profile.bitrate(),
            frame_size,
            profile_level = format_args!("{:#04x}", profile.profile_level),
            "AAC encoder opened"
        );

        Ok(Self {
            encoder,
            frame_size,
            time_base,
        })
    }

    /// Send one PCM frame to the encoder.
    pub fn send_frame(&mut self, frame: &ffmpeg::util::frame::Audio) -> Result<()> {
        self.encoder
            .send_frame(frame)
            .map_err(|e| FfmpegError::EncodeFrame(format!("send_frame error: {}", e)).into())
    }

    /// Send EOF to flush the encoder's buffered output.
    pub fn send_eof(&mut self) -> Result<()> {
        self.encoder
            .send_eof()
            .map_err(|e| FfmpegError::EncodeFrame(format!("send_eof error: {}", e)).into())
    }

    /// Receive one encoded AAC packet, or `None` if the encoder needs more input.
    pub fn receive_packet(&mut self) -> Result<Option<ffmpeg::codec::packet::Packet>> {
        let mut packet = ffmpeg::codec::packet::Packet::empty();
        match self.encoder.receive_packet(&mut packet) {
            Ok(()) => Ok(Some(packet)),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => Ok(None),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(e) => {
                Err(FfmpegError::EncodeFrame(format!("receive_packet error: {}", e)).into())
            }
        }
    }

    /// The number of samples per channel the encoder expects per frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// The encoder timebase (1 / sample_rate).
    pub fn time_base(&self) -> ffmpeg::Rational {
        self.time_base
    }

    /// Codec parameters for the encoded stream (for muxer stream setup).
    pub fn codec_parameters(&self) -> ffmpeg::codec::Parameters {
        encoder_codec_parameters(&self.encoder)
    }
}
