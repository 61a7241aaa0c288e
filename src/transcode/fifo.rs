//! Sample FIFO between the resampler and the AAC encoder
//!
//! The AAC encoder demands exactly `frame_size` samples per frame (except the
//! last), while decoders and the resampler produce whatever size they like
//! (1152 for MP3, 4096 for FLAC, …). The FIFO buffers planar float samples and
//! hands them back out in encoder-sized frames with continuous timestamps.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::util::channel_layout::ChannelLayout;

use crate::error::{FfmpegError, Result};
use crate::ffmpeg::helpers::{fltp_channel, fltp_channel_mut};

use super::resampler::ENCODER_SAMPLE_FORMAT;

/// Planar float sample buffer
pub struct SampleFifo {
    planes: Vec<Vec<f32>>,
    rate: u32,
    layout: ChannelLayout,
    next_pts: i64,
}

impl SampleFifo {
    pub fn new(channels: u16, rate: u32, layout: ChannelLayout) -> Self {
        Self {
            planes: vec![Vec::new(); channels.max(1) as usize],
            rate,
            layout,
            next_pts: 0,
        }
    }

    /// Number of buffered samples per channel.
    pub fn len(&self) -> usize {
        self.planes[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamp, in samples, of the next frame handed out.
    pub fn next_pts(&self) -> i64 {
        self.next_pts
    }

    /// Append an FLTP frame.
    pub fn push(&mut self, frame: &ffmpeg::util::frame::Audio) -> Result<()> {
        if frame.format() != ENCODER_SAMPLE_FORMAT {
            return Err(FfmpegError::Resample(format!(
                "sample FIFO expects FLTP input, got {:?}",
                frame.format()
            ))
            .into());
        }

        for (ch, plane) in self.planes.iter_mut().enumerate() {
            let samples = fltp_channel(frame, ch).ok_or_else(|| {
                FfmpegError::Resample(format!(
                    "frame has {} channels, FIFO expects {}",
                    frame.channels(),
                    self.layout.channels()
                ))
            })?;
            plane.extend_from_slice(samples);
        }
        Ok(())
    }

    /// Take one frame of exactly `frame_size` samples, if that many are
    /// buffered.
    pub fn pop_frame(&mut self, frame_size: usize) -> Result<Option<ffmpeg::util::frame::Audio>> {
        if frame_size == 0 || self.len() < frame_size {
            return Ok(None);
        }
        self.take(frame_size).map(Some)
    }

    /// Take the remaining samples at end of stream, at most `frame_size` at a
    /// time.
    pub fn drain_frame(&mut self, frame_size: usize) -> Result<Option<ffmpeg::util::frame::Audio>> {
        if self.is_empty() {
            return Ok(None);
        }
        let n = if frame_size == 0 {
            self.len()
        } else {
            frame_size.min(self.len())
        };
        self.take(n).map(Some)
    }

    fn take(&mut self, n: usize) -> Result<ffmpeg::util::frame::Audio> {
        let mut out = ffmpeg::util::frame::Audio::new(ENCODER_SAMPLE_FORMAT, n, self.layout);
        out.set_rate(self.rate);
        out.set_pts(Some(self.next_pts));

        for (ch, plane) in self.planes.iter_mut().enumerate() {
            let samples = fltp_channel_mut(&mut out, ch).ok_or_else(|| {
                FfmpegError::Resample(format!("cannot fill FLTP plane {} of {} samples", ch, n))
            })?;
            samples.copy_from_slice(&plane[..n]);
            plane.drain(..n);
        }

        self.next_pts += n as i64;
        Ok(out)
    }
}
