//! Audio resampler for the transcoding pipeline
//!
//! Converts decoded PCM frames to the profile's sample rate and channel
//! layout in planar float (`FLTP`), the format the AAC encoder expects.

use crate::error::{FfmpegError, Result};
use crate::ffmpeg::helpers::resampler_out_samples;
use ffmpeg_next as ffmpeg;
use ffmpeg_next::software::resampling;
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::Sample;

/// Sample format required by the AAC encoder
pub const ENCODER_SAMPLE_FORMAT: Sample = Sample::F32(ffmpeg::util::format::sample::Type::Planar);

/// Audio resampler wrapping FFmpeg's `SwrContext`
pub struct AudioResampler {
    context: resampling::Context,
    output_rate: u32,
    output_layout: ChannelLayout,
}

impl AudioResampler {
    /// Create a resampler that converts the format described by `src_frame` to
    /// `target_rate` / `target_layout` / FLTP.
    pub fn new(
        src_frame: &ffmpeg::util::frame::Audio,
        target_rate: u32,
        target_layout: ChannelLayout,
    ) -> Result<Self> {
        let context = resampling::Context::get(
            src_frame.format(),
            source_layout(src_frame),
            src_frame.rate(),
            ENCODER_SAMPLE_FORMAT,
            target_layout,
            target_rate,
        )
        .map_err(|e| {
            FfmpegError::ResamplerCreate(format!(
                "{:?} {} Hz, {} channels -> {} Hz: {}",
                src_frame.format(),
                src_frame.rate(),
                src_frame.channels(),
                target_rate,
                e
            ))
        })?;

        Ok(Self {
            context,
            output_rate: target_rate,
            output_layout: target_layout,
        })
    }

    /// Convert one input PCM frame.
    ///
    /// Returns `None` when the resampler buffered the input without producing
    /// output yet.
    pub fn convert(
        &mut self,
        frame: &ffmpeg::util::frame::Audio,
    ) -> Result<Option<ffmpeg::util::frame::Audio>> {
        // Size the output for everything the SwrContext can emit, including
        // samples buffered from earlier calls. `run` only allocates an empty
        // frame for `input.samples()`, which starves upsampling.
        let capacity = resampler_out_samples(&mut self.context, frame.samples())
            .max(frame.samples())
            .max(1);
        let mut out = self.output_frame(capacity);

        self.context
            .run(frame, &mut out)
            .map_err(|e| FfmpegError::Resample(format!("Resampling error: {}", e)))?;

        Ok(non_empty(out))
    }

    /// Drain the samples the resampler still holds (its filter delay) at end
    /// of stream. Call until it returns `None`.
    pub fn flush(&mut self) -> Result<Option<ffmpeg::util::frame::Audio>> {
        let pending = resampler_out_samples(&mut self.context, 0);
        if pending == 0 {
            return Ok(None);
        }

        // The output frame must carry the target format and layout, otherwise
        // swr reports the output configuration as changed.
        let mut out = self.output_frame(pending);
        self.context
            .flush(&mut out)
            .map_err(|e| FfmpegError::Resample(format!("Resampler flush error: {}", e)))?;

        Ok(non_empty(out))
    }

    fn output_frame(&self, capacity: usize) -> ffmpeg::util::frame::Audio {
        let mut frame =
            ffmpeg::util::frame::Audio::new(ENCODER_SAMPLE_FORMAT, capacity, self.output_layout);
        frame.set_rate(self.output_rate);
        frame
    }
}

fn non_empty(frame: ffmpeg::util::frame::Audio) -> Option<ffmpeg::util::frame::Audio> {
    (frame.samples() > 0).then_some(frame)
}

/// The frame's channel layout, or a default one derived from its channel
/// count when the decoder did not set one.
fn source_layout(frame: &ffmpeg::util::frame::Audio) -> ChannelLayout {
    if frame.channel_layout().bits() != 0 {
        return frame.channel_layout();
    }
    ChannelLayout::default(i32::from(frame.channels()))
}
