//! Media source: the demuxed input file and its audio attributes

use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;

use crate::duration::WindowsTimeUnits;
use crate::error::{EncodeError, FfmpegError, Result};
use crate::ffmpeg::helpers::{
    codec_params_bits_per_sample, codec_params_channels, codec_params_sample_rate,
};
use crate::ffmpeg::utils::{rescale_ts, MICROSECONDS};
use crate::transcode::decoder::AudioDecoder;

/// Read-only attributes of the source audio stream, fetched once on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaAttributes {
    pub duration: WindowsTimeUnits,
    pub bits_per_sample: u32,
    pub samples_per_second: u32,
    pub channels: u16,
}

/// An opened input file with a selected audio stream.
pub struct MediaSource {
    path: PathBuf,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    attributes: MediaAttributes,
}

impl MediaSource {
    /// Open `path` and select its best audio stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let input = ffmpeg::format::input(&path).map_err(|e| {
            FfmpegError::OpenInput(format!("{}: {}", path.display(), e))
        })?;

        let (stream_index, attributes) = {
            let stream = input
                .streams()
                .best(ffmpeg::media::Type::Audio)
                .ok_or_else(|| EncodeError::NoAudioStream(path.clone()))?;
            let params = stream.parameters();

            let mut bits_per_sample = codec_params_bits_per_sample(&params);
            if bits_per_sample == 0 {
                bits_per_sample = decoded_sample_bits(params, stream.index())?;
            }

            let duration = if input.duration() > 0 {
                WindowsTimeUnits::from_micros(input.duration())
            } else if stream.duration() > 0 {
                WindowsTimeUnits::from_micros(rescale_ts(
                    stream.duration(),
                    stream.time_base(),
                    MICROSECONDS,
                ))
            } else {
                WindowsTimeUnits::ZERO
            };

            let attributes = MediaAttributes {
                duration,
                bits_per_sample,
                samples_per_second: codec_params_sample_rate(&stream.parameters()),
                channels: codec_params_channels(&stream.parameters()),
            };
            (stream.index(), attributes)
        };

        tracing::debug!(
            path = %path.display(),
            stream_index,
            ?attributes,
            "opened media source"
        );

        Ok(Self {
            path,
            input,
            stream_index,
            attributes,
        })
    }

    pub fn attributes(&self) -> MediaAttributes {
        self.attributes
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the selected audio stream in the input.
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /// Give up the native input context, for the session topology.
    pub(crate) fn into_input(self) -> (ffmpeg::format::context::Input, usize) {
        (self.input, self.stream_index)
    }
}

/// Bit depth of the decoder's output sample format, for codecs that do not
/// report a source bit depth (lossy formats).
fn decoded_sample_bits(params: ffmpeg::codec::Parameters, stream_index: usize) -> Result<u32> {
    Ok(AudioDecoder::from_parameters(params, stream_index)?.decoded_bits_per_sample())
}
