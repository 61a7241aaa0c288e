//! Transcode topology
//!
//! Connects the source stream to the output file:
//! `AudioDecoder` → `AudioResampler` → `SampleFifo` → `AacEncoder` → MP4 muxer.
//!
//! The topology is built on the caller's thread so configuration errors are
//! reported immediately, then moved onto the session thread by
//! [`Topology::run`], which reports its lifecycle as [`SessionEvent`]s.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use ffmpeg_next as ffmpeg;
use tokio::sync::mpsc::UnboundedSender;

use crate::cli::is_same_file;
use crate::duration::WindowsTimeUnits;
use crate::error::{EncodeError, FfmpegError, Result};
use crate::ffmpeg::helpers::{muxer_needs_global_header, stream_reset_codec_tag};
use crate::ffmpeg::utils::{rescale_ts, MICROSECONDS};
use crate::profile::TranscodeProfile;
use crate::session::events::SessionEvent;
use crate::session::wait::WaitHandle;
use crate::source::MediaSource;

use super::decoder::AudioDecoder;
use super::encoder::AacEncoder;
use super::fifo::SampleFifo;
use super::resampler::AudioResampler;

/// Position value meaning the clock has no time source yet
const NO_TIME: i64 = i64::MIN;

/// Shared handle between a running topology and its session.
///
/// Carries the presentation clock and the close/abort requests.
#[derive(Clone)]
pub struct PipelineControl {
    inner: Arc<ControlInner>,
}

struct ControlInner {
    position_us: AtomicI64,
    abort: AtomicBool,
    close: WaitHandle,
}

impl PipelineControl {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ControlInner {
                position_us: AtomicI64::new(NO_TIME),
                abort: AtomicBool::new(false),
                close: WaitHandle::new(),
            }),
        }
    }

    /// Current presentation time, or `None` before the first packet.
    pub fn position(&self) -> Option<WindowsTimeUnits> {
        match self.inner.position_us.load(Ordering::Acquire) {
            NO_TIME => None,
            us => Some(WindowsTimeUnits::from_micros(us)),
        }
    }

    pub fn set_position_micros(&self, micros: i64) {
        self.inner
            .position_us
            .store(micros.max(0), Ordering::Release);
    }

    /// Ask an ended topology to finalize the output.
    pub fn request_close(&self) {
        self.inner.close.set();
    }

    /// Ask the topology to stop as soon as possible without finalizing.
    pub fn request_abort(&self) {
        self.inner.abort.store(true, Ordering::Release);
        self.inner.close.set();
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.abort.load(Ordering::Acquire)
    }

    /// Block until close or abort is requested. Returns `true` for close.
    fn wait_for_close(&self) -> bool {
        self.inner.close.wait_forever();
        !self.is_aborted()
    }
}

impl Default for PipelineControl {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully configured decode → encode → mux chain.
pub struct Topology {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: AudioDecoder,
    encoder: AacEncoder,
    output: ffmpeg::format::context::Output,
    profile: TranscodeProfile,
}

impl Topology {
    /// Build the topology: open the decoder for the source stream, the AAC
    /// encoder for `profile`, and create the output file.
    ///
    /// The output file is created last, so a configuration error leaves any
    /// existing file untouched. It is never the source file itself.
    pub fn build(source: MediaSource, output: &Path, profile: &TranscodeProfile) -> Result<Self> {
        if is_same_file(source.path(), output) {
            return Err(EncodeError::OutputIsInput(output.to_path_buf()));
        }
        let (input, stream_index) = source.into_input();

        let decoder = {
            let stream = input.stream(stream_index).ok_or_else(|| {
                FfmpegError::DecoderNotFound(format!("audio stream {} not found", stream_index))
            })?;
            AudioDecoder::open(&stream)?
        };

        let muxer = profile.container.muxer_name();
        let global_header = muxer_needs_global_header(muxer)
            .ok_or_else(|| FfmpegError::MuxerCreate(format!("muxer {} not available", muxer)))?;
        let encoder = AacEncoder::open(profile, global_header)?;

        let mut octx =
            ffmpeg::format::output_as(output, muxer).map_err(|e| sink_error(output, e))?;
        {
            let mut out_stream = octx
                .add_stream(ffmpeg::encoder::find(ffmpeg::codec::Id::None))
                .map_err(|e| FfmpegError::MuxerCreate(format!("Failed to add audio stream: {}", e)))?;
            out_stream.set_parameters(encoder.codec_parameters());
            stream_reset_codec_tag(&mut out_stream);
            out_stream.set_time_base(encoder.time_base());
        }

        tracing::debug!(
            output = %output.display(),
            muxer,
            global_header,
            "topology built"
        );

        Ok(Self {
            input,
            stream_index,
            decoder,
            encoder,
            output: octx,
            profile: profile.clone(),
        })
    }

    /// Run the topology to completion, reporting through `events`:
    /// `Started`, then `Ended` once all input is encoded, then (after the
    /// session requests close) `Closed` once the output is finalized. The
    /// first failure is reported with the event that was due and ends the run.
    pub fn run(self, control: &PipelineControl, events: &UnboundedSender<SessionEvent>) {
        let Topology {
            mut input,
            stream_index,
            decoder,
            encoder,
            output,
            profile,
        } = self;

        let mut chain = match Chain::new(decoder, encoder, output, &profile) {
            Ok(chain) => chain,
            Err(e) => {
                let _ = events.send(SessionEvent::started(Err(e)));
                return;
            }
        };
        if events.send(SessionEvent::started(Ok(()))).is_err() {
            return;
        }

        if let Err(e) = chain.process(&mut input, stream_index, control) {
            let _ = events.send(SessionEvent::ended(Err(e)));
            return;
        }
        if events.send(SessionEvent::ended(Ok(()))).is_err() {
            return;
        }

        if !control.wait_for_close() {
            let _ = events.send(SessionEvent::closed(Err(EncodeError::Session(
                "transcode aborted".into(),
            ))));
            return;
        }

        let _ = events.send(SessionEvent::closed(chain.finalize()));
    }
}

/// The stages after the demuxer, with the per-run state.
struct Chain {
    decoder: AudioDecoder,
    resampler: Option<AudioResampler>,
    fifo: SampleFifo,
    encoder: AacEncoder,
    output: ffmpeg::format::context::Output,
    out_time_base: ffmpeg::Rational,
    profile: TranscodeProfile,
}

impl Chain {
    /// Write the container header and capture the timebase the muxer chose.
    fn new(
        decoder: AudioDecoder,
        encoder: AacEncoder,
        mut output: ffmpeg::format::context::Output,
        profile: &TranscodeProfile,
    ) -> Result<Self> {
        output
            .write_header()
            .map_err(|e| FfmpegError::WriteHeader(e.to_string()))?;

        let out_time_base = output
            .stream(0)
            .map(|s| s.time_base())
            .ok_or_else(|| FfmpegError::MuxerCreate("output stream missing".into()))?;

        Ok(Self {
            decoder,
            resampler: None,
            fifo: SampleFifo::new(profile.channels, profile.sample_rate, profile.channel_layout()),
            encoder,
            output,
            out_time_base,
            profile: profile.clone(),
        })
    }

    /// Feed every packet of the source stream through the chain, then flush
    /// all stages.
    fn process(
        &mut self,
        input: &mut ffmpeg::format::context::Input,
        stream_index: usize,
        control: &PipelineControl,
    ) -> Result<()> {
        for (stream, packet) in input.packets() {
            if control.is_aborted() {
                return Err(EncodeError::Session("transcode aborted".into()));
            }
            if stream.index() != stream_index {
                continue;
            }

            if let Some(pts) = packet.pts().or(packet.dts()) {
                control.set_position_micros(rescale_ts(pts, stream.time_base(), MICROSECONDS));
            }

            self.decoder.feed(Some(&packet))?;
            self.drain_decoder()?;
        }

        self.decoder.feed(None)?;
        self.drain_decoder()?;

        if let Some(resampler) = self.resampler.as_mut() {
            while let Some(frame) = resampler.flush()? {
                self.fifo.push(&frame)?;
            }
        }
        self.encode_ready()?;

        let frame_size = self.encoder.frame_size();
        while let Some(frame) = self.fifo.drain_frame(frame_size)? {
            self.encoder.send_frame(&frame)?;
            self.write_packets()?;
        }

        self.encoder.send_eof()?;
        self.write_packets()?;

        tracing::debug!(
            samples = self.fifo.next_pts(),
            skipped_packets = self.decoder.skipped_packets(),
            "all input encoded"
        );
        Ok(())
    }

    fn drain_decoder(&mut self) -> Result<()> {
        while let Some(frame) = self.decoder.next_frame()? {
            if self.resampler.is_none() {
                tracing::debug!(
                    sample_rate = frame.rate(),
                    channels = frame.channels(),
                    format = ?frame.format(),
                    "creating resampler from first frame"
                );
                self.resampler = Some(AudioResampler::new(
                    &frame,
                    self.profile.sample_rate,
                    self.profile.channel_layout(),
                )?);
            }

            if let Some(resampler) = self.resampler.as_mut() {
                if let Some(resampled) = resampler.convert(&frame)? {
                    self.fifo.push(&resampled)?;
                }
            }
            self.encode_ready()?;
        }
        Ok(())
    }

    /// Encode every full frame the FIFO holds.
    fn encode_ready(&mut self) -> Result<()> {
        let frame_size = self.encoder.frame_size();
        while let Some(frame) = self.fifo.pop_frame(frame_size)? {
            self.encoder.send_frame(&frame)?;
            self.write_packets()?;
        }
        Ok(())
    }

    fn write_packets(&mut self) -> Result<()> {
        while let Some(mut packet) = self.encoder.receive_packet()? {
            packet.set_stream(0);
            packet.rescale_ts(self.encoder.time_base(), self.out_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| FfmpegError::WritePacket(e.to_string()))?;
        }
        Ok(())
    }

    fn finalize(mut self) -> Result<()> {
        self.output
            .write_trailer()
            .map_err(|e| FfmpegError::WriteTrailer(e.to_string()).into())
    }
}

/// Map a failure to create the output file to its underlying OS error.
fn sink_error(path: &Path, error: ffmpeg::Error) -> FfmpegError {
    match error {
        ffmpeg::Error::Other { errno } => FfmpegError::CannotCreateSink {
            path: path.to_path_buf(),
            source: std::io::Error::from_raw_os_error(errno),
        },
        e => FfmpegError::MuxerCreate(format!("{}: {}", path.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::aac_quality_bytes_per_second;
    use crate::tests::fixtures::write_sine_wav;

    #[test]
    fn test_control_position_starts_without_time_source() {
        let control = PipelineControl::new();
        assert_eq!(control.position(), None);
        control.set_position_micros(2_500_000);
        assert_eq!(control.position(), Some(WindowsTimeUnits::from_micros(2_500_000)));
        control.set_position_micros(-10);
        assert_eq!(control.position(), Some(WindowsTimeUnits::ZERO));
    }

    #[test]
    fn test_control_close_and_abort() {
        let control = PipelineControl::new();
        control.request_close();
        assert!(control.wait_for_close());

        let control = PipelineControl::new();
        control.request_abort();
        assert!(control.is_aborted());
        assert!(!control.wait_for_close());
    }

    #[test]
    fn test_build_fails_for_missing_directory() {
        crate::ffmpeg::init().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        write_sine_wav(&input, 44_100, 1, 0.5).unwrap();

        let source = MediaSource::open(&input).unwrap();
        let profile = TranscodeProfile::aac(16, 44_100, 1, aac_quality_bytes_per_second(2));
        let output = dir.path().join("missing").join("out.m4a");

        let err = Topology::build(source, &output, &profile).err().unwrap();
        match err {
            EncodeError::Ffmpeg(FfmpegError::CannotCreateSink { path, source }) => {
                assert_eq!(path, output);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_build_refuses_to_write_over_source() {
        crate::ffmpeg::init().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        write_sine_wav(&input, 44_100, 1, 0.5).unwrap();
        let original = std::fs::read(&input).unwrap();

        let source = MediaSource::open(&input).unwrap();
        let profile = TranscodeProfile::aac(16, 44_100, 1, aac_quality_bytes_per_second(2));
        let err = Topology::build(source, &input, &profile).err().unwrap();

        assert!(matches!(err, EncodeError::OutputIsInput(ref path) if *path == input));
        assert_eq!(std::fs::read(&input).unwrap(), original);
    }

    #[test]
    fn test_encoder_failure_keeps_existing_output() {
        crate::ffmpeg::init().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.m4a");
        write_sine_wav(&input, 44_100, 1, 0.5).unwrap();
        std::fs::write(&output, b"previous").unwrap();

        let source = MediaSource::open(&input).unwrap();
        let mut profile = TranscodeProfile::aac(16, 44_100, 1, aac_quality_bytes_per_second(2));
        profile.sample_rate = 0;

        let err = Topology::build(source, &output, &profile).err().unwrap();
        assert!(matches!(err, EncodeError::Ffmpeg(FfmpegError::EncoderConfigure(_))));
        assert_eq!(std::fs::read(&output).unwrap(), b"previous");
    }

    #[test]
    fn test_sink_error_keeps_other_errors() {
        let path = Path::new("out.m4a");
        assert!(matches!(
            sink_error(path, ffmpeg::Error::InvalidData),
            FfmpegError::MuxerCreate(_)
        ));
    }
}
