//! Source audio decoder
//!
//! Turns the selected stream's compressed packets (MP3, FLAC, Vorbis, PCM, …)
//! into PCM frames for the resampler.

use crate::error::{FfmpegError, Result};
use ffmpeg_next as ffmpeg;
use ffmpeg_next::codec::packet::Packet;
use ffmpeg_next::util::frame::Audio as AudioFrame;

pub struct AudioDecoder {
    decoder: ffmpeg::decoder::Audio,
    stream_index: usize,
    draining: bool,
    skipped_packets: u64,
}

impl AudioDecoder {
    /// Open a decoder for `stream`, configured from its codec parameters.
    pub fn open(stream: &ffmpeg::format::stream::Stream) -> Result<Self> {
        Self::from_parameters(stream.parameters(), stream.index())
    }

    pub fn from_parameters(params: ffmpeg::codec::Parameters, stream_index: usize) -> Result<Self> {
        let decoder = ffmpeg::codec::Context::from_parameters(params)
            .and_then(|context| context.decoder().audio())
            .map_err(|e| {
                FfmpegError::DecoderNotFound(format!(
                    "no audio decoder for stream {}: {}",
                    stream_index, e
                ))
            })?;

        Ok(Self {
            decoder,
            stream_index,
            draining: false,
            skipped_packets: 0,
        })
    }

    /// Width in bits of the samples this decoder produces.
    pub fn decoded_bits_per_sample(&self) -> u32 {
        self.decoder.format().bytes() as u32 * 8
    }

    /// Feed one packet, or `None` at the end of the stream to start draining.
    ///
    /// A packet the decoder rejects as invalid data is skipped, so one damaged
    /// packet does not fail the whole file.
    pub fn feed(&mut self, packet: Option<&Packet>) -> Result<()> {
        let result = match packet {
            Some(packet) => self.decoder.send_packet(packet),
            None if self.draining => return Ok(()),
            None => {
                self.draining = true;
                self.decoder.send_eof()
            }
        };

        match result {
            Ok(()) | Err(ffmpeg::Error::Eof) => Ok(()),
            Err(ffmpeg::Error::InvalidData) => {
                self.skipped_packets += 1;
                tracing::warn!(
                    stream_index = self.stream_index,
                    pts = ?packet.and_then(|p| p.pts()),
                    "skipping undecodable packet"
                );
                Ok(())
            }
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => Ok(()),
            Err(e) => Err(self.error("feed", e)),
        }
    }

    /// Next decoded frame, or `None` until more input is fed.
    pub fn next_frame(&mut self) -> Result<Option<AudioFrame>> {
        let mut frame = AudioFrame::empty();
        match self.decoder.receive_frame(&mut frame) {
            Ok(()) => Ok(Some(frame)),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => Ok(None),
            Err(e) => Err(self.error("decode", e)),
        }
    }

    /// Packets dropped as undecodable so far.
    pub fn skipped_packets(&self) -> u64 {
        self.skipped_packets
    }

    fn error(&self, op: &str, e: ffmpeg::Error) -> crate::error::EncodeError {
        FfmpegError::DecodePacket(format!("{} on stream {}: {}", op, self.stream_index, e)).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::write_sine_wav;

    #[test]
    fn test_common_decoders_available() {
        crate::ffmpeg::init().unwrap();
        for id in [
            ffmpeg::codec::Id::PCM_S16LE,
            ffmpeg::codec::Id::FLAC,
            ffmpeg::codec::Id::MP3,
        ] {
            assert!(ffmpeg::codec::decoder::find(id).is_some(), "{:?}", id);
        }
    }

    #[test]
    fn test_decode_wav_to_end() {
        crate::ffmpeg::init().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 8_000, 1, 0.5).unwrap();

        let mut input = ffmpeg::format::input(&path).unwrap();
        let mut decoder = AudioDecoder::open(&input.stream(0).unwrap()).unwrap();
        assert_eq!(decoder.decoded_bits_per_sample(), 16);

        let mut samples = 0;
        for (_, packet) in input.packets() {
            decoder.feed(Some(&packet)).unwrap();
            while let Some(frame) = decoder.next_frame().unwrap() {
                samples += frame.samples();
            }
        }
        decoder.feed(None).unwrap();
        decoder.feed(None).unwrap();
        while let Some(frame) = decoder.next_frame().unwrap() {
            samples += frame.samples();
        }

        assert_eq!(samples, 4_000);
        assert_eq!(decoder.skipped_packets(), 0);
    }
}
