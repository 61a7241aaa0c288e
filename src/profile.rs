//! AAC transcode profile
//!
//! Describes the target of a transcode: codec, bitrate, sample rate, channel
//! count and container. The profile is derived from the source attributes and
//! a quality level from 1 to 4.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::util::channel_layout::ChannelLayout;

/// Average output bytes per second for quality levels 1 through 4
/// (96, 128, 160 and 192 kbps).
pub const AAC_QUALITY_BYTES_PER_SECOND: [u32; 4] = [12_000, 16_000, 20_000, 24_000];

/// Quality level used when none is given
pub const DEFAULT_QUALITY: i32 = 2;

/// AAC-LC profile level indications (ISO/IEC 14496-3:2009).
pub const AAC_PROFILE_L2: u32 = 0x29; // Max 2 channels, 48kHz
pub const AAC_PROFILE_L4: u32 = 0x2a; // Max 5 channels, 48kHz
pub const AAC_PROFILE_L5: u32 = 0x2b; // Max 5 channels, 96kHz

/// Sampling frequencies an AAC-LC L2 stream may carry.
pub const AAC_SAMPLE_RATES: &[u32] = &[
    8_000, 11_025, 12_000, 16_000, 22_050, 24_000, 32_000, 44_100, 48_000,
];

/// Sample rate used when the source rate cannot be carried as-is
pub const FALLBACK_SAMPLE_RATE: u32 = 48_000;

/// Maximum channels for the L2 profile level
pub const MAX_CHANNELS: u16 = 2;

/// File extension of the output container
pub const CONTAINER_EXTENSION: &str = "m4a";

/// Clamp a quality level into the supported range.
pub fn clamp_quality(quality: i32) -> i32 {
    quality.clamp(1, AAC_QUALITY_BYTES_PER_SECOND.len() as i32)
}

/// Average output bytes per second for a quality level.
///
/// Levels below 1 map to the lowest bitrate and levels above 4 to the highest.
pub fn aac_quality_bytes_per_second(quality: i32) -> u32 {
    AAC_QUALITY_BYTES_PER_SECOND[(clamp_quality(quality) - 1) as usize]
}

/// Output bitrate in bits per second for a quality level.
pub fn aac_quality_bitrate(quality: i32) -> u64 {
    u64::from(aac_quality_bytes_per_second(quality)) * 8
}

/// Target codec of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// AAC low complexity
    AacLc,
}

impl AudioCodec {
    pub fn codec_id(self) -> ffmpeg::codec::Id {
        match self {
            AudioCodec::AacLc => ffmpeg::codec::Id::AAC,
        }
    }
}

/// Target container of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerType {
    /// MPEG-4 audio (`.m4a`)
    Mpeg4,
}

impl ContainerType {
    /// FFmpeg muxer name
    pub fn muxer_name(self) -> &'static str {
        match self {
            ContainerType::Mpeg4 => "ipod",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ContainerType::Mpeg4 => CONTAINER_EXTENSION,
        }
    }
}

/// A transcode profile: what the output stream and container look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeProfile {
    pub codec: AudioCodec,
    pub bits_per_sample: u32,
    pub sample_rate: u32,
    pub channels: u16,
    pub avg_bytes_per_second: u32,
    pub profile_level: u32,
    pub container: ContainerType,
}

impl TranscodeProfile {
    /// Build an AAC-LC / MPEG-4 profile for the given source format.
    ///
    /// The sample rate and channel count are fitted to what the L2 profile
    /// level can carry.
    pub fn aac(
        bits_per_sample: u32,
        samples_per_second: u32,
        channels: u16,
        avg_bytes_per_second: u32,
    ) -> Self {
        let sample_rate = if AAC_SAMPLE_RATES.contains(&samples_per_second) {
            samples_per_second
        } else {
            FALLBACK_SAMPLE_RATE
        };

        Self {
            codec: AudioCodec::AacLc,
            bits_per_sample,
            sample_rate,
            channels: channels.clamp(1, MAX_CHANNELS),
            avg_bytes_per_second,
            profile_level: AAC_PROFILE_L2,
            container: ContainerType::Mpeg4,
        }
    }

    /// Output bitrate in bits per second.
    pub fn bitrate(&self) -> u64 {
        u64::from(self.avg_bytes_per_second) * 8
    }

    /// Output bitrate in kbps, as shown to the user.
    pub fn bitrate_kbps(&self) -> u64 {
        self.bitrate() / 1000
    }

    /// Channel layout of the encoded stream.
    pub fn channel_layout(&self) -> ChannelLayout {
        if self.channels == 1 {
            ChannelLayout::MONO
        } else {
            ChannelLayout::STEREO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_table() {
        assert_eq!(aac_quality_bitrate(1), 96_000);
        assert_eq!(aac_quality_bitrate(2), 128_000);
        assert_eq!(aac_quality_bitrate(3), 160_000);
        assert_eq!(aac_quality_bitrate(4), 192_000);
    }

    #[test]
    fn test_quality_clamps_low() {
        assert_eq!(aac_quality_bytes_per_second(0), 12_000);
        assert_eq!(aac_quality_bytes_per_second(-7), 12_000);
        assert_eq!(aac_quality_bitrate(i32::MIN), 96_000);
    }

    #[test]
    fn test_quality_clamps_high() {
        assert_eq!(aac_quality_bytes_per_second(5), 24_000);
        assert_eq!(aac_quality_bitrate(i32::MAX), 192_000);
    }

    #[test]
    fn test_profile_keeps_supported_format() {
        let profile = TranscodeProfile::aac(16, 44_100, 2, aac_quality_bytes_per_second(3));
        assert_eq!(profile.sample_rate, 44_100);
        assert_eq!(profile.channels, 2);
        assert_eq!(profile.bits_per_sample, 16);
        assert_eq!(profile.bitrate_kbps(), 160);
        assert_eq!(profile.profile_level, AAC_PROFILE_L2);
        assert_eq!(profile.container, ContainerType::Mpeg4);
        assert_eq!(profile.channel_layout(), ChannelLayout::STEREO);
    }

    #[test]
    fn test_profile_fits_l2_limits() {
        let profile = TranscodeProfile::aac(24, 96_000, 6, aac_quality_bytes_per_second(4));
        assert_eq!(profile.sample_rate, FALLBACK_SAMPLE_RATE);
        assert_eq!(profile.channels, MAX_CHANNELS);
    }

    #[test]
    fn test_profile_mono() {
        let profile = TranscodeProfile::aac(16, 22_050, 1, aac_quality_bytes_per_second(1));
        assert_eq!(profile.channel_layout(), ChannelLayout::MONO);
        assert_eq!(profile.bitrate(), 96_000);
    }

    #[test]
    fn test_container() {
        assert_eq!(ContainerType::Mpeg4.extension(), "m4a");
        assert_eq!(ContainerType::Mpeg4.muxer_name(), "ipod");
        assert_eq!(AudioCodec::AacLc.codec_id(), ffmpeg::codec::Id::AAC);
    }
}
