//! Test fixtures: synthesized media files

use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a 16-bit PCM WAV file holding a 440 Hz sine tone on every channel.
pub fn write_sine_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    seconds: f64,
) -> std::io::Result<()> {
    let frames = (f64::from(sample_rate) * seconds).round() as u32;
    let block_align = channels * 2;
    let data_len = frames * u32::from(block_align);

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(b"RIFF")?;
    out.write_all(&(36 + data_len).to_le_bytes())?;
    out.write_all(b"WAVE")?;

    out.write_all(b"fmt ")?;
    out.write_all(&16u32.to_le_bytes())?;
    out.write_all(&1u16.to_le_bytes())?; // PCM
    out.write_all(&channels.to_le_bytes())?;
    out.write_all(&sample_rate.to_le_bytes())?;
    out.write_all(&(sample_rate * u32::from(block_align)).to_le_bytes())?;
    out.write_all(&block_align.to_le_bytes())?;
    out.write_all(&16u16.to_le_bytes())?;

    out.write_all(b"data")?;
    out.write_all(&data_len.to_le_bytes())?;
    for n in 0..frames {
        let t = f64::from(n) / f64::from(sample_rate);
        let sample = ((2.0 * PI * 440.0 * t).sin() * 0.5 * f64::from(i16::MAX)) as i16;
        for _ in 0..channels {
            out.write_all(&sample.to_le_bytes())?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 8_000, 2, 0.5).unwrap();
        // 44 byte header + 4000 frames of 4 bytes.
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 44 + 16_000);
    }
}
