//! PCM file import and WAV export
//!
//! Input may be a mono 16-bit WAV file or headerless little-endian PCM.

use std::io::{Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::warn;

use super::packet::SAMPLE_BYTES;

/// Errors reading or writing audio files
#[derive(thiserror::Error, Debug)]
pub enum WavError {
    #[error("WAV error: {0}")]
    Hound(#[from] hound::Error),

    #[error("Unsupported WAV format: {channels} channel(s), {bits} bits")]
    UnsupportedFormat { channels: u16, bits: u16 },
}

/// Whether a path should be treated as WAV
pub fn is_wav_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Decode headerless little-endian 16-bit PCM
///
/// A trailing odd byte is discarded.
pub fn decode_raw(bytes: &[u8]) -> Vec<i16> {
    if bytes.len() % SAMPLE_BYTES != 0 {
        warn!("Raw PCM input has a trailing odd byte; ignoring it");
    }
    bytes
        .chunks_exact(SAMPLE_BYTES)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

/// Read a mono 16-bit WAV stream, returning its samples and sample rate
pub fn read_wav<R: Read>(reader: R) -> Result<(Vec<i16>, u32), WavError> {
    let reader = WavReader::new(reader)?;
    let spec = reader.spec();
    if spec.channels != 1 || spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int
    {
        return Err(WavError::UnsupportedFormat {
            channels: spec.channels,
            bits: spec.bits_per_sample,
        });
    }

    let samples = reader.into_samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    Ok((samples, spec.sample_rate))
}

/// Write samples as a mono 16-bit WAV stream
pub fn write_wav<W: Write + Seek>(
    writer: W,
    samples: &[i16],
    sample_rate: u32,
) -> Result<(), WavError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut wav = WavWriter::new(writer, spec)?;
    for &sample in samples {
        wav.write_sample(sample)?;
    }
    wav.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_wav_round_trip() {
        let samples: Vec<i16> = (0..640).map(|i| (i * 37 % 2000 - 1000) as i16).collect();

        let mut cursor = Cursor::new(Vec::new());
        write_wav(&mut cursor, &samples, 8000).unwrap();
        cursor.set_position(0);

        let (decoded, rate) = read_wav(cursor).unwrap();
        assert_eq!(rate, 8000);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_stereo_wav_rejected() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut wav = WavWriter::new(&mut cursor, spec).unwrap();
            wav.write_sample(1i16).unwrap();
            wav.write_sample(2i16).unwrap();
            wav.finalize().unwrap();
        }
        cursor.set_position(0);

        assert!(matches!(
            read_wav(cursor),
            Err(WavError::UnsupportedFormat { channels: 2, .. })
        ));
    }

    #[test]
    fn test_decode_raw() {
        assert_eq!(decode_raw(&[0x01, 0x00, 0xff, 0xff, 0x07]), vec![1, -1]);
    }

    #[test]
    fn test_is_wav_path() {
        assert!(is_wav_path(Path::new("out.WAV")));
        assert!(!is_wav_path(Path::new("out.raw")));
        assert!(!is_wav_path(Path::new("out")));
    }
}
