//! Rendering sample buffers and encoding them as 24-bit PCM WAV.
//!
//! The encoder is deterministic and byte-exact: a RIFF/WAVE header with a
//! 16-byte fmt chunk, followed by interleaved 24-bit signed little-endian
//! samples. Any consumer of standard uncompressed WAV can open the output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// An in-memory interleaved sample buffer plus the metadata needed to encode
/// it.
///
/// # Examples
///
/// ```
/// use klang::render_mono;
///
/// // One second of a 440 Hz sine at half amplitude
/// let wav = render_mono(1.0, 44100, |t| {
///     0.5 * (t * 440.0 * std::f64::consts::TAU).sin()
/// });
/// assert_eq!(wav.frame_count(), 44100);
///
/// let mut bytes = Vec::new();
/// wav.write_to(&mut bytes).unwrap();
/// assert_eq!(&bytes[0..4], b"RIFF");
/// ```
pub struct Wav {
    samples: Vec<f64>,
    sample_rate: u32,
    channels: u16,
}

/// Renders `floor(duration_sec × sample_rate)` frames by calling `generator`
/// once per frame with the frame's time in seconds.
pub fn render_mono(
    duration_sec: f64,
    sample_rate: u32,
    mut generator: impl FnMut(f64) -> f64,
) -> Wav {
    let frames = (duration_sec * f64::from(sample_rate)).floor() as usize;
    let mut samples = Vec::with_capacity(frames);
    for i in 0..frames {
        let t = i as f64 / f64::from(sample_rate);
        samples.push(generator(t));
    }
    Wav {
        samples,
        sample_rate,
        channels: 1,
    }
}

/// Stereo variant of [`render_mono`]; the generator returns a (left, right)
/// pair per frame and the buffer interleaves them.
pub fn render_stereo(
    duration_sec: f64,
    sample_rate: u32,
    mut generator: impl FnMut(f64) -> (f64, f64),
) -> Wav {
    let frames = (duration_sec * f64::from(sample_rate)).floor() as usize;
    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let t = i as f64 / f64::from(sample_rate);
        let (left, right) = generator(t);
        samples.push(left);
        samples.push(right);
    }
    Wav {
        samples,
        sample_rate,
        channels: 2,
    }
}

const CHUNK_HEADER_SIZE: u32 = 8;
const WAVE_HEADER_SIZE: u32 = 4;
const FMT_CHUNK_SIZE: u32 = 16;
const BYTES_PER_SAMPLE: u32 = 3;
const INT24_MAX: f64 = 0x7f_ffff as f64;

/// Clamps to [-1, 1] and scales to a truncated 24-bit integer.
///
/// An out-of-range input is a caller bug (unattenuated polyphonic mix);
/// trapped in debug builds, clamped silently in release.
fn sample_to_int24(value: f64) -> i32 {
    debug_assert!(
        (-1.0..=1.0).contains(&value),
        "clipping: sample {} outside [-1, 1]",
        value
    );
    (value.clamp(-1.0, 1.0) * INT24_MAX) as i32
}

impl Wav {
    /// Wraps an existing interleaved buffer.
    pub fn from_samples(samples: Vec<f64>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / f64::from(self.sample_rate)
    }

    /// Encodes the buffer as a 24-bit PCM WAV stream.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let data_size = self.samples.len() as u32 * BYTES_PER_SAMPLE;

        // RIFF header
        writer.write_all(b"RIFF")?;
        let riff_size = WAVE_HEADER_SIZE
            + CHUNK_HEADER_SIZE
            + FMT_CHUNK_SIZE
            + CHUNK_HEADER_SIZE
            + data_size;
        writer.write_all(&riff_size.to_le_bytes())?;
        writer.write_all(b"WAVE")?;

        // fmt chunk
        writer.write_all(b"fmt ")?;
        writer.write_all(&FMT_CHUNK_SIZE.to_le_bytes())?;
        writer.write_all(&1u16.to_le_bytes())?; // format tag: PCM
        writer.write_all(&self.channels.to_le_bytes())?;
        writer.write_all(&self.sample_rate.to_le_bytes())?;
        let byte_rate = self.sample_rate * u32::from(self.channels) * BYTES_PER_SAMPLE;
        writer.write_all(&byte_rate.to_le_bytes())?;
        let block_align = self.channels * BYTES_PER_SAMPLE as u16;
        writer.write_all(&block_align.to_le_bytes())?;
        writer.write_all(&24u16.to_le_bytes())?; // bits per sample

        // data chunk
        writer.write_all(b"data")?;
        writer.write_all(&data_size.to_le_bytes())?;
        for &sample in &self.samples {
            let scaled = sample_to_int24(sample);
            let bytes = scaled.to_le_bytes();
            writer.write_all(&bytes[0..3])?;
        }

        Ok(())
    }

    /// Writes the encoded WAV to a file, creating or truncating it.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()
    }
}
