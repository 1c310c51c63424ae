//! WAV file reading and writing.
//!
//! The engine renders mono `f32`, so files are written as 32-bit IEEE float
//! mono at the engine sample rate.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use crate::{Error, Result};

fn spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Write mono samples as a 32-bit float WAV file.
///
/// # Example
/// ```ignore
/// let samples = vec![0.0f32; 19200]; // 1 second of silence
/// write_wav("output.wav", &samples, 19200)?;
/// ```
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WavWriter::create(path, spec(sample_rate))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    tracing::info!(path = %path.display(), samples = samples.len(), sample_rate, "wav written");
    Ok(())
}

/// Read a mono WAV file, returning its samples and sample rate.
///
/// Integer files are scaled to `[-1.0, 1.0)`. Multi-channel files are
/// rejected; the engine never writes them.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(Error::UnsupportedFormat(format!(
            "{} channels, expected mono",
            spec.channels
        )));
    }

    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };
    Ok((samples, spec.sample_rate))
}
