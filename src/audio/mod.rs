//! WAV input for the tracker. Samples are normalized to `[-1, 1]` and downmixed to mono.
use std::io::{Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;

use crate::error::{Error, Result};

/// Mono audio at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSignal {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Read a PCM WAV file (8/16/24/32-bit integer or 32-bit float).
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<AudioSignal> {
    let path = path.as_ref();
    debug!("Opening \"{}\"", path.display());
    decode(WavReader::open(path)?)
}

/// Read WAV data from any reader, e.g. an in-memory `Cursor`.
pub fn read_wav_from<R: Read>(reader: R) -> Result<AudioSignal> {
    decode(WavReader::new(reader)?)
}

fn decode<R: Read>(reader: WavReader<R>) -> Result<AudioSignal> {
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(Error::InvalidAudio("WAV file declares zero channels".into()));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            if !(1..=32).contains(&spec.bits_per_sample) {
                return Err(Error::InvalidAudio(format!(
                    "unsupported bit depth: {}",
                    spec.bits_per_sample
                )));
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
        SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(Error::InvalidAudio(format!(
                    "unsupported float bit depth: {}",
                    spec.bits_per_sample
                )));
            }
            reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?
        }
    };

    debug!(
        "Decoded {} samples, {} channel(s) at {} Hz, {} bits",
        interleaved.len(),
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample
    );

    Ok(AudioSignal {
        samples: downmix(&interleaved, spec.channels as usize),
        sample_rate: spec.sample_rate,
    })
}

/// Average interleaved channels into one. A trailing partial frame is dropped.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Write mono `samples` as a 16-bit PCM WAV file, clipping to `[-1, 1]`.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let writer = WavWriter::create(path, pcm16_spec(1, sample_rate))?;
    write_pcm16(writer, samples)
}

/// Write interleaved `samples` with `channels` channels as 16-bit PCM to any writer.
pub fn write_wav_to<W: Write + Seek>(
    out: W,
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
) -> Result<()> {
    let writer = WavWriter::new(out, pcm16_spec(channels, sample_rate))?;
    write_pcm16(writer, samples)
}

fn pcm16_spec(channels: u16, sample_rate: u32) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn write_pcm16<W: Write + Seek>(mut writer: WavWriter<W>, samples: &[f32]) -> Result<()> {
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
