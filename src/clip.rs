/// WAV clip decoding collaborator
///
/// Loads a recorded clip from disk into the mono f32 buffer the extractor
/// consumes: integer or float PCM, channels mixed down, resampled to the
/// process-wide analysis rate.

use anyhow::{Context, Result};
use std::path::Path;

use crate::audio::resample;
use crate::constants::audio::SAMPLE_RATE;

pub fn load_wav(path: &Path) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .context("Failed to decode float samples")?,
        hound::SampleFormat::Int => {
            let max_amplitude = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_amplitude))
                .collect::<Result<Vec<f32>, _>>()
                .context("Failed to decode integer samples")?
        }
    };

    let mono = mix_to_mono(&samples, spec.channels as usize);

    println!(
        "Loaded {}: {} samples, {} channels, {}Hz",
        path.display(),
        mono.len(),
        spec.channels,
        spec.sample_rate
    );

    if spec.sample_rate != SAMPLE_RATE {
        println!("Resampling from {}Hz to {}Hz...", spec.sample_rate, SAMPLE_RATE);
        Ok(resample(&mono, spec.sample_rate, SAMPLE_RATE))
    } else {
        Ok(mono)
    }
}

fn mix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
