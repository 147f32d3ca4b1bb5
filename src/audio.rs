use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::sync::{Arc, Mutex};

use crate::constants::audio::SAMPLE_RATE;

/// Microphone capture collaborator.
///
/// Records mono samples from the default input device and delivers one
/// finished buffer at `SAMPLE_RATE` when recording stops. The analysis core
/// never sees the stream; it only receives the completed buffer.
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .context("No input device available")?;

        println!("Using audio input device: {}", device.name()?);

        let default_config = device
            .default_input_config()
            .context("Failed to get default input config")?;

        let mut config: StreamConfig = default_config.clone().into();

        // Prefer capturing directly at the analysis rate when the device allows it
        let supported_configs = device
            .supported_input_configs()
            .context("Failed to query supported input configs")?;
        let mut native_rate = false;
        for supported_config in supported_configs {
            if supported_config.min_sample_rate().0 <= SAMPLE_RATE
                && supported_config.max_sample_rate().0 >= SAMPLE_RATE
            {
                native_rate = true;
                config.sample_rate = cpal::SampleRate(SAMPLE_RATE);
                break;
            }
        }

        if !native_rate {
            println!(
                "Note: {}Hz not supported, capturing at {}Hz and resampling",
                SAMPLE_RATE, config.sample_rate.0
            );
        }

        println!(
            "Capture config: {} channels, {} Hz, {:?}",
            config.channels,
            config.sample_rate.0,
            default_config.sample_format()
        );

        Ok(AudioCapture {
            device,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    pub fn start_recording(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(()); // Already recording
        }

        self.buffer.lock().unwrap().clear();

        let buffer = Arc::clone(&self.buffer);
        let channels = self.config.channels as usize;

        let err_fn = |err| eprintln!("🔴 Audio stream error: {}", err);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Handle poisoned mutex gracefully in audio callback
                    let Ok(mut buf) = buffer.lock() else {
                        eprintln!("⚠️  Audio buffer mutex poisoned, dropping audio data");
                        return;
                    };

                    // Convert to mono if needed and store samples
                    if channels == 1 {
                        buf.extend_from_slice(data);
                    } else {
                        for chunk in data.chunks(channels) {
                            let mono_sample: f32 = chunk.iter().sum::<f32>() / channels as f32;
                            buf.push(mono_sample);
                        }
                    }
                },
                err_fn,
                None,
            )
            .context(
                "Failed to build input stream.\n\n\
                This is likely a microphone permissions issue.\n\
                Please grant microphone access to your terminal and retry.",
            )?;

        stream.play().context("Failed to start audio stream")?;

        self.stream = Some(stream);
        println!("🎤 Recording started");

        Ok(())
    }

    /// Stop the stream and return the captured buffer, resampled to `SAMPLE_RATE`
    pub fn stop_recording(&mut self) -> Result<Vec<f32>> {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            println!("⏹️  Recording stopped");
        }

        let buffer = self.buffer.lock().unwrap();
        let audio_data = buffer.clone();
        drop(buffer); // Release lock before processing

        let actual_sample_rate = self.config.sample_rate.0;

        println!(
            "Captured {} samples ({:.2}s of audio at {}Hz)",
            audio_data.len(),
            audio_data.len() as f32 / actual_sample_rate as f32,
            actual_sample_rate
        );

        if actual_sample_rate != SAMPLE_RATE {
            println!("Resampling from {}Hz to {}Hz...", actual_sample_rate, SAMPLE_RATE);
            Ok(resample(&audio_data, actual_sample_rate, SAMPLE_RATE))
        } else {
            Ok(audio_data)
        }
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    // Simple energy-based silence detection
    pub fn is_silence(audio: &[f32], threshold: f32) -> bool {
        if audio.is_empty() {
            return true;
        }

        let sum_squares: f32 = audio.iter().map(|&x| x * x).sum();
        let rms = (sum_squares / audio.len() as f32).sqrt();

        rms < threshold
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        let _ = self.stop_recording();
    }
}

// Simple linear interpolation resampling
pub(crate) fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() {
        return input.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (input.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f64 * ratio;
        let src_idx_floor = src_idx.floor() as usize;
        let src_idx_ceil = (src_idx_floor + 1).min(input.len() - 1);
        let frac = src_idx - src_idx_floor as f64;

        // Linear interpolation
        let sample = input[src_idx_floor] * (1.0 - frac) as f32
            + input[src_idx_ceil] * frac as f32;

        output.push(sample);
    }

    output
}
