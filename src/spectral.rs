/// Per-frame spectral and timbral analysis
///
/// One `FrameAnalyzer` is built per extraction run and reused across frames;
/// it owns the FFT plan, the Hann window, the mel filterbank, the DCT basis,
/// and the bin-to-pitch-class mapping, all precomputed for a fixed frame size.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::constants::features::{CHROMA_BINS, MEL_BANDS, MFCC_COEFFICIENTS, ROLLOFF_FRACTION};

/// Floor added to mel band energies before taking the log
const LOG_ENERGY_FLOOR: f64 = 1e-10;

/// Reference frequency for pitch-class folding (A4)
const TUNING_A4_HZ: f64 = 440.0;

/// Descriptors computed from a single frame of samples
#[derive(Debug, Clone)]
pub struct FrameFeatures {
    pub mfcc: Vec<f64>,
    pub spectral_centroid: f64,
    pub spectral_rolloff: f64,
    pub spectral_flatness: f64,
    pub zcr: f64,
    pub rms: f64,
    pub chroma: Vec<f64>,
}

pub struct FrameAnalyzer {
    frame_size: usize,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    /// Center frequency of each magnitude bin (0..=frame_size/2), in Hz
    bin_freqs: Vec<f64>,
    /// Triangular mel filterbank, one weight row per band over the magnitude bins
    mel_filters: Vec<Vec<f64>>,
    /// DCT-II basis, MFCC_COEFFICIENTS rows x MEL_BANDS columns
    dct_basis: Vec<Vec<f64>>,
    /// Pitch class (0..12) of each magnitude bin; None for the DC bin
    bin_pitch_class: Vec<Option<usize>>,
}

impl FrameAnalyzer {
    pub fn new(sample_rate: u32, frame_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);

        let window: Vec<f64> = (0..frame_size).map(|i| hann_window(i, frame_size)).collect();

        let num_bins = frame_size / 2 + 1;
        let bin_hz = sample_rate as f64 / frame_size as f64;
        let bin_freqs: Vec<f64> = (0..num_bins).map(|k| k as f64 * bin_hz).collect();

        let mel_filters = mel_filterbank(sample_rate, frame_size, MEL_BANDS);
        let dct_basis = dct_ii_basis(MFCC_COEFFICIENTS, MEL_BANDS);

        let bin_pitch_class: Vec<Option<usize>> = bin_freqs
            .iter()
            .map(|&f| {
                if f <= 0.0 {
                    None
                } else {
                    // Semitones above A4, folded to a pitch class with A = class 9
                    let semitones = 12.0 * (f / TUNING_A4_HZ).log2();
                    let class = (semitones.round() as i64 + 9).rem_euclid(CHROMA_BINS as i64);
                    Some(class as usize)
                }
            })
            .collect();

        FrameAnalyzer {
            frame_size,
            fft,
            window,
            bin_freqs,
            mel_filters,
            dct_basis,
            bin_pitch_class,
        }
    }

    /// Compute all descriptors for one frame.
    ///
    /// `frame` must be exactly `frame_size` samples (the extractor pads the
    /// final short frame with zeros before calling this). Every descriptor is
    /// a deterministic function of the frame samples alone.
    pub fn analyze(&self, frame: &[f64]) -> FrameFeatures {
        debug_assert_eq!(frame.len(), self.frame_size);

        // Time-domain descriptors use the raw (unwindowed) samples
        let rms = root_mean_square(frame);
        let zcr = zero_crossing_rate(frame);

        // Windowed FFT -> one-sided magnitude spectrum
        let mut spectrum: Vec<Complex<f64>> = frame
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        self.fft.process(&mut spectrum);

        let num_bins = self.frame_size / 2 + 1;
        let magnitudes: Vec<f64> = spectrum[..num_bins].iter().map(|c| c.norm()).collect();

        let spectral_centroid = self.spectral_centroid(&magnitudes);
        let spectral_rolloff = self.spectral_rolloff(&magnitudes);
        let spectral_flatness = spectral_flatness(&magnitudes);
        let mfcc = self.mfcc(&magnitudes);
        let chroma = self.chroma(&magnitudes);

        FrameFeatures {
            mfcc,
            spectral_centroid,
            spectral_rolloff,
            spectral_flatness,
            zcr,
            rms,
            chroma,
        }
    }

    /// Magnitude-weighted mean frequency, in Hz
    fn spectral_centroid(&self, magnitudes: &[f64]) -> f64 {
        let total: f64 = magnitudes.iter().sum();
        if total == 0.0 {
            return 0.0;
        }
        let weighted: f64 = magnitudes
            .iter()
            .zip(self.bin_freqs.iter())
            .map(|(&m, &f)| m * f)
            .sum();
        weighted / total
    }

    /// Frequency below which ROLLOFF_FRACTION of the spectral energy lies, in Hz
    fn spectral_rolloff(&self, magnitudes: &[f64]) -> f64 {
        let total_energy: f64 = magnitudes.iter().map(|&m| m * m).sum();
        if total_energy == 0.0 {
            return 0.0;
        }
        let target = total_energy * ROLLOFF_FRACTION;
        let mut cumulative = 0.0;
        for (k, &m) in magnitudes.iter().enumerate() {
            cumulative += m * m;
            if cumulative >= target {
                return self.bin_freqs[k];
            }
        }
        *self.bin_freqs.last().unwrap_or(&0.0)
    }

    /// Mel filterbank energies -> log -> DCT-II, truncated to MFCC_COEFFICIENTS
    ///
    /// A zero spectrum maps to all-zero coefficients so that silence stays an
    /// all-zero feature set instead of picking up the log floor.
    fn mfcc(&self, magnitudes: &[f64]) -> Vec<f64> {
        let power: Vec<f64> = magnitudes.iter().map(|&m| m * m).collect();
        if power.iter().sum::<f64>() == 0.0 {
            return vec![0.0; MFCC_COEFFICIENTS];
        }

        let log_energies: Vec<f64> = self
            .mel_filters
            .iter()
            .map(|filter| {
                let energy: f64 = filter
                    .iter()
                    .zip(power.iter())
                    .map(|(&w, &p)| w * p)
                    .sum();
                (energy + LOG_ENERGY_FLOOR).ln()
            })
            .collect();

        self.dct_basis
            .iter()
            .map(|row| {
                row.iter()
                    .zip(log_energies.iter())
                    .map(|(&b, &e)| b * e)
                    .sum()
            })
            .collect()
    }

    /// Bin energies folded onto 12 pitch classes, normalized to the peak class
    fn chroma(&self, magnitudes: &[f64]) -> Vec<f64> {
        let mut classes = vec![0.0f64; CHROMA_BINS];
        for (k, &m) in magnitudes.iter().enumerate() {
            if let Some(class) = self.bin_pitch_class[k] {
                classes[class] += m * m;
            }
        }
        let peak = classes.iter().cloned().fold(0.0f64, f64::max);
        if peak > 0.0 {
            for c in classes.iter_mut() {
                *c /= peak;
            }
        }
        classes
    }
}

fn hann_window(i: usize, size: usize) -> f64 {
    0.5 * (1.0 - (2.0 * PI * i as f64 / size as f64).cos())
}

fn root_mean_square(frame: &[f64]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = frame.iter().map(|&x| x * x).sum();
    (sum_squares / frame.len() as f64).sqrt()
}

/// Sign changes per sample over the frame
fn zero_crossing_rate(frame: &[f64]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f64 / frame.len() as f64
}

/// Ratio of geometric to arithmetic mean of the magnitude spectrum.
/// 1.0 for a perfectly flat (noise-like) spectrum, near 0 for a tonal one.
fn spectral_flatness(magnitudes: &[f64]) -> f64 {
    let arithmetic: f64 = magnitudes.iter().sum::<f64>() / magnitudes.len() as f64;
    if arithmetic == 0.0 {
        return 0.0;
    }
    // A single zero magnitude makes the geometric mean zero
    if magnitudes.iter().any(|&m| m == 0.0) {
        return 0.0;
    }
    let log_sum: f64 = magnitudes.iter().map(|&m| m.ln()).sum();
    let geometric = (log_sum / magnitudes.len() as f64).exp();
    geometric / arithmetic
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over the one-sided magnitude bins.
/// Bands span 0 Hz to Nyquist, equally spaced on the mel scale.
fn mel_filterbank(sample_rate: u32, frame_size: usize, num_bands: usize) -> Vec<Vec<f64>> {
    let num_bins = frame_size / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;
    let max_mel = hz_to_mel(nyquist);

    // num_bands + 2 edge points: each band is a triangle over three of them
    let edges_hz: Vec<f64> = (0..num_bands + 2)
        .map(|i| mel_to_hz(max_mel * i as f64 / (num_bands + 1) as f64))
        .collect();

    let bin_hz = sample_rate as f64 / frame_size as f64;

    (0..num_bands)
        .map(|band| {
            let (lower, center, upper) = (edges_hz[band], edges_hz[band + 1], edges_hz[band + 2]);
            (0..num_bins)
                .map(|k| {
                    let f = k as f64 * bin_hz;
                    if f <= lower || f >= upper {
                        0.0
                    } else if f <= center {
                        (f - lower) / (center - lower)
                    } else {
                        (upper - f) / (upper - center)
                    }
                })
                .collect()
        })
        .collect()
}

/// DCT-II basis matrix: `coefficients` rows over `bands` input points
fn dct_ii_basis(coefficients: usize, bands: usize) -> Vec<Vec<f64>> {
    (0..coefficients)
        .map(|k| {
            (0..bands)
                .map(|n| (PI * k as f64 * (n as f64 + 0.5) / bands as f64).cos())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::audio::{FRAME_SIZE, SAMPLE_RATE};

    fn sine_frame(freq: f64, amplitude: f64) -> Vec<f64> {
        (0..FRAME_SIZE)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / SAMPLE_RATE as f64).sin())
            .collect()
    }

    #[test]
    fn test_silence_frame_yields_zero_descriptors() {
        let analyzer = FrameAnalyzer::new(SAMPLE_RATE, FRAME_SIZE);
        let features = analyzer.analyze(&vec![0.0; FRAME_SIZE]);

        assert_eq!(features.spectral_centroid, 0.0);
        assert_eq!(features.spectral_rolloff, 0.0);
        assert_eq!(features.spectral_flatness, 0.0);
        assert_eq!(features.zcr, 0.0);
        assert_eq!(features.rms, 0.0);
        assert!(features.chroma.iter().all(|&c| c == 0.0));
        assert_eq!(features.mfcc.len(), MFCC_COEFFICIENTS);
        assert!(features.mfcc.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_rms_of_constant_frame() {
        let frame = vec![0.5f64; FRAME_SIZE];
        let rms = root_mean_square(&frame);
        assert!((rms - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zcr_counts_sign_changes() {
        // Alternating +/- flips sign at every one of the 511 adjacent pairs
        let frame: Vec<f64> = (0..FRAME_SIZE)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let zcr = zero_crossing_rate(&frame);
        assert!((zcr - (FRAME_SIZE - 1) as f64 / FRAME_SIZE as f64).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_tracks_tone_frequency() {
        let analyzer = FrameAnalyzer::new(SAMPLE_RATE, FRAME_SIZE);
        let low = analyzer.analyze(&sine_frame(440.0, 0.8));
        let high = analyzer.analyze(&sine_frame(4000.0, 0.8));

        assert!(low.spectral_centroid < high.spectral_centroid);
        // The windowed peak should sit within a few bins of the tone
        let bin_hz = SAMPLE_RATE as f64 / FRAME_SIZE as f64;
        assert!((high.spectral_centroid - 4000.0).abs() < 4.0 * bin_hz);
    }

    #[test]
    fn test_rolloff_bounded_by_nyquist() {
        let analyzer = FrameAnalyzer::new(SAMPLE_RATE, FRAME_SIZE);
        let features = analyzer.analyze(&sine_frame(1000.0, 0.5));
        assert!(features.spectral_rolloff > 0.0);
        assert!(features.spectral_rolloff <= SAMPLE_RATE as f64 / 2.0);
    }

    #[test]
    fn test_tone_is_less_flat_than_impulse() {
        let analyzer = FrameAnalyzer::new(SAMPLE_RATE, FRAME_SIZE);
        let tone = analyzer.analyze(&sine_frame(1000.0, 0.5));

        // An impulse has a flat magnitude spectrum
        let mut impulse = vec![0.0f64; FRAME_SIZE];
        impulse[FRAME_SIZE / 2] = 1.0;
        let flat = analyzer.analyze(&impulse);

        assert!(tone.spectral_flatness < flat.spectral_flatness);
    }

    #[test]
    fn test_chroma_peaks_at_tone_pitch_class() {
        let analyzer = FrameAnalyzer::new(SAMPLE_RATE, FRAME_SIZE);
        // A4 = 440 Hz folds to pitch class 9
        let features = analyzer.analyze(&sine_frame(440.0, 0.8));
        let peak_class = features
            .chroma
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_class, 9);
        assert_eq!(features.chroma[peak_class], 1.0);
    }

    #[test]
    fn test_mel_filterbank_covers_spectrum() {
        let filters = mel_filterbank(SAMPLE_RATE, FRAME_SIZE, MEL_BANDS);
        assert_eq!(filters.len(), MEL_BANDS);
        for filter in &filters {
            assert_eq!(filter.len(), FRAME_SIZE / 2 + 1);
            assert!(filter.iter().sum::<f64>() > 0.0, "empty mel band");
        }
    }
}
