/// Voiceprint feature extraction
///
/// Slices a mono sample buffer into overlapping frames, runs the per-frame
/// spectral analysis, and reduces the per-frame descriptors to one mean
/// `FeatureSet` for the whole recording. Pure computation: no I/O, no state
/// beyond the fixed frame geometry in `constants::audio`.

use serde::{Deserialize, Serialize};

use crate::constants::audio::{FRAME_SIZE, HOP_SIZE, SAMPLE_RATE};
use crate::spectral::{FrameAnalyzer, FrameFeatures};

/// Mean spectral/timbral descriptors of one recording.
///
/// Every field is the arithmetic mean, across all frames, of that field's
/// per-frame value; `mfcc` and `chroma` are averaged element-wise. The schema
/// is fixed: a recording that produces zero frames yields zero scalars and
/// empty vectors, never missing fields, so the flattening order downstream
/// stays stable. Field names match the persisted JSON of the enrollment
/// record (`spectralCentroid` etc.).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureSet {
    pub mfcc: Vec<f64>,
    pub spectral_centroid: f64,
    pub spectral_rolloff: f64,
    pub spectral_flatness: f64,
    pub zcr: f64,
    pub rms: f64,
    pub chroma: Vec<f64>,
}

impl FeatureSet {
    /// True when no frame contributed anything (silence or a zero-frame buffer)
    pub fn is_empty(&self) -> bool {
        self.mfcc.iter().all(|&v| v == 0.0)
            && self.chroma.iter().all(|&v| v == 0.0)
            && self.spectral_centroid == 0.0
            && self.spectral_rolloff == 0.0
            && self.spectral_flatness == 0.0
            && self.zcr == 0.0
            && self.rms == 0.0
    }
}

/// Extract the mean `FeatureSet` of a mono sample buffer at `SAMPLE_RATE`.
///
/// Frames advance by `HOP_SIZE` and the final short frame is right-padded
/// with zeros. A buffer shorter than one frame is valid degenerate input and
/// produces the empty `FeatureSet` rather than an error.
pub fn extract(samples: &[f32]) -> FeatureSet {
    if samples.len() < FRAME_SIZE {
        return FeatureSet::default();
    }
    let frame_count = (samples.len() - FRAME_SIZE) / HOP_SIZE + 1;

    let analyzer = FrameAnalyzer::new(SAMPLE_RATE, FRAME_SIZE);
    let mut accumulator = FeatureAccumulator::new();
    let mut frame = vec![0.0f64; FRAME_SIZE];

    for i in 0..frame_count {
        let start = i * HOP_SIZE;
        let end = (start + FRAME_SIZE).min(samples.len());
        let slice = &samples[start..end];

        // Widen to f64 and right-pad the final short frame
        for (dst, &src) in frame.iter_mut().zip(slice.iter()) {
            *dst = src as f64;
        }
        for dst in frame.iter_mut().skip(slice.len()) {
            *dst = 0.0;
        }

        accumulator.add(analyzer.analyze(&frame));
    }

    accumulator.into_mean()
}

/// Running sums of per-frame descriptors, reduced to means at the end
struct FeatureAccumulator {
    frames: usize,
    mfcc: Vec<f64>,
    spectral_centroid: f64,
    spectral_rolloff: f64,
    spectral_flatness: f64,
    zcr: f64,
    rms: f64,
    chroma: Vec<f64>,
}

impl FeatureAccumulator {
    fn new() -> Self {
        FeatureAccumulator {
            frames: 0,
            mfcc: Vec::new(),
            spectral_centroid: 0.0,
            spectral_rolloff: 0.0,
            spectral_flatness: 0.0,
            zcr: 0.0,
            rms: 0.0,
            chroma: Vec::new(),
        }
    }

    fn add(&mut self, features: FrameFeatures) {
        if self.frames == 0 {
            self.mfcc = vec![0.0; features.mfcc.len()];
            self.chroma = vec![0.0; features.chroma.len()];
        }
        self.frames += 1;

        for (sum, value) in self.mfcc.iter_mut().zip(features.mfcc.iter()) {
            *sum += value;
        }
        for (sum, value) in self.chroma.iter_mut().zip(features.chroma.iter()) {
            *sum += value;
        }
        self.spectral_centroid += features.spectral_centroid;
        self.spectral_rolloff += features.spectral_rolloff;
        self.spectral_flatness += features.spectral_flatness;
        self.zcr += features.zcr;
        self.rms += features.rms;
    }

    fn into_mean(self) -> FeatureSet {
        if self.frames == 0 {
            return FeatureSet::default();
        }
        let n = self.frames as f64;
        FeatureSet {
            mfcc: self.mfcc.into_iter().map(|sum| sum / n).collect(),
            spectral_centroid: self.spectral_centroid / n,
            spectral_rolloff: self.spectral_rolloff / n,
            spectral_flatness: self.spectral_flatness / n,
            zcr: self.zcr / n,
            rms: self.rms / n,
            chroma: self.chroma.into_iter().map(|sum| sum / n).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::features::{CHROMA_BINS, MFCC_COEFFICIENTS};
    use std::f64::consts::PI;

    fn sine_buffer(freq: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / SAMPLE_RATE as f64).sin() as f32)
            .collect()
    }

    #[test]
    fn test_buffer_shorter_than_frame_is_degenerate() {
        let features = extract(&vec![0.25f32; FRAME_SIZE - 1]);

        assert!(features.mfcc.is_empty());
        assert!(features.chroma.is_empty());
        assert_eq!(features.spectral_centroid, 0.0);
        assert_eq!(features.spectral_rolloff, 0.0);
        assert_eq!(features.spectral_flatness, 0.0);
        assert_eq!(features.zcr, 0.0);
        assert_eq!(features.rms, 0.0);
        assert!(features.is_empty());
    }

    #[test]
    fn test_empty_buffer_is_degenerate() {
        assert_eq!(extract(&[]), FeatureSet::default());
    }

    #[test]
    fn test_exact_frame_buffer_is_single_frame_mean() {
        // One frame: the mean must equal that frame's descriptors unchanged
        let buffer = sine_buffer(1000.0, FRAME_SIZE);
        let features = extract(&buffer);

        let analyzer = FrameAnalyzer::new(SAMPLE_RATE, FRAME_SIZE);
        let frame: Vec<f64> = buffer.iter().map(|&s| s as f64).collect();
        let single = analyzer.analyze(&frame);

        assert_eq!(features.mfcc, single.mfcc);
        assert_eq!(features.chroma, single.chroma);
        assert_eq!(features.spectral_centroid, single.spectral_centroid);
        assert_eq!(features.spectral_rolloff, single.spectral_rolloff);
        assert_eq!(features.zcr, single.zcr);
        assert_eq!(features.rms, single.rms);
    }

    #[test]
    fn test_frame_count_includes_padded_tail() {
        // FRAME_SIZE + HOP_SIZE samples: two frames, second one padded
        let buffer = sine_buffer(880.0, FRAME_SIZE + HOP_SIZE);
        let features = extract(&buffer);

        assert_eq!(features.mfcc.len(), MFCC_COEFFICIENTS);
        assert_eq!(features.chroma.len(), CHROMA_BINS);
        assert!(features.rms > 0.0);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let buffer = sine_buffer(330.0, SAMPLE_RATE as usize / 10);
        assert_eq!(extract(&buffer), extract(&buffer));
    }

    #[test]
    fn test_silence_yields_zero_feature_set() {
        let features = extract(&vec![0.0f32; FRAME_SIZE * 4]);
        assert!(features.is_empty());
        // Schema stays fixed even for silence: vectors keep their dimension
        assert_eq!(features.mfcc.len(), MFCC_COEFFICIENTS);
        assert_eq!(features.chroma.len(), CHROMA_BINS);
    }

    #[test]
    fn test_serde_uses_reference_field_names() {
        let features = FeatureSet {
            mfcc: vec![1.0, 2.0],
            spectral_centroid: 3.0,
            spectral_rolloff: 4.0,
            spectral_flatness: 0.5,
            zcr: 0.1,
            rms: 0.2,
            chroma: vec![0.0; CHROMA_BINS],
        };
        let json = serde_json::to_string(&features).unwrap();
        assert!(json.contains("\"spectralCentroid\":3.0"));
        assert!(json.contains("\"spectralRolloff\":4.0"));
        assert!(json.contains("\"spectralFlatness\":0.5"));
        assert!(json.contains("\"zcr\":0.1"));
        assert!(json.contains("\"rms\":0.2"));

        let back: FeatureSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, features);
    }

    #[test]
    fn test_different_tones_produce_different_features() {
        let a = extract(&sine_buffer(440.0, FRAME_SIZE * 8));
        let b = extract(&sine_buffer(2200.0, FRAME_SIZE * 8));
        assert!(a.spectral_centroid < b.spectral_centroid);
        assert!(a.zcr < b.zcr);
    }
}
