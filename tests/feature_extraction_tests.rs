// Feature extractor behavior on synthetic buffers: degenerate input,
// framing arithmetic, averaging invariants, and scoring properties of
// extracted feature sets.

use voiceguard::constants::audio::{FRAME_SIZE, HOP_SIZE, SAMPLE_RATE};
use voiceguard::constants::auth::SIMILARITY_THRESHOLD;
use voiceguard::constants::features::{CHROMA_BINS, MFCC_COEFFICIENTS};
use voiceguard::features::{self, FeatureSet};
use voiceguard::similarity::{self, Similarity};

fn tone_buffer(freq: f64, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            (2.0 * std::f64::consts::PI * freq * i as f64 / SAMPLE_RATE as f64).sin() as f32 * 0.5
        })
        .collect()
}

#[test]
fn test_short_buffer_yields_empty_feature_set() {
    for len in [0, 1, FRAME_SIZE / 2, FRAME_SIZE - 1] {
        let featureset = features::extract(&tone_buffer(440.0, len));
        assert!(featureset.mfcc.is_empty(), "len {}", len);
        assert!(featureset.chroma.is_empty(), "len {}", len);
        assert_eq!(featureset.spectral_centroid, 0.0);
        assert_eq!(featureset.spectral_rolloff, 0.0);
        assert_eq!(featureset.spectral_flatness, 0.0);
        assert_eq!(featureset.zcr, 0.0);
        assert_eq!(featureset.rms, 0.0);
    }
}

#[test]
fn test_exact_frame_size_buffer_produces_full_dimensions() {
    let featureset = features::extract(&tone_buffer(440.0, FRAME_SIZE));
    assert_eq!(featureset.mfcc.len(), MFCC_COEFFICIENTS);
    assert_eq!(featureset.chroma.len(), CHROMA_BINS);
    assert!(featureset.rms > 0.0);
    assert!(featureset.spectral_centroid > 0.0);
}

#[test]
fn test_repeated_identical_frames_average_to_the_frame() {
    // A buffer whose every frame sees the same samples: the mean over frames
    // must equal the single-frame feature set. The signal is periodic with
    // exactly one period per hop, and DC-offset above zero so that float
    // jitter near zero crossings cannot perturb the ZCR between frames.
    let offset_tone = |len: usize| -> Vec<f32> {
        let freq = SAMPLE_RATE as f64 / HOP_SIZE as f64;
        (0..len)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * freq * i as f64 / SAMPLE_RATE as f64;
                (0.4 * phase.sin() + 0.5) as f32
            })
            .collect()
    };
    let one_frame = features::extract(&offset_tone(FRAME_SIZE));
    let many_frames = features::extract(&offset_tone(FRAME_SIZE + 7 * HOP_SIZE));

    for (a, b) in one_frame.mfcc.iter().zip(many_frames.mfcc.iter()) {
        assert!((a - b).abs() < 1e-6, "mfcc {} vs {}", a, b);
    }
    assert!((one_frame.rms - many_frames.rms).abs() < 1e-9);
    assert!((one_frame.zcr - many_frames.zcr).abs() < 1e-9);
    assert!((one_frame.spectral_centroid - many_frames.spectral_centroid).abs() < 1e-6);
}

#[test]
fn test_extracted_features_score_one_against_themselves() {
    let featureset = features::extract(&tone_buffer(523.25, SAMPLE_RATE as usize / 4));
    let score = similarity::score(&featureset, &featureset);
    assert!((score.value - 1.0).abs() < 1e-12);
    assert!(score.is_match());
}

#[test]
fn test_score_symmetry_on_extracted_features() {
    let a = features::extract(&tone_buffer(440.0, FRAME_SIZE * 6));
    let b = features::extract(&tone_buffer(880.0, FRAME_SIZE * 9));
    assert_eq!(similarity::score(&a, &b), similarity::score(&b, &a));
}

#[test]
fn test_threshold_boundary_decision() {
    assert!(Similarity { value: SIMILARITY_THRESHOLD }.is_match());
    assert!(!Similarity { value: 0.8499999 }.is_match());
    assert_eq!(Similarity { value: 0.8499999 }.percentage(), 85);
}

#[test]
fn test_flattened_dimension_matches_schema() {
    let featureset = features::extract(&tone_buffer(440.0, FRAME_SIZE * 4));
    let flat = similarity::flatten(&featureset);
    assert_eq!(flat.len(), MFCC_COEFFICIENTS + 5 + CHROMA_BINS);

    // Degenerate sets flatten to just the five zero scalars
    let empty_flat = similarity::flatten(&FeatureSet::default());
    assert_eq!(empty_flat, vec![0.0; 5]);
}

#[test]
fn test_degenerate_vs_full_sets_are_length_reconciled() {
    // Comparing a degenerate (5-element) vector with a full (30-element) one
    // exercises the zero-padding rule instead of erroring
    let full = features::extract(&tone_buffer(440.0, FRAME_SIZE * 4));
    let empty = FeatureSet::default();
    let score = similarity::score(&full, &empty);
    assert_eq!(score.value, 0.0);
    assert!(!score.is_match());
}

#[test]
fn test_louder_signal_raises_rms_only() {
    let quiet = features::extract(&tone_buffer(440.0, FRAME_SIZE * 4));
    let loud: Vec<f32> = tone_buffer(440.0, FRAME_SIZE * 4)
        .iter()
        .map(|&s| (s * 1.8).clamp(-1.0, 1.0))
        .collect();
    let loud = features::extract(&loud);

    assert!(loud.rms > quiet.rms);
    // ZCR is amplitude-invariant for a clean scaled tone
    assert!((loud.zcr - quiet.zcr).abs() < 1e-9);
}
