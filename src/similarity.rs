/// Similarity scoring between an enrolled and a candidate feature set
///
/// Both sets are flattened into ordered vectors in a fixed field order, a
/// length mismatch is reconciled by zero-padding the shorter vector, and the
/// score is the cosine of the angle between them. Two caveats are deliberate:
/// with differently-sized descriptor sets the padded value understates true
/// cosine similarity, and the score is not clamped, so negative MFCC
/// coefficients can push it outside [0, 1].

use crate::constants::auth::SIMILARITY_THRESHOLD;
use crate::features::FeatureSet;

/// Outcome of comparing two feature sets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    /// Raw cosine similarity; 0 when either vector has zero norm. Not clamped.
    pub value: f64,
}

impl Similarity {
    /// Accept/reject decision against the fixed 0.85 policy threshold
    pub fn is_match(&self) -> bool {
        self.value >= SIMILARITY_THRESHOLD
    }

    /// Rounded percentage for display
    pub fn percentage(&self) -> i32 {
        (self.value * 100.0).round() as i32
    }
}

/// Concatenate all feature components into one ordered vector:
/// mfcc, then the five scalars, then chroma. The order is load-bearing —
/// enrolled and candidate vectors must flatten identically.
pub fn flatten(features: &FeatureSet) -> Vec<f64> {
    let mut vector = Vec::with_capacity(features.mfcc.len() + 5 + features.chroma.len());
    vector.extend_from_slice(&features.mfcc);
    vector.push(features.spectral_centroid);
    vector.push(features.spectral_rolloff);
    vector.push(features.spectral_flatness);
    vector.push(features.zcr);
    vector.push(features.rms);
    vector.extend_from_slice(&features.chroma);
    vector
}

/// Cosine similarity between two feature sets.
///
/// Vectors of unequal length are zero-padded to the longer length (local
/// copies only). A zero-norm side yields similarity 0: an all-zero feature
/// set, e.g. from silence, never matches anything, including itself.
pub fn score(enrolled: &FeatureSet, candidate: &FeatureSet) -> Similarity {
    let mut v1 = flatten(enrolled);
    let mut v2 = flatten(candidate);

    let max_len = v1.len().max(v2.len());
    v1.resize(max_len, 0.0);
    v2.resize(max_len, 0.0);

    Similarity {
        value: cosine(&v1, &v2),
    }
}

fn cosine(v1: &[f64], v2: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm1 = 0.0;
    let mut norm2 = 0.0;

    for (a, b) in v1.iter().zip(v2.iter()) {
        dot += a * b;
        norm1 += a * a;
        norm2 += b * b;
    }

    if norm1 == 0.0 || norm2 == 0.0 {
        return 0.0;
    }

    dot / (norm1.sqrt() * norm2.sqrt())
}
