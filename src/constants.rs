/// Application-wide constants for audio analysis, similarity scoring, and pattern lock

pub mod audio {
    /// Sample rate every buffer is analyzed at (capture and decoding resample to this)
    pub const SAMPLE_RATE: u32 = 44_100;

    /// Analysis frame length in samples
    pub const FRAME_SIZE: usize = 512;

    /// Hop between consecutive frame starts
    /// hop < frame means frames overlap, which smooths the per-frame descriptors
    pub const HOP_SIZE: usize = 256;
}

pub mod features {
    /// Number of mel-frequency cepstral coefficients kept per frame
    pub const MFCC_COEFFICIENTS: usize = 13;

    /// Number of triangular mel filterbank bands feeding the MFCC transform
    pub const MEL_BANDS: usize = 26;

    /// Number of pitch classes in the chroma vector
    pub const CHROMA_BINS: usize = 12;

    /// Fraction of cumulative spectral energy defining the roll-off point
    pub const ROLLOFF_FRACTION: f64 = 0.85;
}

pub mod auth {
    /// Cosine similarity required for a voiceprint match
    /// Fixed policy constant, compared as `similarity >= SIMILARITY_THRESHOLD`
    pub const SIMILARITY_THRESHOLD: f64 = 0.85;
}

pub mod pattern {
    /// Minimum number of dots a pattern must connect
    pub const MIN_PATTERN_LENGTH: usize = 4;

    /// Dots on the 3x3 pattern grid, indexed 0..9 row-major
    pub const GRID_DOTS: usize = 9;
}
