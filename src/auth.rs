/// Enrollment / authentication orchestration
///
/// Two stable states, `Unenrolled` and `Enrolled`, held entirely in the
/// persisted store. Every authentication attempt is independent: the core
/// loads the stored voiceprint, scores the candidate against it, and changes
/// nothing — no lockout, no retry counting.

use thiserror::Error;

use crate::enrollment::{EnrollmentRecord, EnrollmentStore};
use crate::features::FeatureSet;
use crate::similarity::{self, Similarity};

#[derive(Debug, Error)]
pub enum AuthError {
    /// No voiceprint has been enrolled yet — user guidance, not a crash
    #[error("no voiceprint enrolled - enroll first")]
    MissingEnrollment,

    /// The persistence layer failed underneath us
    #[error("enrollment store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Result of one authentication attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthOutcome {
    pub similarity: f64,
    pub percentage: i32,
    pub accepted: bool,
}

impl From<Similarity> for AuthOutcome {
    fn from(similarity: Similarity) -> Self {
        AuthOutcome {
            similarity: similarity.value,
            percentage: similarity.percentage(),
            accepted: similarity.is_match(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnrollmentStatus {
    Unenrolled,
    Enrolled { timestamp: u64 },
}

/// Persist a freshly extracted feature set as the enrolled voiceprint.
/// Overwrites any previous enrollment; the core imposes no quality gate.
pub fn enroll(store: &dyn EnrollmentStore, features: FeatureSet) -> Result<EnrollmentRecord, AuthError> {
    let record = EnrollmentRecord::new(features);
    store.save(&record)?;
    Ok(record)
}

/// Score a candidate feature set against the stored voiceprint
pub fn authenticate(
    store: &dyn EnrollmentStore,
    candidate: &FeatureSet,
) -> Result<AuthOutcome, AuthError> {
    let record = store.load()?.ok_or(AuthError::MissingEnrollment)?;
    let similarity = similarity::score(&record.features, candidate);
    Ok(similarity.into())
}

/// Discard the stored voiceprint unconditionally
pub fn reset(store: &dyn EnrollmentStore) -> Result<(), AuthError> {
    store.clear()?;
    Ok(())
}

pub fn status(store: &dyn EnrollmentStore) -> Result<EnrollmentStatus, AuthError> {
    Ok(match store.load()? {
        Some(record) => EnrollmentStatus::Enrolled {
            timestamp: record.timestamp,
        },
        None => EnrollmentStatus::Unenrolled,
    })
}
