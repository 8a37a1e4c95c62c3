//! Session claim error types

use crate::validation::ClaimValidationFailure;
use sessionclaims_common::Error as CommonError;
use thiserror::Error;

/// Session claim operation result type
pub type ClaimResult<T> = Result<T, ClaimError>;

/// Errors raised by claim, validator and pipeline operations
///
/// A failed validation is not an error: validators return
/// [`ClaimValidationResult`](crate::validation::ClaimValidationResult) values.
/// `InvalidClaims` only appears once a caller asks for the failures to be
/// asserted.
#[derive(Debug, Clone, Error)]
pub enum ClaimError {
    /// The value source of a claim failed
    #[error("Fetching claim '{key}' failed: {source}")]
    Fetch {
        /// Key of the claim whose fetcher failed
        key: String,
        /// Error reported by the fetcher
        #[source]
        source: CommonError,
    },

    /// A payload entry exists but does not hold a well formed `{v, t}` pair
    #[error("Corrupted payload entry for claim '{key}': {detail}")]
    CorruptedPayload {
        /// Key of the corrupted entry
        key: String,
        /// What is wrong with the entry
        detail: String,
    },

    /// One or more validators rejected the session
    #[error("Claim validation failed for {} validator(s)", .0.len())]
    InvalidClaims(Vec<ClaimValidationFailure>),

    /// Invalid claim configuration
    #[error("Invalid claims configuration: {0}")]
    Configuration(String),

    /// The session collaborator could not persist a payload update
    #[error("Persisting access token payload failed: {0}")]
    Persistence(#[source] CommonError),
}

impl ClaimError {
    /// Create a fetch error for the given claim key
    #[inline]
    #[must_use]
    pub fn fetch(key: &str, source: CommonError) -> Self {
        ClaimError::Fetch {
            key: key.to_string(),
            source,
        }
    }

    /// Create a corrupted payload error
    #[inline]
    #[must_use]
    pub fn corrupted_payload(key: &str, detail: &str) -> Self {
        ClaimError::CorruptedPayload {
            key: key.to_string(),
            detail: detail.to_string(),
        }
    }

    /// Create a configuration error
    #[inline]
    #[must_use]
    pub fn configuration(msg: &str) -> Self {
        ClaimError::Configuration(msg.to_string())
    }

    /// True for errors caused by a broken internal contract rather than by a
    /// collaborator or by the claims themselves
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, ClaimError::CorruptedPayload { .. })
    }
}
