//! Middleware response for rejected sessions

use crate::{error::ClaimError, validation::ClaimValidationFailure};
use serde::Serialize;
use serde_json::{json, Value};

/// Status sent when at least one claim validator failed
pub const INVALID_CLAIMS_STATUS_CODE: u16 = 403;

/// Status sent for errors that are not a claim rejection
pub const INTERNAL_ERROR_STATUS_CODE: u16 = 500;

/// Status and JSON body a framework adapter should send
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidClaimsResponse {
    /// HTTP status code
    pub status: u16,
    /// JSON body
    pub body: Value,
}

impl InvalidClaimsResponse {
    /// `403` with every failing validator and its reason
    #[must_use]
    pub fn from_failures(failures: &[ClaimValidationFailure]) -> Self {
        Self {
            status: INVALID_CLAIMS_STATUS_CODE,
            body: json!({
                "message": "invalid claim",
                "claimValidationErrors": failures,
            }),
        }
    }

    /// Map any pipeline error to a response
    ///
    /// Only claim rejections are described to the client; everything else,
    /// corrupted payloads included, becomes an opaque internal error.
    #[must_use]
    pub fn from_error(error: &ClaimError) -> Self {
        match error {
            ClaimError::InvalidClaims(failures) => Self::from_failures(failures),
            other => {
                if other.is_contract_violation() {
                    tracing::error!(error = %other, "claim contract violated");
                } else {
                    tracing::warn!(error = %other, "claim validation could not complete");
                }
                Self {
                    status: INTERNAL_ERROR_STATUS_CODE,
                    body: json!({ "message": "internal error" }),
                }
            }
        }
    }
}

impl From<&ClaimError> for InvalidClaimsResponse {
    fn from(error: &ClaimError) -> Self {
        Self::from_error(error)
    }
}
