//! Validator pipeline: refetch stale claims, then validate in order
//!
//! The pipeline works on a per-request copy of the payload. Refetched
//! entries are merged into that copy and recorded as a merge patch that the
//! caller (or [`assert_claims`]) hands to the session core for persistence.

use crate::{
    config::ClaimsConfig,
    error::{ClaimError, ClaimResult},
    traits::{SessionClaimValidator, SessionHandle},
    types::{Payload, UserContext},
    validation::{ClaimValidationFailure, ClaimValidationResult},
};
use sessionclaims_common::LoggingTransformer;
use std::{collections::HashMap, sync::Arc};

/// Aggregated outcome of a pipeline run
#[derive(Debug, Clone, Default)]
pub struct ClaimValidationReport {
    /// Result per validator id; with duplicate ids the later validator wins
    pub results: HashMap<String, ClaimValidationResult>,
    /// Every failing validator, in pipeline order
    pub invalid_claims: Vec<ClaimValidationFailure>,
    /// Payload after refetches, as seen by the validators
    pub payload: Payload,
    /// Merge patch of refetched entries, `None` when nothing was refetched
    pub payload_update: Option<Payload>,
}

impl ClaimValidationReport {
    /// True when no validator failed
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.invalid_claims.is_empty()
    }

    /// Turn failures into [`ClaimError::InvalidClaims`]
    ///
    /// # Errors
    /// Returns [`ClaimError::InvalidClaims`] when at least one validator failed.
    pub fn into_result(self) -> ClaimResult<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(ClaimError::InvalidClaims(self.invalid_claims))
        }
    }

    fn record(&mut self, validator: &dyn SessionClaimValidator, result: ClaimValidationResult) {
        LoggingTransformer::log_claim_validation(
            validator.id(),
            validator.claim().key(),
            result.is_valid(),
        );
        if let ClaimValidationResult::Invalid(reason) = &result {
            self.invalid_claims.push(ClaimValidationFailure {
                id: validator.id().to_string(),
                reason: reason.clone(),
            });
        }
        self.results.insert(validator.id().to_string(), result);
    }
}

/// Run `validators` over `payload`, refetching claims that ask for it
///
/// For each validator in order: if it reports a missing or stale claim (and
/// `config.refetch_stale_claims` is set) the claim is rebuilt for `user_id`
/// and merged into the working payload; then the validator judges the
/// working payload. A fetcher returning no value leaves the payload as is.
///
/// # Errors
/// Returns [`ClaimError::Fetch`] when a value source fails and
/// [`ClaimError::CorruptedPayload`] for malformed entries. Failed rules are
/// reported in the returned report, never as errors.
pub async fn validate_claims(
    user_id: &str,
    payload: Payload,
    validators: &[Arc<dyn SessionClaimValidator>],
    user_context: &UserContext,
    config: &ClaimsConfig,
) -> ClaimResult<ClaimValidationReport> {
    let mut report = ClaimValidationReport {
        payload,
        ..ClaimValidationReport::default()
    };
    let mut update = Payload::new();

    for validator in validators {
        if config.refetch_stale_claims && validator.should_refetch(&report.payload, user_context) {
            tracing::debug!(
                validator = validator.id(),
                claim = validator.claim().key(),
                "refetching claim before validation"
            );
            let fragment = validator.claim().build(user_id, user_context).await?;
            for (key, value) in fragment {
                update.insert(key.clone(), value.clone());
                report.payload.insert(key, value);
            }
        }

        let result = validator
            .validate(&report.payload, user_context)
            .inspect_err(|e| log_violation(validator.as_ref(), e))?;
        report.record(validator.as_ref(), result);
    }

    if !update.is_empty() {
        LoggingTransformer::log_payload_update("claim refetch", update.len());
        report.payload_update = Some(update);
    }

    Ok(report)
}

/// Validate without refetching, e.g. for payloads from a verified token
///
/// # Errors
/// Returns [`ClaimError::CorruptedPayload`] for malformed entries.
pub fn validate_claims_in_payload(
    payload: &Payload,
    validators: &[Arc<dyn SessionClaimValidator>],
    user_context: &UserContext,
) -> ClaimResult<ClaimValidationReport> {
    let mut report = ClaimValidationReport {
        payload: payload.clone(),
        ..ClaimValidationReport::default()
    };

    for validator in validators {
        let result = validator
            .validate(payload, user_context)
            .inspect_err(|e| log_violation(validator.as_ref(), e))?;
        report.record(validator.as_ref(), result);
    }

    Ok(report)
}

/// Validate a live session and persist refetched claims through its handle
///
/// The payload update is persisted before failures are reported, so a
/// refetch is never lost because another validator rejected the session.
///
/// # Errors
/// Returns [`ClaimError::InvalidClaims`] listing every failing validator,
/// [`ClaimError::Persistence`] when the session core rejects the update, or
/// any error of [`validate_claims`].
pub async fn assert_claims<S>(
    session: &S,
    validators: &[Arc<dyn SessionClaimValidator>],
    user_context: &UserContext,
    config: &ClaimsConfig,
) -> ClaimResult<Payload>
where
    S: SessionHandle + ?Sized,
{
    let mut report = validate_claims(
        session.user_id(),
        session.access_token_payload(),
        validators,
        user_context,
        config,
    )
    .await?;

    if let Some(update) = report.payload_update.take() {
        session
            .merge_into_access_token_payload(update, user_context)
            .await
            .map_err(|e| ClaimError::Persistence(sessionclaims_common::on_error(e)))?;
    }

    report.into_result().map(|report| report.payload)
}

fn log_violation(validator: &dyn SessionClaimValidator, error: &ClaimError) {
    if let ClaimError::CorruptedPayload { key, detail } = error {
        LoggingTransformer::log_contract_violation(key, detail);
    } else {
        tracing::warn!(validator = validator.id(), error = %error, "claim validation aborted");
    }
}
