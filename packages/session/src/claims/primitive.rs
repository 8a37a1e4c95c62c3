//! Scalar claims and the `has_value` validator

use super::base::Claim;
use crate::{
    error::ClaimResult,
    traits::{SessionClaim, SessionClaimValidator},
    types::{Payload, Primitive, UserContext},
    validation::{
        fresh_value, should_refetch_value, ClaimValidationResult, ExpectedKey, InvalidReason,
    },
};
use std::sync::Arc;

/// Claim holding a single JSON primitive
pub type PrimitiveClaim = Claim<Primitive>;

impl Claim<Primitive> {
    /// Validator factory bound to this claim
    #[must_use]
    pub fn validators(self: &Arc<Self>) -> PrimitiveClaimValidators {
        PrimitiveClaimValidators {
            claim: Arc::clone(self),
            default_max_age_in_sec: self.default_max_age_in_sec(),
        }
    }
}

/// Equality validator over a [`PrimitiveClaim`]
#[derive(Debug, Clone)]
pub struct HasValueValidator {
    id: String,
    claim: Arc<PrimitiveClaim>,
    expected: Primitive,
    max_age_in_sec: Option<u64>,
}

impl HasValueValidator {
    /// Replace the validator id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Accept values of any age
    #[must_use]
    pub fn without_max_age(mut self) -> Self {
        self.max_age_in_sec = None;
        self
    }

    /// Value the claim must hold
    #[must_use]
    pub fn expected(&self) -> &Primitive {
        &self.expected
    }
}

impl SessionClaimValidator for HasValueValidator {
    fn id(&self) -> &str {
        &self.id
    }

    fn claim(&self) -> &dyn SessionClaim {
        &*self.claim
    }

    fn max_age_in_sec(&self) -> Option<u64> {
        self.max_age_in_sec
    }

    fn should_refetch_at(&self, payload: &Payload, user_context: &UserContext, now_ms: i64) -> bool {
        should_refetch_value(&*self.claim, payload, user_context, self.max_age_in_sec, now_ms)
    }

    fn validate_at(
        &self,
        payload: &Payload,
        _user_context: &UserContext,
        now_ms: i64,
    ) -> ClaimResult<ClaimValidationResult> {
        let claim_val = match fresh_value(
            &*self.claim,
            payload,
            self.max_age_in_sec,
            now_ms,
            ExpectedKey::Value,
            || self.expected.to_json(),
        )? {
            Ok(value) => value,
            Err(reason) => return Ok(ClaimValidationResult::Invalid(reason)),
        };

        if claim_val != self.expected {
            return Ok(ClaimValidationResult::Invalid(InvalidReason::WrongValue {
                expected_key: ExpectedKey::Value,
                expected: self.expected.to_json(),
                actual: claim_val.to_json(),
            }));
        }

        Ok(ClaimValidationResult::Valid)
    }
}

/// Named constructors for [`HasValueValidator`]s bound to one claim
#[derive(Debug, Clone)]
pub struct PrimitiveClaimValidators {
    claim: Arc<PrimitiveClaim>,
    default_max_age_in_sec: u64,
}

impl PrimitiveClaimValidators {
    /// The claim must hold exactly `value`
    #[must_use]
    pub fn has_value(
        &self,
        value: impl Into<Primitive>,
        id: Option<&str>,
        max_age_in_seconds: Option<u64>,
    ) -> HasValueValidator {
        HasValueValidator {
            id: id.map_or_else(|| self.claim.key().to_string(), str::to_string),
            claim: Arc::clone(&self.claim),
            expected: value.into(),
            max_age_in_sec: Some(max_age_in_seconds.unwrap_or(self.default_max_age_in_sec)),
        }
    }
}
