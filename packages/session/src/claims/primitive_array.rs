//! Array-of-primitives claims and their include/exclude validators

use super::base::Claim;
use crate::{
    error::ClaimResult,
    traits::{SessionClaim, SessionClaimValidator},
    types::{Payload, Primitive, UserContext},
    validation::{
        fresh_value, should_refetch_value, ClaimValidationResult, ExpectedKey, InvalidReason,
    },
};
use serde_json::Value;
use std::{collections::HashSet, sync::Arc};

/// Claim holding an ordered sequence of JSON primitives
pub type PrimitiveArrayClaim = Claim<Vec<Primitive>>;

impl Claim<Vec<Primitive>> {
    /// Validator factory bound to this claim
    #[must_use]
    pub fn validators(self: &Arc<Self>) -> PrimitiveArrayClaimValidators {
        PrimitiveArrayClaimValidators {
            claim: Arc::clone(self),
            default_max_age_in_sec: self.default_max_age_in_sec(),
        }
    }
}

/// Rule applied by a [`PrimitiveArrayValidator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayValidatorMode {
    /// The claim must contain one value
    Includes,
    /// The claim must not contain one value
    Excludes,
    /// The claim must contain every value
    IncludesAll,
    /// The claim must contain none of the values
    ExcludesAll,
}

impl ArrayValidatorMode {
    /// Include rules (`Includes`, `IncludesAll`)
    #[must_use]
    pub fn is_include(self) -> bool {
        matches!(self, ArrayValidatorMode::Includes | ArrayValidatorMode::IncludesAll)
    }

    /// Rules configured with a sequence (`IncludesAll`, `ExcludesAll`)
    #[must_use]
    pub fn is_all(self) -> bool {
        matches!(self, ArrayValidatorMode::IncludesAll | ArrayValidatorMode::ExcludesAll)
    }

    /// Reason key for this rule
    #[must_use]
    pub fn expected_key(self) -> ExpectedKey {
        if self.is_include() {
            ExpectedKey::ToInclude
        } else {
            ExpectedKey::ToNotInclude
        }
    }
}

/// Value(s) a validator was configured with
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedValues {
    /// Single value (`includes`, `excludes`)
    One(Primitive),
    /// Sequence (`includes_all`, `excludes_all`)
    All(Vec<Primitive>),
}

impl ExpectedValues {
    /// The configured value(s) as a sequence
    #[must_use]
    pub fn normalized(&self) -> Vec<Primitive> {
        match self {
            ExpectedValues::One(value) => vec![value.clone()],
            ExpectedValues::All(values) => values.clone(),
        }
    }

    /// JSON form exactly as configured: scalar or array
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            ExpectedValues::One(value) => value.to_json(),
            ExpectedValues::All(values) => {
                Value::Array(values.iter().map(Primitive::to_json).collect())
            }
        }
    }
}

/// Include/exclude validator over a [`PrimitiveArrayClaim`]
///
/// One type covers the four rules; the mode selects the membership test and
/// the reason key, everything else is shared.
#[derive(Debug, Clone)]
pub struct PrimitiveArrayValidator {
    id: String,
    claim: Arc<PrimitiveArrayClaim>,
    mode: ArrayValidatorMode,
    expected: ExpectedValues,
    max_age_in_sec: Option<u64>,
}

impl PrimitiveArrayValidator {
    pub(crate) fn new(
        id: String,
        claim: Arc<PrimitiveArrayClaim>,
        mode: ArrayValidatorMode,
        expected: ExpectedValues,
        max_age_in_sec: Option<u64>,
    ) -> Self {
        Self {
            id,
            claim,
            mode,
            expected,
            max_age_in_sec,
        }
    }

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

    /// Rule of this validator
    #[must_use]
    pub fn mode(&self) -> ArrayValidatorMode {
        self.mode
    }

    /// Configured value(s)
    #[must_use]
    pub fn expected(&self) -> &ExpectedValues {
        &self.expected
    }
}

impl SessionClaimValidator for PrimitiveArrayValidator {
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
        let expected_key = self.mode.expected_key();
        let claim_val = match fresh_value(
            &*self.claim,
            payload,
            self.max_age_in_sec,
            now_ms,
            expected_key,
            || self.expected.to_json(),
        )? {
            Ok(value) => value,
            Err(reason) => return Ok(ClaimValidationResult::Invalid(reason)),
        };

        let vals = self.expected.normalized();
        let claim_val_set: HashSet<&Primitive> = claim_val.iter().collect();
        let include = self.mode.is_include();

        // first offending element decides; mismatches are not aggregated
        let failed = vals.iter().any(|v| claim_val_set.contains(v) != include);
        if failed {
            return Ok(ClaimValidationResult::Invalid(InvalidReason::WrongValue {
                expected_key,
                expected: Value::Array(vals.iter().map(Primitive::to_json).collect()),
                actual: Value::Array(claim_val.iter().map(Primitive::to_json).collect()),
            }));
        }

        Ok(ClaimValidationResult::Valid)
    }
}

/// Named constructors for [`PrimitiveArrayValidator`]s bound to one claim
///
/// Ids default to the claim key and max ages to the factory default. Id
/// collisions between validators are not checked.
#[derive(Debug, Clone)]
pub struct PrimitiveArrayClaimValidators {
    claim: Arc<PrimitiveArrayClaim>,
    default_max_age_in_sec: u64,
}

impl PrimitiveArrayClaimValidators {
    /// Factory with an explicit default max age
    #[must_use]
    pub fn new(claim: Arc<PrimitiveArrayClaim>, default_max_age_in_sec: u64) -> Self {
        Self {
            claim,
            default_max_age_in_sec,
        }
    }

    /// Max age given to validators that do not set one
    #[must_use]
    pub fn default_max_age_in_sec(&self) -> u64 {
        self.default_max_age_in_sec
    }

    /// The claim must contain `value`
    #[must_use]
    pub fn includes(
        &self,
        value: impl Into<Primitive>,
        id: Option<&str>,
        max_age_in_seconds: Option<u64>,
    ) -> PrimitiveArrayValidator {
        self.build(
            ArrayValidatorMode::Includes,
            ExpectedValues::One(value.into()),
            id,
            max_age_in_seconds,
        )
    }

    /// The claim must not contain `value`
    #[must_use]
    pub fn excludes(
        &self,
        value: impl Into<Primitive>,
        id: Option<&str>,
        max_age_in_seconds: Option<u64>,
    ) -> PrimitiveArrayValidator {
        self.build(
            ArrayValidatorMode::Excludes,
            ExpectedValues::One(value.into()),
            id,
            max_age_in_seconds,
        )
    }

    /// The claim must contain every element of `values`
    #[must_use]
    pub fn includes_all<I, P>(
        &self,
        values: I,
        id: Option<&str>,
        max_age_in_seconds: Option<u64>,
    ) -> PrimitiveArrayValidator
    where
        I: IntoIterator<Item = P>,
        P: Into<Primitive>,
    {
        self.build(
            ArrayValidatorMode::IncludesAll,
            ExpectedValues::All(values.into_iter().map(Into::into).collect()),
            id,
            max_age_in_seconds,
        )
    }

    /// The claim must contain no element of `values`
    #[must_use]
    pub fn excludes_all<I, P>(
        &self,
        values: I,
        id: Option<&str>,
        max_age_in_seconds: Option<u64>,
    ) -> PrimitiveArrayValidator
    where
        I: IntoIterator<Item = P>,
        P: Into<Primitive>,
    {
        self.build(
            ArrayValidatorMode::ExcludesAll,
            ExpectedValues::All(values.into_iter().map(Into::into).collect()),
            id,
            max_age_in_seconds,
        )
    }

    fn build(
        &self,
        mode: ArrayValidatorMode,
        expected: ExpectedValues,
        id: Option<&str>,
        max_age_in_seconds: Option<u64>,
    ) -> PrimitiveArrayValidator {
        PrimitiveArrayValidator::new(
            id.map_or_else(|| self.claim.key().to_string(), str::to_string),
            Arc::clone(&self.claim),
            mode,
            expected,
            Some(max_age_in_seconds.unwrap_or(self.default_max_age_in_sec)),
        )
    }
}
