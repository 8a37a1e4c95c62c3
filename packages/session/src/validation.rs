//! Claim validation results and the freshness checks shared by all validators

use crate::{
    claims::Claim,
    error::ClaimResult,
    payload::ClaimEntry,
    types::{ClaimShape, Payload, UserContext},
};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Reason key naming the configured value in a failure reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedKey {
    /// `expectedToInclude`
    ToInclude,
    /// `expectedToNotInclude`
    ToNotInclude,
    /// `expectedValue`
    Value,
}

impl ExpectedKey {
    /// Wire name of the key
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExpectedKey::ToInclude => "expectedToInclude",
            ExpectedKey::ToNotInclude => "expectedToNotInclude",
            ExpectedKey::Value => "expectedValue",
        }
    }
}

/// Why a validator rejected a payload
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidReason {
    /// The claim was never added to the payload
    ValueDoesNotExist {
        /// Key under which the configured value is reported
        expected_key: ExpectedKey,
        /// Configured value, as the validator was built with it
        expected: Value,
    },
    /// The stored value is older than the validator's max age
    Expired {
        /// Age of the stored value in (fractional) seconds
        age_in_seconds: f64,
        /// Configured max age
        max_age_in_seconds: u64,
    },
    /// The stored value is fresh but breaks the rule
    WrongValue {
        /// Key under which the expected value is reported
        expected_key: ExpectedKey,
        /// Expected value(s)
        expected: Value,
        /// Value found in the payload
        actual: Value,
    },
}

impl InvalidReason {
    /// Human readable message, part of the wire format
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            InvalidReason::ValueDoesNotExist { .. } => "value does not exist",
            InvalidReason::Expired { .. } => "expired",
            InvalidReason::WrongValue { .. } => "wrong value",
        }
    }

    /// True when a refetch can turn this failure into a success
    #[must_use]
    pub fn is_recoverable_by_refetch(&self) -> bool {
        !matches!(self, InvalidReason::WrongValue { .. })
    }

    /// Wire representation of the reason
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut reason = Map::new();
        reason.insert("message".to_string(), Value::from(self.message()));
        match self {
            InvalidReason::ValueDoesNotExist {
                expected_key,
                expected,
            } => {
                reason.insert(expected_key.as_str().to_string(), expected.clone());
                reason.insert("actualValue".to_string(), Value::Null);
            }
            InvalidReason::Expired {
                age_in_seconds,
                max_age_in_seconds,
            } => {
                reason.insert("ageInSeconds".to_string(), Value::from(*age_in_seconds));
                reason.insert("maxAgeInSeconds".to_string(), Value::from(*max_age_in_seconds));
            }
            InvalidReason::WrongValue {
                expected_key,
                expected,
                actual,
            } => {
                reason.insert(expected_key.as_str().to_string(), expected.clone());
                reason.insert("actualValue".to_string(), actual.clone());
            }
        }
        Value::Object(reason)
    }
}

impl Serialize for InvalidReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Outcome of running one validator
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimValidationResult {
    /// The payload satisfies the validator
    Valid,
    /// The payload does not satisfy the validator
    Invalid(InvalidReason),
}

impl ClaimValidationResult {
    /// True for [`ClaimValidationResult::Valid`]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, ClaimValidationResult::Valid)
    }

    /// Failure reason, if any
    #[must_use]
    pub fn reason(&self) -> Option<&InvalidReason> {
        match self {
            ClaimValidationResult::Valid => None,
            ClaimValidationResult::Invalid(reason) => Some(reason),
        }
    }
}

impl Serialize for ClaimValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut result = Map::new();
        result.insert("isValid".to_string(), Value::Bool(self.is_valid()));
        if let ClaimValidationResult::Invalid(reason) = self {
            result.insert("reason".to_string(), reason.to_json());
        }
        Value::Object(result).serialize(serializer)
    }
}

/// A failing validator, as reported to middleware
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimValidationFailure {
    /// Validator id
    pub id: String,
    /// Why it failed
    pub reason: InvalidReason,
}

/// Refetch rule shared by every validator
///
/// A claim must be refetched when it has no value, when its value has no
/// fetch time, or when a max age is set and the value is strictly older
/// than it.
pub(crate) fn should_refetch_value<V: ClaimShape>(
    claim: &Claim<V>,
    payload: &Payload,
    user_context: &UserContext,
    max_age_in_sec: Option<u64>,
    now_ms: i64,
) -> bool {
    if claim.get_value_from_payload(payload, user_context).is_none() {
        return true;
    }

    // value without timestamp: a refetch rewrites the whole entry
    let Some(fetched_at) = claim.get_last_refetch_time(payload, user_context) else {
        return true;
    };

    max_age_in_sec.is_some_and(|max_age| now_ms.saturating_sub(fetched_at) > max_age_ms(max_age))
}

/// Read the claim value and apply the missing/expired steps of validation
///
/// `Ok(Ok(value))` when the value exists and is fresh, `Ok(Err(reason))` for
/// a missing or expired value.
///
/// # Errors
/// Returns [`ClaimError::CorruptedPayload`](crate::ClaimError::CorruptedPayload)
/// when the entry is not a complete `{v, t}` pair.
pub(crate) fn fresh_value<V: ClaimShape>(
    claim: &Claim<V>,
    payload: &Payload,
    max_age_in_sec: Option<u64>,
    now_ms: i64,
    expected_key: ExpectedKey,
    configured: impl FnOnce() -> Value,
) -> ClaimResult<Result<V, InvalidReason>> {
    let Some(entry) = ClaimEntry::<V>::read(payload, claim.key())? else {
        return Ok(Err(InvalidReason::ValueDoesNotExist {
            expected_key,
            expected: configured(),
        }));
    };

    let age_in_seconds = now_ms.saturating_sub(entry.fetched_at_ms) as f64 / 1000.0;
    if let Some(max_age) = max_age_in_sec {
        if age_in_seconds > max_age as f64 {
            return Ok(Err(InvalidReason::Expired {
                age_in_seconds,
                max_age_in_seconds: max_age,
            }));
        }
    }

    Ok(Ok(entry.value))
}

#[inline]
fn max_age_ms(max_age_in_sec: u64) -> i64 {
    i64::try_from(max_age_in_sec.saturating_mul(1000)).unwrap_or(i64::MAX)
}
