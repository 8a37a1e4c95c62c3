//! Boolean claims

use super::{
    base::Claim,
    primitive::{HasValueValidator, PrimitiveClaim, PrimitiveClaimValidators},
};
use crate::{
    config::ClaimsConfig,
    error::ClaimResult,
    traits::SessionClaim,
    types::{Payload, Primitive, UserContext},
};
use futures::FutureExt;
use sessionclaims_common::Result as CommonResult;
use std::{future::Future, sync::Arc};

/// A [`PrimitiveClaim`] whose value source only ever yields booleans
#[derive(Debug, Clone)]
pub struct BooleanClaim {
    inner: Arc<PrimitiveClaim>,
}

impl BooleanClaim {
    /// Create a boolean claim with an asynchronous value source
    pub fn new<F, Fut>(key: impl Into<String>, fetch: F) -> Self
    where
        F: Fn(String, UserContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommonResult<Option<bool>>> + Send + 'static,
    {
        Self::from_claim(Claim::new(key, move |user_id, user_context| {
            fetch(user_id, user_context).map(|value| value.map(|v| v.map(Primitive::Bool)))
        }))
    }

    /// Create a boolean claim whose value source never suspends
    pub fn new_sync<F>(key: impl Into<String>, fetch: F) -> Self
    where
        F: Fn(&str, &UserContext) -> CommonResult<Option<bool>> + Send + Sync + 'static,
    {
        Self::from_claim(Claim::new_sync(key, move |user_id, user_context| {
            fetch(user_id, user_context).map(|value| value.map(Primitive::Bool))
        }))
    }

    fn from_claim(claim: PrimitiveClaim) -> Self {
        Self {
            inner: Arc::new(claim),
        }
    }

    /// Set the max age applied by validators built without an explicit one
    #[must_use]
    pub fn with_default_max_age(self, default_max_age_in_sec: u64) -> Self {
        let claim = (*self.inner).clone().with_default_max_age(default_max_age_in_sec);
        Self::from_claim(claim)
    }

    /// Take the default max age from a configuration
    #[must_use]
    pub fn with_config(self, config: &ClaimsConfig) -> Self {
        self.with_default_max_age(config.default_max_age_in_sec)
    }

    /// Underlying primitive claim, e.g. for registration with a session hook
    #[must_use]
    pub fn claim(&self) -> &Arc<PrimitiveClaim> {
        &self.inner
    }

    /// Payload key of this claim
    #[must_use]
    pub fn key(&self) -> &str {
        self.inner.key()
    }

    /// Store a boolean under the claim key, stamped with the current time
    #[must_use]
    pub fn add_to_payload(&self, payload: Payload, value: bool, user_context: &UserContext) -> Payload {
        self.inner
            .add_to_payload(payload, Primitive::Bool(value), user_context)
    }

    /// Stored boolean, `None` when absent or not a boolean
    #[must_use]
    pub fn get_value_from_payload(&self, payload: &Payload, user_context: &UserContext) -> Option<bool> {
        self.inner
            .get_value_from_payload(payload, user_context)
            .and_then(|value| value.as_bool())
    }

    /// Fetch the value and return a payload fragment holding it
    ///
    /// # Errors
    /// Returns [`ClaimError::Fetch`](crate::ClaimError::Fetch) when the value source fails.
    pub async fn build(&self, user_id: &str, user_context: &UserContext) -> ClaimResult<Payload> {
        SessionClaim::build(&*self.inner, user_id, user_context).await
    }

    /// Validator factory bound to this claim
    #[must_use]
    pub fn validators(&self) -> BooleanClaimValidators {
        BooleanClaimValidators {
            inner: self.inner.validators(),
        }
    }
}

/// `is_true` / `is_false` validators for a [`BooleanClaim`]
#[derive(Debug, Clone)]
pub struct BooleanClaimValidators {
    inner: PrimitiveClaimValidators,
}

impl BooleanClaimValidators {
    /// The claim must be `true`
    #[must_use]
    pub fn is_true(&self, id: Option<&str>, max_age_in_seconds: Option<u64>) -> HasValueValidator {
        self.inner.has_value(true, id, max_age_in_seconds)
    }

    /// The claim must be `false`
    #[must_use]
    pub fn is_false(&self, id: Option<&str>, max_age_in_seconds: Option<u64>) -> HasValueValidator {
        self.inner.has_value(false, id, max_age_in_seconds)
    }
}
