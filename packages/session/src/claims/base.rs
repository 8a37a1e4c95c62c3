//! Keyed claim with a fetcher and the `{v, t}` payload primitives

use crate::{
    config::{ClaimsConfig, DEFAULT_MAX_AGE_IN_SEC},
    error::{ClaimError, ClaimResult},
    payload::{ClaimEntry, TIMESTAMP_FIELD, VALUE_FIELD},
    traits::SessionClaim,
    types::{now_ms, ClaimShape, Payload, UserContext},
};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use sessionclaims_common::Result as CommonResult;
use std::{fmt, future::Future, sync::Arc};

/// Type-erased value source of a claim
type FetchFn<V> =
    dyn Fn(String, UserContext) -> BoxFuture<'static, CommonResult<Option<V>>> + Send + Sync;

/// A keyed, independently fetchable fact stored in the access-token payload
///
/// The claim owns no payload: every payload operation takes the mapping and
/// gives it back, leaving keys of other claims untouched. Claims are built
/// once at configuration time and shared behind an `Arc`.
pub struct Claim<V: ClaimShape> {
    key: String,
    fetcher: Arc<FetchFn<V>>,
    default_max_age_in_sec: u64,
}

impl<V: ClaimShape> Claim<V> {
    /// Create a claim with an asynchronous value source
    ///
    /// The fetcher gets the user id and the request's user context and
    /// returns `Ok(None)` when no value is available.
    pub fn new<F, Fut>(key: impl Into<String>, fetch: F) -> Self
    where
        F: Fn(String, UserContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommonResult<Option<V>>> + Send + 'static,
    {
        Self {
            key: key.into(),
            fetcher: Arc::new(move |user_id: String, user_context: UserContext| {
                fetch(user_id, user_context).boxed()
            }),
            default_max_age_in_sec: DEFAULT_MAX_AGE_IN_SEC,
        }
    }

    /// Create a claim whose value source never suspends
    pub fn new_sync<F>(key: impl Into<String>, fetch: F) -> Self
    where
        F: Fn(&str, &UserContext) -> CommonResult<Option<V>> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            fetcher: Arc::new(move |user_id: String, user_context: UserContext| {
                futures::future::ready(fetch(&user_id, &user_context)).boxed()
            }),
            default_max_age_in_sec: DEFAULT_MAX_AGE_IN_SEC,
        }
    }

    /// Set the max age applied by validators built without an explicit one
    #[must_use]
    pub fn with_default_max_age(mut self, default_max_age_in_sec: u64) -> Self {
        self.default_max_age_in_sec = default_max_age_in_sec;
        self
    }

    /// Take the default max age from a configuration
    #[must_use]
    pub fn with_config(self, config: &ClaimsConfig) -> Self {
        self.with_default_max_age(config.default_max_age_in_sec)
    }

    /// Payload key of this claim
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Max age given to validators that do not set one
    #[must_use]
    pub fn default_max_age_in_sec(&self) -> u64 {
        self.default_max_age_in_sec
    }

    /// Ask the value source for the current value
    ///
    /// # Errors
    /// Returns [`ClaimError::Fetch`] when the value source fails.
    pub async fn fetch_value(
        &self,
        user_id: &str,
        user_context: &UserContext,
    ) -> ClaimResult<Option<V>> {
        (self.fetcher)(user_id.to_string(), user_context.clone())
            .await
            .map_err(|source| {
                sessionclaims_common::LoggingTransformer::log_collaborator_error(
                    "claim fetch",
                    &source,
                );
                ClaimError::fetch(&self.key, source)
            })
    }

    /// Fetch the value and return a payload fragment holding only this claim
    ///
    /// The fragment is empty when the value source has nothing to offer.
    ///
    /// # Errors
    /// Returns [`ClaimError::Fetch`] when the value source fails.
    pub async fn build(&self, user_id: &str, user_context: &UserContext) -> ClaimResult<Payload> {
        let value = self.fetch_value(user_id, user_context).await?;
        sessionclaims_common::LoggingTransformer::log_claim_refetch(
            &self.key,
            user_id,
            value.is_some(),
        );

        Ok(match value {
            Some(value) => self.add_to_payload(Payload::new(), value, user_context),
            None => Payload::new(),
        })
    }

    /// Store `value` under the claim key, stamped with the current time
    ///
    /// Any previous entry is replaced as a whole.
    #[must_use]
    pub fn add_to_payload(&self, payload: Payload, value: V, user_context: &UserContext) -> Payload {
        self.add_to_payload_at(payload, value, now_ms(), user_context)
    }

    /// Store `value` under the claim key with an explicit fetch time
    #[must_use]
    pub fn add_to_payload_at(
        &self,
        mut payload: Payload,
        value: V,
        fetched_at_ms: i64,
        _user_context: &UserContext,
    ) -> Payload {
        payload.insert(
            self.key.clone(),
            ClaimEntry::new(value, fetched_at_ms).to_json(),
        );
        payload
    }

    /// Delete the claim entry, for payloads that are replaced wholesale
    #[must_use]
    pub fn remove_from_payload(&self, mut payload: Payload, _user_context: &UserContext) -> Payload {
        payload.remove(&self.key);
        payload
    }

    /// Tombstone the claim entry with `null`, for merge-patch updates
    #[must_use]
    pub fn remove_from_payload_by_merge(
        &self,
        mut payload: Payload,
        _user_context: &UserContext,
    ) -> Payload {
        payload.insert(self.key.clone(), Value::Null);
        payload
    }

    /// Stored value, `None` when absent, tombstoned or of another shape
    #[must_use]
    pub fn get_value_from_payload(&self, payload: &Payload, _user_context: &UserContext) -> Option<V> {
        let raw = payload.get(&self.key)?.get(VALUE_FIELD)?;
        if raw.is_null() {
            return None;
        }
        let value = V::from_json(raw);
        if value.is_none() {
            tracing::warn!(claim = %self.key, "stored claim value has an unexpected shape");
        }
        value
    }

    /// Stored fetch time in ms since the Unix epoch, `None` when absent
    #[must_use]
    pub fn get_last_refetch_time(&self, payload: &Payload, _user_context: &UserContext) -> Option<i64> {
        payload.get(&self.key)?.get(TIMESTAMP_FIELD)?.as_i64()
    }
}

impl<V: ClaimShape> SessionClaim for Claim<V> {
    fn key(&self) -> &str {
        &self.key
    }

    fn build<'a>(
        &'a self,
        user_id: &'a str,
        user_context: &'a UserContext,
    ) -> BoxFuture<'a, ClaimResult<Payload>> {
        Claim::build(self, user_id, user_context).boxed()
    }

    fn remove_from_payload(&self, payload: Payload, user_context: &UserContext) -> Payload {
        Claim::remove_from_payload(self, payload, user_context)
    }

    fn remove_from_payload_by_merge(&self, payload: Payload, user_context: &UserContext) -> Payload {
        Claim::remove_from_payload_by_merge(self, payload, user_context)
    }
}

impl<V: ClaimShape> Clone for Claim<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            fetcher: self.fetcher.clone(),
            default_max_age_in_sec: self.default_max_age_in_sec,
        }
    }
}

impl<V: ClaimShape> fmt::Debug for Claim<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claim")
            .field("key", &self.key)
            .field("default_max_age_in_sec", &self.default_max_age_in_sec)
            .finish_non_exhaustive()
    }
}
