//! Core session claim traits.

use crate::{
    error::ClaimResult,
    types::{now_ms, Payload, UserContext},
    validation::ClaimValidationResult,
};
use futures::future::BoxFuture;
use sessionclaims_common::Result as CommonResult;

/// Type-erased view of a claim, as needed by validators and the session hook.
///
/// Implemented by every [`Claim`](crate::claims::Claim). Implementations must
/// be thread-safe (Send + Sync) since one claim serves all requests.
pub trait SessionClaim: Send + Sync {
    /// Payload key of the claim.
    fn key(&self) -> &str;

    /// Fetch the current value and return a payload fragment holding it.
    fn build<'a>(
        &'a self,
        user_id: &'a str,
        user_context: &'a UserContext,
    ) -> BoxFuture<'a, ClaimResult<Payload>>;

    /// Delete the claim entry (full payload replacement).
    fn remove_from_payload(&self, payload: Payload, user_context: &UserContext) -> Payload;

    /// Tombstone the claim entry with `null` (merge-patch update).
    fn remove_from_payload_by_merge(&self, payload: Payload, user_context: &UserContext) -> Payload;
}

/// A configured rule judging one claim's payload value.
///
/// Validators never fetch: they report through
/// [`should_refetch`](Self::should_refetch) that their claim is missing or
/// stale, and the caller refetches before validating.
pub trait SessionClaimValidator: Send + Sync {
    /// Id under which results are reported.
    fn id(&self) -> &str;

    /// The claim this validator reads.
    fn claim(&self) -> &dyn SessionClaim;

    /// Freshness bound, `None` when any age is accepted.
    fn max_age_in_sec(&self) -> Option<u64>;

    /// Refetch check against an explicit clock reading.
    fn should_refetch_at(&self, payload: &Payload, user_context: &UserContext, now_ms: i64) -> bool;

    /// Validation against an explicit clock reading.
    ///
    /// # Errors
    /// Only for corrupted payload entries; failed rules are `Ok(Invalid(..))`.
    fn validate_at(
        &self,
        payload: &Payload,
        user_context: &UserContext,
        now_ms: i64,
    ) -> ClaimResult<ClaimValidationResult>;

    /// True when the claim is missing or older than the max age.
    fn should_refetch(&self, payload: &Payload, user_context: &UserContext) -> bool {
        self.should_refetch_at(payload, user_context, now_ms())
    }

    /// Judge the payload now.
    ///
    /// # Errors
    /// Only for corrupted payload entries; failed rules are `Ok(Invalid(..))`.
    fn validate(&self, payload: &Payload, user_context: &UserContext) -> ClaimResult<ClaimValidationResult> {
        self.validate_at(payload, user_context, now_ms())
    }
}

/// Implementation of SessionClaimValidator for Arc<T> to allow shared ownership.
impl<T: SessionClaimValidator + ?Sized> SessionClaimValidator for std::sync::Arc<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn claim(&self) -> &dyn SessionClaim {
        (**self).claim()
    }

    fn max_age_in_sec(&self) -> Option<u64> {
        (**self).max_age_in_sec()
    }

    fn should_refetch_at(&self, payload: &Payload, user_context: &UserContext, now_ms: i64) -> bool {
        (**self).should_refetch_at(payload, user_context, now_ms)
    }

    fn validate_at(
        &self,
        payload: &Payload,
        user_context: &UserContext,
        now_ms: i64,
    ) -> ClaimResult<ClaimValidationResult> {
        (**self).validate_at(payload, user_context, now_ms)
    }
}

/// Something that adds entries to a new session's access-token payload.
pub trait PayloadContributor: Send + Sync {
    /// Produce the payload fragment for `user_id`.
    fn contribute<'a>(
        &'a self,
        user_id: &'a str,
        user_context: &'a UserContext,
    ) -> BoxFuture<'a, ClaimResult<Payload>>;

    /// Drop whatever this contributor owns before a full rebuild.
    fn clear(&self, payload: Payload, _user_context: &UserContext) -> Payload {
        payload
    }
}

/// The remote session core, seen from the validation pipeline.
///
/// Persistence of payload updates is always the collaborator's job.
pub trait SessionHandle: Send + Sync {
    /// Owner of the session.
    fn user_id(&self) -> &str;

    /// Snapshot of the current access-token payload.
    fn access_token_payload(&self) -> Payload;

    /// Persist a merge patch (`null` deletes a key).
    fn merge_into_access_token_payload<'a>(
        &'a self,
        update: Payload,
        user_context: &'a UserContext,
    ) -> BoxFuture<'a, CommonResult<()>>;
}
