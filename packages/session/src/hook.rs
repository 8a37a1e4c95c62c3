//! Session creation hook: assemble the initial access-token payload
//!
//! Contributors are an explicit ordered list owned by the hook. Fragments are
//! merged shallowly in registration order, so a later contributor overwrites
//! an earlier one on key collision, and static parameters overwrite both.

use crate::{
    error::ClaimResult,
    payload::merge_payload,
    traits::{PayloadContributor, SessionClaim},
    types::{Payload, UserContext},
};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use sessionclaims_common::LoggingTransformer;
use std::{fmt, sync::Arc};

/// Adapts a claim to the contributor interface
struct ClaimContributor(Arc<dyn SessionClaim>);

impl PayloadContributor for ClaimContributor {
    fn contribute<'a>(
        &'a self,
        user_id: &'a str,
        user_context: &'a UserContext,
    ) -> BoxFuture<'a, ClaimResult<Payload>> {
        self.0.build(user_id, user_context)
    }

    fn clear(&self, payload: Payload, user_context: &UserContext) -> Payload {
        self.0.remove_from_payload(payload, user_context)
    }
}

/// Builds access-token payloads for new and refreshed sessions
#[derive(Default, Clone)]
pub struct SessionCreationHook {
    contributors: Vec<Arc<dyn PayloadContributor>>,
    static_params: Payload,
}

impl SessionCreationHook {
    /// Hook without contributors
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a claim; its fetched value is added to every new payload
    #[must_use]
    pub fn with_claim(self, claim: Arc<dyn SessionClaim>) -> Self {
        self.with_contributor(Arc::new(ClaimContributor(claim)))
    }

    /// Append an arbitrary contributor
    #[must_use]
    pub fn with_contributor(mut self, contributor: Arc<dyn PayloadContributor>) -> Self {
        self.contributors.push(contributor);
        self
    }

    /// Entries merged last, overriding every contributor
    #[must_use]
    pub fn with_static(mut self, params: Payload) -> Self {
        self.static_params.extend(params);
        self
    }

    /// Number of registered contributors
    #[must_use]
    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    /// True when no contributor is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    /// Payload for a session about to be created
    ///
    /// Contributors run concurrently; their fragments are merged over
    /// `initial` in registration order.
    ///
    /// # Errors
    /// Returns the first contributor error, e.g. [`ClaimError::Fetch`](crate::ClaimError::Fetch).
    pub async fn build_access_token_payload(
        &self,
        user_id: &str,
        initial: Option<Payload>,
        user_context: &UserContext,
    ) -> ClaimResult<Payload> {
        let fragments = try_join_all(
            self.contributors
                .iter()
                .map(|contributor| contributor.contribute(user_id, user_context)),
        )
        .await?;

        let payload = fragments
            .into_iter()
            .fold(initial.unwrap_or_default(), merge_payload);
        let payload = merge_payload(payload, self.static_params.clone());

        LoggingTransformer::log_payload_update("session creation", payload.len());
        Ok(payload)
    }

    /// Full rebuild of an existing payload
    ///
    /// Every contributor first clears what it owns, then the payload is
    /// rebuilt as for a new session. Keys owned by nobody are kept.
    ///
    /// # Errors
    /// Returns the first contributor error.
    pub async fn refresh_access_token_payload(
        &self,
        user_id: &str,
        payload: Payload,
        user_context: &UserContext,
    ) -> ClaimResult<Payload> {
        let cleared = self
            .contributors
            .iter()
            .fold(payload, |payload, contributor| {
                contributor.clear(payload, user_context)
            });
        self.build_access_token_payload(user_id, Some(cleared), user_context)
            .await
    }

    /// Merge patch that drops `claims` from a stored payload
    #[must_use]
    pub fn removal_patch(claims: &[Arc<dyn SessionClaim>], user_context: &UserContext) -> Payload {
        claims.iter().fold(Payload::new(), |patch, claim| {
            claim.remove_from_payload_by_merge(patch, user_context)
        })
    }
}

impl fmt::Debug for SessionCreationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCreationHook")
            .field("contributors", &self.contributors.len())
            .field("static_params", &self.static_params)
            .finish()
    }
}

/// A fixed payload fragment, e.g. tenant or app metadata
#[derive(Debug, Clone, Default)]
pub struct StaticContributor {
    fragment: Payload,
}

impl StaticContributor {
    /// Contributor returning `fragment` for every user
    #[must_use]
    pub fn new(fragment: Payload) -> Self {
        Self { fragment }
    }
}

impl PayloadContributor for StaticContributor {
    fn contribute<'a>(
        &'a self,
        _user_id: &'a str,
        _user_context: &'a UserContext,
    ) -> BoxFuture<'a, ClaimResult<Payload>> {
        futures::future::ready(Ok(self.fragment.clone())).boxed()
    }

    fn clear(&self, mut payload: Payload, _user_context: &UserContext) -> Payload {
        for key in self.fragment.keys() {
            payload.remove(key);
        }
        payload
    }
}
