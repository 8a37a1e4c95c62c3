//! Tests for the validator pipeline and `assert_claims`

use futures::future::{BoxFuture, FutureExt};
use serde_json::json;
use sessionclaims::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// Role claim whose fetcher counts its calls and returns `roles`
fn counting_roles(roles: &'static [&'static str]) -> (Arc<PrimitiveArrayClaim>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let claim = PrimitiveArrayClaim::new("st-role", move |_user_id: String, _ctx: UserContext| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let value: Vec<Primitive> = roles.iter().map(|r| Primitive::from(*r)).collect();
            Ok::<_, CommonError>(Some(value))
        }
    });
    (Arc::new(claim), calls)
}

fn stored(claim: &PrimitiveArrayClaim, roles: &[&str], age_ms: i64) -> Payload {
    let value = roles.iter().map(|r| Primitive::from(*r)).collect();
    claim.add_to_payload_at(Payload::new(), value, now_ms() - age_ms, &UserContext::new())
}

/// In-memory session that applies merge patches like the session core
struct MemorySession {
    user_id: String,
    payload: Mutex<Payload>,
    merges: AtomicUsize,
    fail: bool,
}

impl MemorySession {
    fn new(payload: Payload) -> Self {
        Self {
            user_id: "user-1".to_string(),
            payload: Mutex::new(payload),
            merges: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing(payload: Payload) -> Self {
        Self {
            fail: true,
            ..Self::new(payload)
        }
    }

    fn snapshot(&self) -> Payload {
        self.payload.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl SessionHandle for MemorySession {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn access_token_payload(&self) -> Payload {
        self.snapshot()
    }

    fn merge_into_access_token_payload<'a>(
        &'a self,
        update: Payload,
        _user_context: &'a UserContext,
    ) -> BoxFuture<'a, CommonResult<()>> {
        async move {
            self.merges.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CommonError::network().context("session core unavailable"));
            }
            if let Ok(mut payload) = self.payload.lock() {
                let current = std::mem::take(&mut *payload);
                *payload = apply_merge_patch(current, &update);
            }
            Ok(())
        }
        .boxed()
    }
}

#[tokio::test]
async fn test_missing_claim_is_refetched_and_recorded() -> Result<(), ClaimError> {
    let (claim, calls) = counting_roles(&["admin"]);
    let validators: Vec<Arc<dyn SessionClaimValidator>> =
        vec![Arc::new(claim.validators().includes("admin", None, None))];

    let report = validate_claims(
        "user-1",
        Payload::new(),
        &validators,
        &UserContext::new(),
        &ClaimsConfig::default(),
    )
    .await?;

    assert!(report.is_valid());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.results.get("st-role"), Some(&ClaimValidationResult::Valid));

    let update = report.payload_update.unwrap_or_default();
    assert_eq!(update.len(), 1);
    assert_eq!(
        claim.get_value_from_payload(&update, &UserContext::new()),
        Some(vec![Primitive::from("admin")])
    );
    assert_eq!(report.payload, update);
    Ok(())
}

#[tokio::test]
async fn test_fresh_claim_is_not_refetched() -> Result<(), ClaimError> {
    let (claim, calls) = counting_roles(&["admin"]);
    let payload = stored(&claim, &["admin"], 1_000);
    let validators: Vec<Arc<dyn SessionClaimValidator>> =
        vec![Arc::new(claim.validators().includes("admin", None, None))];

    let report = validate_claims(
        "user-1",
        payload,
        &validators,
        &UserContext::new(),
        &ClaimsConfig::default(),
    )
    .await?;

    assert!(report.is_valid());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(report.payload_update.is_none());
    Ok(())
}

#[tokio::test]
async fn test_stale_claim_is_refetched_before_validation() -> Result<(), ClaimError> {
    let (claim, calls) = counting_roles(&["admin"]);
    let mut payload = stored(&claim, &["viewer"], 400_000);
    payload.insert("tenant".to_string(), json!("acme"));
    let validators: Vec<Arc<dyn SessionClaimValidator>> =
        vec![Arc::new(claim.validators().includes("admin", None, Some(300)))];

    let report = validate_claims(
        "user-1",
        payload,
        &validators,
        &UserContext::new(),
        &ClaimsConfig::default(),
    )
    .await?;

    assert!(report.is_valid());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.payload.get("tenant"), Some(&json!("acme")));
    let update = report.payload_update.unwrap_or_default();
    assert!(!update.contains_key("tenant"));
    assert!(update.contains_key("st-role"));
    Ok(())
}

#[tokio::test]
async fn test_refetch_disabled_reports_expired() -> Result<(), ClaimError> {
    let (claim, calls) = counting_roles(&["admin"]);
    let payload = stored(&claim, &["admin"], 400_000);
    let validators: Vec<Arc<dyn SessionClaimValidator>> =
        vec![Arc::new(claim.validators().includes("admin", None, Some(300)))];
    let config = ClaimsConfig::default().with_refetch_stale_claims(false);

    let report =
        validate_claims("user-1", payload, &validators, &UserContext::new(), &config).await?;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.invalid_claims.len(), 1);
    assert!(matches!(
        report.invalid_claims[0].reason,
        InvalidReason::Expired { max_age_in_seconds: 300, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_fetcher_without_value_leaves_claim_missing() -> Result<(), ClaimError> {
    let claim = Arc::new(PrimitiveArrayClaim::new_sync("st-role", |_user_id, _ctx| Ok(None)));
    let validators: Vec<Arc<dyn SessionClaimValidator>> =
        vec![Arc::new(claim.validators().includes("admin", None, None))];

    let report = validate_claims(
        "user-1",
        Payload::new(),
        &validators,
        &UserContext::new(),
        &ClaimsConfig::default(),
    )
    .await?;

    assert!(report.payload_update.is_none());
    assert_eq!(
        report.invalid_claims[0].reason.message(),
        "value does not exist"
    );
    Ok(())
}

#[tokio::test]
async fn test_shared_claim_is_fetched_once() -> Result<(), ClaimError> {
    let (claim, calls) = counting_roles(&["admin", "editor"]);
    let factory = claim.validators();
    let validators: Vec<Arc<dyn SessionClaimValidator>> = vec![
        Arc::new(factory.includes("admin", Some("is-admin"), None)),
        Arc::new(factory.includes("editor", Some("is-editor"), None)),
        Arc::new(factory.excludes("banned", Some("not-banned"), None)),
    ];

    let report = validate_claims(
        "user-1",
        Payload::new(),
        &validators,
        &UserContext::new(),
        &ClaimsConfig::default(),
    )
    .await?;

    assert!(report.is_valid());
    assert_eq!(report.results.len(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_ids_keep_every_failure() -> Result<(), ClaimError> {
    let (claim, _calls) = counting_roles(&["admin"]);
    let factory = claim.validators();
    let validators: Vec<Arc<dyn SessionClaimValidator>> = vec![
        Arc::new(factory.includes("admin", None, None)),
        Arc::new(factory.includes("owner", None, None)),
        Arc::new(factory.excludes("admin", None, None)),
    ];

    let report = validate_claims(
        "user-1",
        Payload::new(),
        &validators,
        &UserContext::new(),
        &ClaimsConfig::default(),
    )
    .await?;

    assert_eq!(report.results.len(), 1);
    assert!(!report.results["st-role"].is_valid());
    assert_eq!(report.invalid_claims.len(), 2);
    assert!(report.invalid_claims.iter().all(|f| f.id == "st-role"));
    assert!(matches!(
        report.into_result(),
        Err(ClaimError::InvalidClaims(failures)) if failures.len() == 2
    ));
    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_is_an_error() {
    let claim = Arc::new(PrimitiveArrayClaim::new_sync("st-role", |_user_id, _ctx| {
        Err(CommonError::database().context("role table unavailable"))
    }));
    let validators: Vec<Arc<dyn SessionClaimValidator>> =
        vec![Arc::new(claim.validators().includes("admin", None, None))];

    let result = validate_claims(
        "user-1",
        Payload::new(),
        &validators,
        &UserContext::new(),
        &ClaimsConfig::default(),
    )
    .await;

    match result {
        Err(ClaimError::Fetch { key, source }) => {
            assert_eq!(key, "st-role");
            assert_eq!(source.kind(), &ErrorKind::Database);
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[test]
fn test_validate_claims_in_payload_never_fetches() -> Result<(), ClaimError> {
    let (claim, calls) = counting_roles(&["admin"]);
    let validators: Vec<Arc<dyn SessionClaimValidator>> =
        vec![Arc::new(claim.validators().includes("admin", None, None))];

    let report = validate_claims_in_payload(&Payload::new(), &validators, &UserContext::new())?;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!report.is_valid());
    assert!(report.payload_update.is_none());
    Ok(())
}

#[tokio::test]
async fn test_assert_claims_persists_refetched_values() -> Result<(), ClaimError> {
    let (claim, _calls) = counting_roles(&["admin"]);
    let mut initial = Payload::new();
    initial.insert("tenant".to_string(), json!("acme"));
    let session = MemorySession::new(initial);
    let validators: Vec<Arc<dyn SessionClaimValidator>> =
        vec![Arc::new(claim.validators().includes("admin", None, None))];

    let payload =
        assert_claims(&session, &validators, &UserContext::new(), &ClaimsConfig::default()).await?;

    let persisted = session.snapshot();
    assert_eq!(persisted, payload);
    assert_eq!(persisted.get("tenant"), Some(&json!("acme")));
    assert!(persisted.contains_key("st-role"));
    assert_eq!(session.merges.load(Ordering::SeqCst), 1);

    // second request sees the persisted value and does not merge again
    assert_claims(&session, &validators, &UserContext::new(), &ClaimsConfig::default()).await?;
    assert_eq!(session.merges.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_assert_claims_persists_before_rejecting() {
    let (claim, _calls) = counting_roles(&["viewer"]);
    let session = MemorySession::new(Payload::new());
    let validators: Vec<Arc<dyn SessionClaimValidator>> =
        vec![Arc::new(claim.validators().includes("admin", None, None))];

    let result =
        assert_claims(&session, &validators, &UserContext::new(), &ClaimsConfig::default()).await;

    match result {
        Err(ClaimError::InvalidClaims(failures)) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].id, "st-role");
        }
        other => panic!("expected invalid claims, got {other:?}"),
    }
    assert!(session.snapshot().contains_key("st-role"));
}

#[tokio::test]
async fn test_assert_claims_reports_persistence_failure() {
    let (claim, _calls) = counting_roles(&["admin"]);
    let session = MemorySession::failing(Payload::new());
    let validators: Vec<Arc<dyn SessionClaimValidator>> =
        vec![Arc::new(claim.validators().includes("admin", None, None))];

    let result =
        assert_claims(&session, &validators, &UserContext::new(), &ClaimsConfig::default()).await;

    assert!(matches!(result, Err(ClaimError::Persistence(ref e)) if e.kind() == &ErrorKind::Network));
    assert_eq!(session.merges.load(Ordering::SeqCst), 1);
}
