//! Tests for the `{v, t}` payload primitives of claims

use serde_json::json;
use sessionclaims::*;

const T0: i64 = 1_700_000_000_000;

fn roles() -> PrimitiveArrayClaim {
    PrimitiveArrayClaim::new_sync("st-role", |_user_id, _ctx| Ok(None))
}

fn payload_from(value: serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Payload::new(),
    }
}

#[test]
fn test_add_then_read_back() {
    let ctx = UserContext::new();
    let claim = roles();
    let value = vec![Primitive::from("admin"), Primitive::from("editor")];

    let payload = claim.add_to_payload_at(Payload::new(), value.clone(), T0, &ctx);

    assert_eq!(claim.get_value_from_payload(&payload, &ctx), Some(value));
    assert_eq!(claim.get_last_refetch_time(&payload, &ctx), Some(T0));
    assert_eq!(
        payload.get("st-role"),
        Some(&json!({ "v": ["admin", "editor"], "t": T0 }))
    );
}

#[test]
fn test_add_uses_current_time() {
    let ctx = UserContext::new();
    let claim = roles();

    let before = now_ms();
    let payload = claim.add_to_payload(Payload::new(), vec!["a".into()], &ctx);
    let after = now_ms();

    let t = claim.get_last_refetch_time(&payload, &ctx).unwrap_or_default();
    assert!(t >= before && t <= after);
}

#[test]
fn test_add_overwrites_whole_entry() {
    let ctx = UserContext::new();
    let claim = roles();

    let payload = claim.add_to_payload_at(Payload::new(), vec!["a".into()], T0, &ctx);
    let payload = claim.add_to_payload_at(payload, vec!["b".into()], T0 + 5, &ctx);

    assert_eq!(payload.get("st-role"), Some(&json!({ "v": ["b"], "t": T0 + 5 })));
}

#[test]
fn test_other_keys_are_preserved() {
    let ctx = UserContext::new();
    let claim = roles();
    let payload = payload_from(json!({
        "st-perm": { "v": ["read"], "t": T0 },
        "tenant": "acme"
    }));

    let payload = claim.add_to_payload_at(payload, vec!["admin".into()], T0, &ctx);
    assert_eq!(payload.get("tenant"), Some(&json!("acme")));
    assert_eq!(payload.get("st-perm"), Some(&json!({ "v": ["read"], "t": T0 })));

    let payload = claim.remove_from_payload(payload, &ctx);
    assert_eq!(payload.len(), 2);
    assert!(!payload.contains_key("st-role"));
}

#[test]
fn test_remove_is_idempotent() {
    let ctx = UserContext::new();
    let claim = roles();
    let payload = claim.add_to_payload_at(Payload::new(), vec!["a".into()], T0, &ctx);

    let once = claim.remove_from_payload(payload, &ctx);
    let twice = claim.remove_from_payload(once.clone(), &ctx);

    assert_eq!(once, twice);
    assert_eq!(claim.get_value_from_payload(&twice, &ctx), None);
}

#[test]
fn test_remove_by_merge_writes_tombstone() {
    let ctx = UserContext::new();
    let claim = roles();
    let payload = claim.add_to_payload_at(Payload::new(), vec!["a".into()], T0, &ctx);

    let patched = claim.remove_from_payload_by_merge(payload, &ctx);

    assert_eq!(patched.get("st-role"), Some(&serde_json::Value::Null));
    assert_eq!(claim.get_value_from_payload(&patched, &ctx), None);
    assert_eq!(claim.get_last_refetch_time(&patched, &ctx), None);
}

#[test]
fn test_merge_patch_deletes_tombstoned_keys() {
    let ctx = UserContext::new();
    let claim = roles();
    let stored = payload_from(json!({
        "st-role": { "v": ["a"], "t": T0 },
        "tenant": "acme"
    }));

    let patch = claim.remove_from_payload_by_merge(Payload::new(), &ctx);
    let stored = apply_merge_patch(stored, &patch);

    assert_eq!(stored, payload_from(json!({ "tenant": "acme" })));
}

#[test]
fn test_read_absent_claim() {
    let ctx = UserContext::new();
    let claim = roles();

    assert_eq!(claim.get_value_from_payload(&Payload::new(), &ctx), None);
    assert_eq!(claim.get_last_refetch_time(&Payload::new(), &ctx), None);
}

#[test]
fn test_claim_entry_rejects_value_without_timestamp() {
    let payload = payload_from(json!({ "st-role": { "v": ["a"] } }));

    let result = ClaimEntry::<Vec<Primitive>>::read(&payload, "st-role");

    assert!(matches!(
        result,
        Err(ClaimError::CorruptedPayload { ref key, .. }) if key == "st-role"
    ));
}

#[test]
fn test_claim_entry_rejects_wrong_shape() {
    let scalar = payload_from(json!({ "st-role": { "v": "admin", "t": T0 } }));
    let nested = payload_from(json!({ "st-role": { "v": [["admin"]], "t": T0 } }));
    let not_an_object = payload_from(json!({ "st-role": 42 }));

    for payload in [scalar, nested, not_an_object] {
        assert!(ClaimEntry::<Vec<Primitive>>::read(&payload, "st-role").is_err());
    }
}

#[test]
fn test_claim_entry_treats_null_as_absent() {
    let tombstone = payload_from(json!({ "st-role": null }));
    let null_value = payload_from(json!({ "st-role": { "v": null, "t": T0 } }));

    for payload in [tombstone, null_value] {
        let entry = ClaimEntry::<Vec<Primitive>>::read(&payload, "st-role");
        assert!(matches!(entry, Ok(None)));
    }
}

#[test]
fn test_primitive_identity() {
    assert_ne!(Primitive::from(1), Primitive::from("1"));
    assert_ne!(Primitive::from(true), Primitive::from(1));
    assert_eq!(Primitive::from_json(&json!(7)), Some(Primitive::from(7)));
    assert_eq!(Primitive::from_json(&json!(null)), None);
    assert_eq!(Primitive::from_json(&json!([1])), None);
    assert_eq!(Primitive::from_f64(f64::NAN), None);
    assert_eq!(Primitive::from("x").to_string(), "x");
}
