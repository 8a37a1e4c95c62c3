//! `{v, t}` claim entries and payload merge helpers

use crate::{
    error::{ClaimError, ClaimResult},
    types::{ClaimShape, Payload},
};
use serde_json::Value;

/// Field holding the claim value inside an entry
pub const VALUE_FIELD: &str = "v";
/// Field holding the fetch timestamp (ms since epoch) inside an entry
pub const TIMESTAMP_FIELD: &str = "t";

/// A claim's sub-document inside the access-token payload
///
/// Value and timestamp only exist together: the entry is the single way this
/// crate writes claim data, so a stored value always has its fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimEntry<V> {
    /// Claim value (`v`)
    pub value: V,
    /// Fetch time in ms since the Unix epoch (`t`)
    pub fetched_at_ms: i64,
}

impl<V: ClaimShape> ClaimEntry<V> {
    /// Create an entry for a value fetched at `fetched_at_ms`
    #[must_use]
    pub fn new(value: V, fetched_at_ms: i64) -> Self {
        Self {
            value,
            fetched_at_ms,
        }
    }

    /// JSON sub-document `{ "v": .., "t": .. }`
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut entry = serde_json::Map::with_capacity(2);
        entry.insert(VALUE_FIELD.to_string(), self.value.to_json());
        entry.insert(TIMESTAMP_FIELD.to_string(), Value::from(self.fetched_at_ms));
        Value::Object(entry)
    }

    /// Read the entry stored under `key`
    ///
    /// A missing key, a `null` tombstone and a `null` value all read as
    /// "never added". Anything else that is not a complete `{v, t}` pair of
    /// the expected shape is a corrupted payload.
    ///
    /// # Errors
    /// Returns [`ClaimError::CorruptedPayload`] for malformed entries.
    pub fn read(payload: &Payload, key: &str) -> ClaimResult<Option<Self>> {
        let entry = match payload.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(entry)) => entry,
            Some(_) => {
                return Err(ClaimError::corrupted_payload(
                    key,
                    "entry is not an object",
                ));
            }
        };

        let raw_value = match entry.get(VALUE_FIELD) {
            None | Some(Value::Null) => return Ok(None),
            Some(raw) => raw,
        };

        let value = V::from_json(raw_value).ok_or_else(|| {
            ClaimError::corrupted_payload(key, "value does not match the claim's shape")
        })?;

        let fetched_at_ms = entry
            .get(TIMESTAMP_FIELD)
            .and_then(Value::as_i64)
            .ok_or_else(|| ClaimError::corrupted_payload(key, "value present without timestamp"))?;

        Ok(Some(Self {
            value,
            fetched_at_ms,
        }))
    }
}

/// Apply a merge patch: `null` values delete keys, everything else overwrites
///
/// This mirrors how the remote session store interprets payload updates.
#[must_use]
pub fn apply_merge_patch(mut payload: Payload, patch: &Payload) -> Payload {
    for (key, value) in patch {
        if value.is_null() {
            payload.remove(key);
        } else {
            payload.insert(key.clone(), value.clone());
        }
    }
    payload
}

/// Shallow merge: every key of `update` overwrites the same key in `payload`
#[must_use]
pub fn merge_payload(mut payload: Payload, update: Payload) -> Payload {
    payload.extend(update);
    payload
}
