//! Time-bounded session claims
//!
//! This crate provides:
//! - Claims stored in the access-token payload as `{ "v": value, "t": fetched_at_ms }`
//! - Lazy refetching of missing or stale claims
//! - Declarative validators (includes, excludes, equality) with max-age checks
//! - A session creation hook and a validator pipeline for middleware
//!
//! ```no_run
//! use sessionclaims::{ClaimsConfig, PrimitiveArrayClaim, SessionClaimValidator};
//! use std::sync::Arc;
//!
//! let roles = Arc::new(PrimitiveArrayClaim::new_sync("st-role", |_user_id, _ctx| {
//!     Ok(Some(vec!["admin".into()]))
//! }));
//! let admin_only = roles.validators().includes("admin", None, None);
//! let payload = roles.add_to_payload(Default::default(), vec!["admin".into()], &Default::default());
//! assert!(admin_only.validate(&payload, &Default::default()).is_ok());
//! # let _ = ClaimsConfig::default();
//! ```

pub mod claims;
pub mod config;
mod error;
pub mod hook;
pub mod payload;
pub mod pipeline;
pub mod response;
pub mod traits;
mod types;
pub mod validation;

pub use claims::*;
pub use config::{ClaimsConfig, DEFAULT_MAX_AGE_IN_SEC};
pub use error::*;
pub use hook::{SessionCreationHook, StaticContributor};
pub use payload::{apply_merge_patch, merge_payload, ClaimEntry};
pub use pipeline::{assert_claims, validate_claims, validate_claims_in_payload, ClaimValidationReport};
pub use response::InvalidClaimsResponse;
pub use traits::{PayloadContributor, SessionClaim, SessionClaimValidator, SessionHandle};
pub use types::*;
pub use validation::{ClaimValidationFailure, ClaimValidationResult, ExpectedKey, InvalidReason};

// Collaborators report errors with the common error type
pub use sessionclaims_common::{Error as CommonError, ErrorKind, Result as CommonResult};
