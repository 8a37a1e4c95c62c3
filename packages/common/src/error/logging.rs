//! Production-grade structured logging infrastructure
//!
//! Provides env_logger-based logging with secure handling of user
//! identifiers and proper integration with the standard log crate.

use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Production logging infrastructure using `env_logger`
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging system (should be called once at application startup)
    ///
    /// Configure logging levels via `RUST_LOG` environment variable:
    /// - `RUST_LOG=debug` - Enable all debug logs
    /// - `RUST_LOG=info` - Enable info and above (recommended for production)
    /// - `RUST_LOG=sessionclaims=debug` - Module-specific levels
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            let _ = env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .try_init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for test environments
    ///
    /// Use this in test modules to avoid initialization conflicts
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// Log a claim refetch triggered for a user
    ///
    /// The user identifier is hashed so logs never carry raw ids.
    pub fn log_claim_refetch(claim_key: &str, user_id: &str, value_found: bool) {
        let user_hash = Self::secure_hash_key(user_id);
        if value_found {
            debug!("Claim refetched: {claim_key} (user_hash: {user_hash})");
        } else {
            info!("Claim refetch returned no value: {claim_key} (user_hash: {user_hash})");
        }
    }

    /// Log the outcome of a single validator run
    pub fn log_claim_validation(validator_id: &str, claim_key: &str, valid: bool) {
        if valid {
            debug!("Claim validation passed: {validator_id} (claim: {claim_key})");
        } else {
            warn!("Claim validation failed: {validator_id} (claim: {claim_key})");
        }
    }

    /// Log a payload update that has to be persisted by the session core
    pub fn log_payload_update(operation: &str, changed_keys: usize) {
        debug!("Payload update: {operation} ({changed_keys} keys changed)");
    }

    /// Log a broken payload invariant without exposing the payload itself
    pub fn log_contract_violation(claim_key: &str, detail: &str) {
        error!("Corrupted claim entry: {claim_key} ({detail})");
    }

    /// Log a collaborator failure (fetcher, session store) by error type only
    pub fn log_collaborator_error(operation: &str, error: &dyn std::error::Error) {
        warn!(
            "Collaborator operation failed: {} (error_type: {})",
            operation,
            std::any::type_name_of_val(error)
        );
    }

    /// Cryptographically secure key hashing for logging
    ///
    /// Returns `#` followed by the first 12 hex characters of the SHA-256 digest.
    fn secure_hash_key(key: &str) -> String {
        let hash = Sha256::digest(key.as_bytes());
        let hex_hash: String = hash.iter().map(|b| format!("{b:02x}")).collect();
        format!("#{}", &hex_hash[..12])
    }
}
