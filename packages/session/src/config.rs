//! Claim engine configuration.

use crate::error::{ClaimError, ClaimResult};
use serde::{Deserialize, Serialize};
use sessionclaims_common::ensure;

/// Max age used by validator factories when none is configured (5 min).
pub const DEFAULT_MAX_AGE_IN_SEC: u64 = 300;

/// Claim engine options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsConfig {
    /// Max age given to validators built without an explicit one.
    #[serde(default = "default_max_age_in_sec")]
    pub default_max_age_in_sec: u64,
    /// Refetch missing or stale claims before validating them.
    #[serde(default = "default_refetch_stale_claims")]
    pub refetch_stale_claims: bool,
}

fn default_max_age_in_sec() -> u64 {
    DEFAULT_MAX_AGE_IN_SEC
}

fn default_refetch_stale_claims() -> bool {
    true
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            default_max_age_in_sec: default_max_age_in_sec(),
            refetch_stale_claims: default_refetch_stale_claims(),
        }
    }
}

impl ClaimsConfig {
    /// Parse a JSON configuration document; missing fields take defaults.
    ///
    /// # Errors
    /// Returns [`ClaimError::Configuration`] for malformed JSON or values
    /// rejected by [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> ClaimResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ClaimError::configuration(&format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the default max age.
    #[must_use]
    pub fn with_default_max_age(mut self, default_max_age_in_sec: u64) -> Self {
        self.default_max_age_in_sec = default_max_age_in_sec;
        self
    }

    /// Set whether the pipeline refetches stale claims.
    #[must_use]
    pub fn with_refetch_stale_claims(mut self, refetch: bool) -> Self {
        self.refetch_stale_claims = refetch;
        self
    }

    /// Check the configuration for values that can never validate anything.
    ///
    /// # Errors
    /// Returns [`ClaimError::Configuration`] when the default max age is zero.
    pub fn validate(&self) -> ClaimResult<()> {
        self.check().map_err(|e| {
            ClaimError::configuration(e.get_context().unwrap_or("invalid configuration"))
        })
    }

    fn check(&self) -> sessionclaims_common::Result<()> {
        ensure!(
            self.default_max_age_in_sec > 0,
            Configuration,
            "default_max_age_in_sec must be greater than zero"
        );
        Ok(())
    }
}
