//! Common infrastructure and utilities for the sessionclaims workspace
//!
//! This crate provides shared functionality used across the workspace:
//! - Error handling with context propagation
//! - Structured logging with hashed user identifiers

pub mod error;

pub use error::*;

/// Default error handler that logs errors before passing them through
pub fn on_error<T: std::fmt::Debug>(error: T) -> T {
    tracing::warn!("Error occurred: {error:?}");
    error
}
