//! Core error types and definitions

use std::{fmt, sync::Arc};
use thiserror::Error;

/// Core error type with context propagation support
///
/// Claim fetchers and session collaborators report failures with this type.
/// It is cheap to clone so a single failure can be both logged and returned.
#[derive(Debug, Clone)]
pub struct Error {
    /// The actual error
    pub(super) inner: Arc<ErrorInner>,
}

#[derive(Debug)]
pub(super) struct ErrorInner {
    /// The error kind
    pub kind: ErrorKind,
    /// Optional error context
    pub context: Option<String>,
    /// Optional source error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Backtrace captured at error creation
    #[cfg(feature = "full-backtrace")]
    pub backtrace: backtrace::Backtrace,
}

/// Different kinds of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// I/O related errors
    #[error("I/O error")]
    Io,

    /// Network related errors (remote session core, user stores)
    #[error("Network error")]
    Network,

    /// Database lookups performed by claim fetchers
    #[error("Database error")]
    Database,

    /// Configuration errors
    #[error("Configuration error")]
    Configuration,

    /// Validation errors
    #[error("Validation error")]
    Validation,

    /// Payload (de)serialization errors
    #[error("Serialization error")]
    Serialization,

    /// Operation timeout reported by a collaborator
    #[error("Operation timed out")]
    Timeout,

    /// Permission denied
    #[error("Permission denied")]
    PermissionDenied,

    /// Not found
    #[error("Not found")]
    NotFound,

    /// Internal error
    #[error("Internal error")]
    Internal,

    /// Other error with custom message
    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// `kind` or `kind: context`
///
/// The alternate form (`{:#}`) appends every source in the chain, separated
/// by `: `. Claim errors embed the plain form, so it never carries more than
/// the message a collaborator chose to attach.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.kind)?;
        if let Some(context) = &self.inner.context {
            write!(f, ": {context}")?;
        }

        if f.alternate() {
            let mut source = std::error::Error::source(self);
            while let Some(cause) = source {
                // chained contexts repeat the kind; print only what is new
                match cause.downcast_ref::<Error>() {
                    Some(inner) => {
                        if let Some(context) = inner.get_context() {
                            write!(f, ": {context}")?;
                        }
                    }
                    None => write!(f, ": {cause}")?,
                }
                source = cause.source();
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
