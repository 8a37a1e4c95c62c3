//! Extension traits for attaching context to foreign results and options

use super::types::{Error, ErrorKind};
use std::fmt;

/// Attach an [`ErrorKind`] and context to any `Result` with a std error
pub trait ResultExt<T> {
    /// Convert the error into [`Error`] of the given kind, keeping it as source
    ///
    /// # Errors
    /// Returns the wrapped error when `self` is `Err`.
    fn kind(self, kind: ErrorKind) -> Result<T, Error>;

    /// Convert the error into [`Error`] and attach a context message
    ///
    /// # Errors
    /// Returns the wrapped error when `self` is `Err`.
    fn context<C: fmt::Display>(self, kind: ErrorKind, context: C) -> Result<T, Error>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn kind(self, kind: ErrorKind) -> Result<T, Error> {
        self.map_err(|e| Error::with_source(kind, e))
    }

    fn context<C: fmt::Display>(self, kind: ErrorKind, context: C) -> Result<T, Error> {
        self.map_err(|e| Error::with_source(kind, e).context(context))
    }
}

/// Turn a missing value into an [`Error`]
pub trait OptionExt<T> {
    /// Return `Ok(value)` or a `kind` error carrying `context`
    ///
    /// # Errors
    /// Returns an error when `self` is `None`.
    fn ok_or_error<C: fmt::Display>(self, kind: ErrorKind, context: C) -> Result<T, Error>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_error<C: fmt::Display>(self, kind: ErrorKind, context: C) -> Result<T, Error> {
        self.ok_or_else(|| Error::new(kind).context(context))
    }
}
