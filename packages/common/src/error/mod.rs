//! Error handling with context propagation
//!
//! Provides the error type shared by claim fetchers and session
//! collaborators:
//! - Error chaining and context preservation
//! - Backtrace capture (feature `full-backtrace`)
//! - Structured error kinds with thiserror

pub mod constructors;
pub mod extensions;
pub mod logging;
pub mod macros;
pub mod types;

pub use extensions::{OptionExt, ResultExt};
pub use logging::LoggingTransformer;
pub use types::{Error, ErrorKind, Result};
