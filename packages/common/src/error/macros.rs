//! Shorthands for building [`Error`](crate::Error) values
//!
//! The first argument is an [`ErrorKind`](crate::ErrorKind) variant, the rest
//! is a `format!` message stored as the error context. These messages can end
//! up in configuration errors shown to operators, so no source location is
//! added; the backtrace already records it.

/// Build an [`Error`](crate::Error): `err!(NotFound)` or `err!(NotFound, "no user {id}")`
#[macro_export]
macro_rules! err {
    ($kind:ident) => {
        $crate::Error::new($crate::ErrorKind::$kind)
    };
    ($kind:ident, $($msg:tt)+) => {
        $crate::Error::new($crate::ErrorKind::$kind).context(format!($($msg)+))
    };
}

/// Return early with [`err!`]
#[macro_export]
macro_rules! bail {
    ($($arg:tt)+) => {
        return Err($crate::err!($($arg)+))
    };
}

/// Return early with [`err!`] unless `cond` holds
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::bail!($($arg)+);
        }
    };
}
