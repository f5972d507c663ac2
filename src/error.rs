//! Error kinds for the reducer.
//!
//! Only `InvalidTerm` and `ForeignCallTrap` are ever returned as `Err` values;
//! `PoolExhausted` and `InvariantViolation` indicate a fatal condition the
//! caller cannot recover from locally and are raised by aborting.

use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum OptiscopeError {
    /// A free variable, a `fix` whose argument is not literally a lambda, or
    /// a null/dangling subterm was found before translation to a net.
    #[error("invalid term: {0}")]
    InvalidTerm(String),

    /// A foreign unary/binary call trapped (e.g. division by zero), per the
    /// host ABI the function pointer was registered under.
    #[error("foreign call trapped: {0}")]
    ForeignCallTrap(String),
}

/// Raised only for the two kinds that are unrecoverable even in principle:
/// pool exhaustion and an internal invariant violation. These are never
/// returned as `Result::Err`; they terminate the process instead, since no
/// caller can locally recover from either.
#[derive(Debug)]
pub enum Fatal {
    PoolExhausted,
    InvariantViolation(String),
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fatal::PoolExhausted => write!(f, "node pool exhausted"),
            Fatal::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

impl Fatal {
    /// Reports the condition and aborts the process. `close` is run
    /// best-effort first, matching the `PoolExhausted` policy of attempting
    /// release before abort.
    pub fn abort(self, close: impl FnOnce()) -> ! {
        close();
        eprintln!("optiscope: fatal: {self}");
        std::process::exit(1);
    }
}
