//! Optimal sharing reduction of lambda terms via interaction nets, exposed
//! as an embeddable library with a small top-level API (`open_pools`/
//! `close_pools`/`run`) that a CLI sits on top of.

pub mod agent;
pub mod builder;
pub mod driver;
pub mod error;
pub mod pool;
pub mod port;
pub mod printer;
pub mod readback;
pub mod rewrite;
pub mod surface;
pub mod term;

use std::io::Write;
use std::rc::Rc;

pub use error::{Fatal, OptiscopeError};
pub use pool::PoolGuard;
pub use rewrite::Stats;
pub use term::{
    apply, binary_call, cell, fix, if_then_else, lam, lambda, unary_call, var, Binder, Normal,
    Term,
};

/// Opens the node-pool set for the duration of one reduction.
/// Only one may be open at a time; see [`PoolGuard`].
pub fn open_pools() -> PoolGuard {
    PoolGuard::open()
}

/// Closes a pool early; also run implicitly when the guard is dropped.
pub fn close_pools(guard: &mut PoolGuard) {
    guard.close();
}

/// Builds `term`'s net inside `guard`, reduces it to normal form, and writes
/// its textual rendering to `sink`. Returns the reduction statistics.
pub fn run(
    guard: &mut PoolGuard,
    sink: &mut impl Write,
    term: &Rc<Term>,
) -> Result<Stats, OptiscopeError> {
    let pool = guard.pool();
    let (root, initial_pairs) = builder::build_net(pool, term)?;
    let stats = driver::reduce(pool, root, initial_pairs)?;
    let normal = readback::read_back(pool, root);
    printer::print(sink, &normal).expect("writing to the caller's sink failed");
    Ok(stats)
}

/// Serialises a term's reduced form to a `String`, for tests and callers
/// that don't need a streaming sink.
pub fn run_to_string(term: &Rc<Term>) -> Result<(String, Stats), OptiscopeError> {
    let mut guard = open_pools();
    let mut buf = Vec::new();
    let stats = run(&mut guard, &mut buf, term)?;
    Ok((String::from_utf8(buf).expect("printer only emits ASCII/UTF-8"), stats))
}

/// Serialises the result of running `term` straight to a `Normal`, for tests
/// that want to assert on structure rather than on the printed text.
pub fn run_to_normal(term: &Rc<Term>) -> Result<(Normal, Stats), OptiscopeError> {
    let mut guard = open_pools();
    let pool = guard.pool();
    let (root, initial_pairs) = builder::build_net(pool, term)?;
    let stats = driver::reduce(pool, root, initial_pairs)?;
    let normal = readback::read_back(pool, root);
    Ok((normal, stats))
}

/// Serialises every test in this crate behind one lock, since [`PoolGuard`]
/// enforces a single live pool process-wide and `cargo test` otherwise
/// runs test functions on multiple threads within the same process.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{cell, lam};

    #[test]
    fn identity_applied_to_a_cell_reduces_to_that_cell() {
        let _lock = test_lock();
        let id = lam(|x| var(x));
        let term = apply(id, cell(42));
        let (out, _) = run_to_string(&term).unwrap();
        assert_eq!(out, "cell[42]");
    }

    #[test]
    fn unused_binder_is_erased_without_panicking() {
        let _lock = test_lock();
        let k = lam(|_| lam(|y| var(y)));
        let term = apply(apply(k, cell(1)), cell(2));
        let (out, _) = run_to_string(&term).unwrap();
        assert_eq!(out, "cell[2]");
    }

    #[test]
    fn shared_binder_is_duplicated_not_mutated() {
        let _lock = test_lock();
        // \x. binary_call(add, x, x) applied to 21 should read back cell[42].
        let double = lam(|x| binary_call(|a, b| a + b, var(x), var(x)));
        let term = apply(double, cell(21));
        let (out, _) = run_to_string(&term).unwrap();
        assert_eq!(out, "cell[42]");
    }

    #[test]
    fn free_variable_is_rejected() {
        let _lock = test_lock();
        let dangling = Binder::new();
        let term = var(&dangling);
        let err = run_to_string(&term).unwrap_err();
        assert!(matches!(err, OptiscopeError::InvalidTerm(_)));
    }
}
