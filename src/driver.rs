//! Reduction driver. Uses an explicit `Vec` as a LIFO work stack of active
//! pairs, rather than recursion, to keep stack depth independent of net
//! size.
//!
//! The policy is weak-head-first: follow the function spine down from
//! `ROOT`, firing only the redexes that block it from reaching a head
//! normal form, before falling back to draining whatever else the
//! construction and that spine work exposed. Confluence means both phases
//! reach the same normal form regardless of order; this order is the one
//! that avoids work a lazy caller (one who only inspects the head) would
//! never have needed.

use crate::agent::Kind;
use crate::error::OptiscopeError;
use crate::pool::Pool;
use crate::port::Port;
use crate::rewrite::{interact, Stats};

/// The auxiliary ports through which each kind exposes "the value of this
/// expression" to its consumer, alongside the principal port that must be
/// met before the expression is anything but that exposed port's neighbour.
fn exposed_port_arity(kind: Kind) -> Option<u8> {
    match kind {
        Kind::App => Some(2),
        Kind::Uop => Some(1),
        Kind::Bop => Some(2),
        Kind::Bop1 => Some(1),
        Kind::If => Some(3),
        _ => None,
    }
}

/// Walks the function spine beneath `at` (the port currently exposed as
/// "the head value"), returning the first active pair blocking it from
/// being a head normal form, or `None` if `at` already is one (`LAM`,
/// `CELL`, an un-contacted `FIX`, or a variable/share occurrence).
fn find_spine_redex(pool: &Pool, at: Port) -> Option<(Port, Port)> {
    let expected_port = exposed_port_arity(at.kind())?;
    if at.port() != expected_port {
        return None;
    }
    let principal_slot = Port::principal(at.kind(), at.index());
    let neighbour = pool.neighbour(principal_slot);
    if neighbour.is_principal() {
        Some((principal_slot, neighbour))
    } else {
        find_spine_redex(pool, neighbour)
    }
}

/// Fires `(a, b)` only if it is still a live, connected pair. Guards
/// against a queue entry made stale by an earlier, unrelated rewrite (e.g.
/// an initial pair from construction that the spine walk already fired).
fn fire_if_live(
    pool: &mut Pool,
    a: Port,
    b: Port,
    queue: &mut Vec<(Port, Port)>,
    stats: &mut Stats,
) -> Result<(), OptiscopeError> {
    if pool.neighbour(a) != b {
        return Ok(());
    }
    stats.loops += 1;
    interact(pool, a, b, queue, stats)
}

/// Reduces the net rooted at `root_idx` to normal form, seeding the work
/// queue with the active pairs the builder already exposed at construction
/// time. Returns accumulated statistics.
pub fn reduce(
    pool: &mut Pool,
    root_idx: u32,
    mut queue: Vec<(Port, Port)>,
) -> Result<Stats, OptiscopeError> {
    let mut stats = Stats::default();

    loop {
        let head = pool.neighbour(Port::principal(Kind::Root, root_idx));
        match find_spine_redex(pool, head) {
            Some((a, b)) => fire_if_live(pool, a, b, &mut queue, &mut stats)?,
            None => break,
        }
    }

    while let Some((a, b)) = queue.pop() {
        fire_if_live(pool, a, b, &mut queue, &mut stats)?;
    }

    Ok(stats)
}
