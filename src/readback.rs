//! Reading a reduced net back to a [`Normal`] term. `DUP` nodes are pure,
//! invisible sharing combinators, so there's no separate let-binding to
//! defer: occurrences are resolved in place by climbing the fan-in chain
//! back to its `LAM`, and de Bruijn indices fall out of a simple depth
//! counter kept across the recursion.

use std::collections::{HashMap, HashSet};

use crate::agent::Kind;
use crate::error::Fatal;
use crate::pool::{release_pool_lock, Pool};
use crate::port::Port;
use crate::term::Normal;

/// Climbs a `DUP` fan-in chain from an auxiliary port back to the `LAM`
/// bound port it ultimately shares, per the right-leaning chain `fan_in`
/// (builder.rs) builds.
fn find_binder(pool: &Pool, dup_idx: u32) -> Port {
    let mut upstream = pool.neighbour(Port::new(Kind::Dup, dup_idx, 0));
    loop {
        match upstream.kind() {
            Kind::Lam => return upstream,
            Kind::Dup => upstream = pool.neighbour(Port::new(Kind::Dup, upstream.index(), 0)),
            other => {
                Fatal::InvariantViolation(format!(
                    "dup fan-in chain does not terminate at a binder (found {other:?})"
                ))
                .abort(release_pool_lock);
            }
        }
    }
}

struct Ctx {
    /// Depth (number of enclosing `LAM`s, including the binder's own) at
    /// which each currently-open `LAM`'s bound port was registered.
    binder_depth: HashMap<Port, u32>,
    /// Principal ports currently on the recursion path, i.e. being read by
    /// an ancestor call. A repeated visit means the net holds a cycle
    /// reachable without passing through an opaque stuck primitive, which
    /// should be impossible (a `FIX`-introduced cycle can only survive to a
    /// normal net underneath a still-unforced `FIX`, and this reader never
    /// descends into one). Tracked so a latent bug here fails loudly
    /// instead of recursing forever.
    visiting: HashSet<Port>,
}

fn read(pool: &Pool, ctx: &mut Ctx, at: Port, depth: u32) -> Normal {
    if !at.is_principal() {
        let binder = match at.kind() {
            Kind::Lam => at,
            Kind::Dup => find_binder(pool, at.index()),
            other => Fatal::InvariantViolation(format!(
                "unexpected non-principal port kind during readback: {other:?}"
            ))
            .abort(release_pool_lock),
        };
        let push_depth = *ctx.binder_depth.get(&binder).unwrap_or_else(|| {
            Fatal::InvariantViolation("variable occurrence outside its binder's scope".into())
                .abort(release_pool_lock)
        });
        return Normal::Var(depth - push_depth - 1);
    }

    // Stuck primitives are opaque leaves (see read_back's doc comment) and
    // are returned below without being marked, since nothing recurses
    // through them; only kinds that recurse into children need tracking.
    if matches!(at.kind(), Kind::Lam | Kind::App) && !ctx.visiting.insert(at) {
        Fatal::InvariantViolation(format!(
            "cycle detected reading back {:?}: net held a live self-reference \
             outside any stuck FIX",
            at.kind()
        ))
        .abort(release_pool_lock);
    }

    let result = match at.kind() {
        Kind::Lam => {
            let bound = Port::new(Kind::Lam, at.index(), 2);
            ctx.binder_depth.insert(bound, depth);
            let body_port = pool.neighbour(Port::new(Kind::Lam, at.index(), 1));
            let inner = read(pool, ctx, body_port, depth + 1);
            ctx.binder_depth.remove(&bound);
            Normal::Lam(Box::new(inner))
        }
        Kind::App => {
            let fun_port = pool.neighbour(Port::principal(Kind::App, at.index()));
            let arg_port = pool.neighbour(Port::new(Kind::App, at.index(), 1));
            let fun = read(pool, ctx, fun_port, depth);
            let arg = read(pool, ctx, arg_port, depth);
            Normal::App(Box::new(fun), Box::new(arg))
        }
        Kind::Cell => Normal::Cell(pool.cell_value(at.index())),
        Kind::Uop => Normal::StuckUop,
        Kind::Bop => Normal::StuckBop,
        Kind::Bop1 => Normal::StuckBop,
        Kind::If => Normal::StuckIf,
        Kind::Fix => Normal::StuckFix,
        other => Fatal::InvariantViolation(format!(
            "{other:?} can never be the observed value of a reduced net"
        ))
        .abort(release_pool_lock),
    };

    if matches!(at.kind(), Kind::Lam | Kind::App) {
        ctx.visiting.remove(&at);
    }
    result
}

/// Reads the net rooted at `root_idx` back into a [`Normal`] term. Never
/// recurses into a stuck primitive's substructure: `UOP`/`BOP`/`BOP1`/`IF`/
/// `FIX` are reported as opaque leaves, so there is no path by which a
/// `FIX`-introduced share point could send this into unbounded recursion.
pub fn read_back(pool: &Pool, root_idx: u32) -> Normal {
    let mut ctx = Ctx { binder_depth: HashMap::new(), visiting: HashSet::new() };
    let start = pool.neighbour(Port::principal(Kind::Root, root_idx));
    read(pool, &mut ctx, start, 0)
}
