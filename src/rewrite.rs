//! The rewrite rules, dispatched by kind pair. Two shapes recur throughout:
//! same kind annihilates, different kind commutes via two fresh nodes.
//! Generalized to the full kind set here: a generic eraser, a generic
//! sharing commutation (covering the oracle rule for `DUP_j ⋈ DUP_k`, j≠k, as
//! the ordinary case of "different kind" with one side itself a `DUP`), a
//! self-unfolding `FIX`, a beta rule, and the staged foreign-call pipeline
//! `BOP -> BOP1 -> CELL`.

use std::panic::catch_unwind;

use crate::agent::Kind;
use crate::error::{Fatal, OptiscopeError};
use crate::pool::{release_pool_lock, Pool};
use crate::port::{is_active_pair, Port};

#[derive(Default, Debug, Clone, Copy)]
pub struct Stats {
    pub loops: u64,
    pub rules: u64,
    pub betas: u64,
    pub dupls: u64,
    pub annis: u64,
    pub comms: u64,
    pub oracles: u64,
    pub primitives: u64,
}

type Queue = Vec<(Port, Port)>;

#[inline]
fn maybe_active(a: Port, b: Port, queue: &mut Queue) {
    if is_active_pair(a, b) {
        queue.push((a, b));
    }
}

/// Erases `target` (an arbitrary agent), attaching a fresh `ERA` to each of
/// its auxiliary ports and recursively scheduling whatever those reach.
fn erase(pool: &mut Pool, target: Port, queue: &mut Queue) {
    let kind = target.kind();
    let idx = target.index();
    for i in 1..kind.arity() {
        let aux_neighbour = pool.neighbour(Port::new(kind, idx, i));
        let era = pool.alloc_era();
        let era_port = Port::principal(Kind::Era, era);
        pool.connect(era_port, aux_neighbour);
        maybe_active(era_port, aux_neighbour, queue);
    }
    pool.free(kind, idx);
}

fn dup_annihilate(pool: &mut Pool, a: u32, b: u32, queue: &mut Queue, stats: &mut Stats) {
    let a1 = pool.neighbour(Port::new(Kind::Dup, a, 1));
    let a2 = pool.neighbour(Port::new(Kind::Dup, a, 2));
    let b1 = pool.neighbour(Port::new(Kind::Dup, b, 1));
    let b2 = pool.neighbour(Port::new(Kind::Dup, b, 2));
    pool.connect(a1, b1);
    maybe_active(a1, b1, queue);
    pool.connect(a2, b2);
    maybe_active(a2, b2, queue);
    pool.free(Kind::Dup, a);
    pool.free(Kind::Dup, b);
    stats.annis += 1;
}

/// `DUP` commuting through an arbitrary agent `x`. Produces two fresh
/// copies of `x` (receiving `d`'s two outputs) and one fresh copy of `d` per
/// auxiliary port of `x` (receiving that port's former neighbour).
///
/// Level bookkeeping is where this stops being a plain commutation and
/// starts being the optimal-reduction oracle:
///
/// - Passing a `DUP` through a `LAM` crosses into a new box, so the fresh
///   duplicators threaded onto the lambda's body/bound wires are minted one
///   level *deeper* than `d` (`d`'s level + 1) — this is the only place new
///   levels are minted at all.
/// - Passing through any other non-`DUP` agent (`APP`/`UOP`/`BOP`/`IF`/
///   `FIX`/`CELL`) keeps `d`'s own level unchanged; no box boundary is
///   crossed.
/// - Passing through a `DUP` of a *different* level is the oracle rule:
///   the two copies that take `x`'s old place swap to `d`'s level, and the
///   fresh duplicators threaded where `d` used to be swap to `x`'s level —
///   each family crosses to the *other* side's level rather than keeping
///   its own, which is what lets a same-level pair meet up and annihilate
///   later instead of commuting forever.
fn dup_commute(pool: &mut Pool, d: Port, x: Port, queue: &mut Queue, stats: &mut Stats) {
    let d_idx = d.index();
    let d_level = pool.dup_level(d_idx);
    let x_kind = x.kind();
    let x_idx = x.index();
    let arity = x_kind.arity();
    let is_oracle = x_kind == Kind::Dup;

    let (x1, x2) = if is_oracle {
        (pool.alloc_dup(d_level), pool.alloc_dup(d_level))
    } else {
        (pool.alloc_like(x_kind, x_idx), pool.alloc_like(x_kind, x_idx))
    };

    let d_p1 = pool.neighbour(Port::new(Kind::Dup, d_idx, 1));
    let d_p2 = pool.neighbour(Port::new(Kind::Dup, d_idx, 2));
    pool.connect(d_p1, Port::principal(x_kind, x1));
    maybe_active(d_p1, Port::principal(x_kind, x1), queue);
    pool.connect(d_p2, Port::principal(x_kind, x2));
    maybe_active(d_p2, Port::principal(x_kind, x2), queue);

    let nd_level = if is_oracle {
        pool.dup_level(x_idx)
    } else if x_kind == Kind::Lam {
        d_level + 1
    } else {
        d_level
    };

    for i in 1..arity {
        let x_aux = pool.neighbour(Port::new(x_kind, x_idx, i));
        let nd = pool.alloc_dup(nd_level);
        let nd_principal = Port::principal(Kind::Dup, nd);
        pool.connect(nd_principal, x_aux);
        maybe_active(nd_principal, x_aux, queue);
        pool.connect(Port::new(x_kind, x1, i), Port::new(Kind::Dup, nd, 1));
        pool.connect(Port::new(x_kind, x2, i), Port::new(Kind::Dup, nd, 2));
    }

    pool.free(Kind::Dup, d_idx);
    pool.free(x_kind, x_idx);

    if is_oracle {
        stats.oracles += 1;
    } else {
        stats.comms += 1;
    }
    if matches!(x_kind, Kind::Lam) {
        stats.dupls += 1;
    }
}

fn beta(pool: &mut Pool, lam_idx: u32, app_idx: u32, queue: &mut Queue, stats: &mut Stats) {
    let body = pool.neighbour(Port::new(Kind::Lam, lam_idx, 1));
    let bound = pool.neighbour(Port::new(Kind::Lam, lam_idx, 2));
    let arg = pool.neighbour(Port::new(Kind::App, app_idx, 1));
    let result = pool.neighbour(Port::new(Kind::App, app_idx, 2));
    pool.connect(bound, arg);
    maybe_active(bound, arg, queue);
    pool.connect(body, result);
    maybe_active(body, result, queue);
    pool.free(Kind::Lam, lam_idx);
    pool.free(Kind::App, app_idx);
    stats.betas += 1;
}

/// `fix(f)` unfolding to `f(fix(f))`, firing the instant `FIX`'s principal
/// port meets any other agent. Shares `f` between a fresh `APP`
/// and a fresh inner `FIX` via a fresh `DUP_0`, rather than duplicating `f`
/// by hand; the ordinary `DUP ⋈ LAM` commutation performs the actual copy
/// once this rewrite schedules that pair.
fn fix_unfold(pool: &mut Pool, fix_idx: u32, queue: &mut Queue) {
    let l_principal = pool.neighbour(Port::new(Kind::Fix, fix_idx, 1));
    let x = pool.neighbour(Port::principal(Kind::Fix, fix_idx));

    let d = pool.alloc_dup(0);
    let a = pool.alloc_app();
    let f2 = pool.alloc_fix();

    let d_principal = Port::principal(Kind::Dup, d);
    let d_p1 = Port::new(Kind::Dup, d, 1);
    let d_p2 = Port::new(Kind::Dup, d, 2);
    let a_principal = Port::principal(Kind::App, a);
    let a_arg = Port::new(Kind::App, a, 1);
    let a_result = Port::new(Kind::App, a, 2);
    let f2_principal = Port::principal(Kind::Fix, f2);
    let f2_body = Port::new(Kind::Fix, f2, 1);

    pool.connect(d_principal, l_principal);
    maybe_active(d_principal, l_principal, queue);
    pool.connect(d_p1, a_principal);
    pool.connect(d_p2, f2_body);
    pool.connect(a_arg, f2_principal);
    pool.connect(a_result, x);
    maybe_active(a_result, x, queue);

    pool.free(Kind::Fix, fix_idx);
}

fn apply_uop(
    pool: &mut Pool,
    uop_idx: u32,
    cell_idx: u32,
    queue: &mut Queue,
    stats: &mut Stats,
) -> Result<(), OptiscopeError> {
    let f = pool.uop_fn(uop_idx);
    let v = pool.cell_value(cell_idx);
    let result = catch_unwind(|| f(v))
        .map_err(|_| OptiscopeError::ForeignCallTrap("unary primitive panicked".into()))?;
    let result_port = pool.neighbour(Port::new(Kind::Uop, uop_idx, 1));
    let new_cell = pool.alloc_cell(result);
    let new_cell_port = Port::principal(Kind::Cell, new_cell);
    pool.connect(new_cell_port, result_port);
    maybe_active(new_cell_port, result_port, queue);
    pool.free(Kind::Uop, uop_idx);
    pool.free(Kind::Cell, cell_idx);
    stats.primitives += 1;
    Ok(())
}

fn stage_bop(pool: &mut Pool, bop_idx: u32, cell_idx: u32, queue: &mut Queue, stats: &mut Stats) {
    let f = pool.bop_fn(bop_idx);
    let v1 = pool.cell_value(cell_idx);
    let second_arg = pool.neighbour(Port::new(Kind::Bop, bop_idx, 1));
    let result = pool.neighbour(Port::new(Kind::Bop, bop_idx, 2));
    let bop1_idx = pool.alloc_bop1(f, v1);
    let bop1_principal = Port::principal(Kind::Bop1, bop1_idx);
    pool.connect(bop1_principal, second_arg);
    maybe_active(bop1_principal, second_arg, queue);
    pool.connect(Port::new(Kind::Bop1, bop1_idx, 1), result);
    pool.free(Kind::Bop, bop_idx);
    pool.free(Kind::Cell, cell_idx);
    stats.primitives += 1;
}

fn apply_bop1(
    pool: &mut Pool,
    bop1_idx: u32,
    cell_idx: u32,
    queue: &mut Queue,
    stats: &mut Stats,
) -> Result<(), OptiscopeError> {
    let f = pool.bop1_fn(bop1_idx);
    let v1 = pool.bop1_value(bop1_idx);
    let v2 = pool.cell_value(cell_idx);
    let result = catch_unwind(|| f(v1, v2))
        .map_err(|_| OptiscopeError::ForeignCallTrap("binary primitive panicked".into()))?;
    let result_port = pool.neighbour(Port::new(Kind::Bop1, bop1_idx, 1));
    let new_cell = pool.alloc_cell(result);
    let new_cell_port = Port::principal(Kind::Cell, new_cell);
    pool.connect(new_cell_port, result_port);
    maybe_active(new_cell_port, result_port, queue);
    pool.free(Kind::Bop1, bop1_idx);
    pool.free(Kind::Cell, cell_idx);
    stats.primitives += 1;
    Ok(())
}

/// Zero is false, any other value is true; the untaken branch is erased
/// wholesale rather than merely dropped, since it may hide live sharing.
fn select_if(pool: &mut Pool, if_idx: u32, cell_idx: u32, queue: &mut Queue, stats: &mut Stats) {
    let v = pool.cell_value(cell_idx);
    let then_port = pool.neighbour(Port::new(Kind::If, if_idx, 1));
    let else_port = pool.neighbour(Port::new(Kind::If, if_idx, 2));
    let result_port = pool.neighbour(Port::new(Kind::If, if_idx, 3));
    let (chosen, discarded) = if v != 0 { (then_port, else_port) } else { (else_port, then_port) };
    pool.connect(chosen, result_port);
    maybe_active(chosen, result_port, queue);
    let era = pool.alloc_era();
    let era_port = Port::principal(Kind::Era, era);
    pool.connect(era_port, discarded);
    maybe_active(era_port, discarded, queue);
    pool.free(Kind::If, if_idx);
    pool.free(Kind::Cell, cell_idx);
    stats.primitives += 1;
}

/// Performs the one rewrite firing at active pair `(a, b)` (both principal,
/// already confirmed connected to each other). Pushes any new active pairs
/// the rewrite exposes onto `queue`.
pub fn interact(
    pool: &mut Pool,
    a: Port,
    b: Port,
    queue: &mut Queue,
    stats: &mut Stats,
) -> Result<(), OptiscopeError> {
    stats.rules += 1;
    let (ka, kb) = (a.kind(), b.kind());

    if ka == Kind::Era || kb == Kind::Era {
        let (era, other) = if ka == Kind::Era { (a, b) } else { (b, a) };
        erase(pool, other, queue);
        pool.free(Kind::Era, era.index());
        return Ok(());
    }

    if ka == Kind::Fix {
        fix_unfold(pool, a.index(), queue);
        return Ok(());
    }
    if kb == Kind::Fix {
        fix_unfold(pool, b.index(), queue);
        return Ok(());
    }

    if ka == Kind::Dup && kb == Kind::Dup {
        if pool.dup_level(a.index()) == pool.dup_level(b.index()) {
            dup_annihilate(pool, a.index(), b.index(), queue, stats);
        } else {
            dup_commute(pool, a, b, queue, stats);
        }
        return Ok(());
    }
    if ka == Kind::Dup {
        dup_commute(pool, a, b, queue, stats);
        return Ok(());
    }
    if kb == Kind::Dup {
        dup_commute(pool, b, a, queue, stats);
        return Ok(());
    }

    match (ka, kb) {
        (Kind::Lam, Kind::App) => beta(pool, a.index(), b.index(), queue, stats),
        (Kind::App, Kind::Lam) => beta(pool, b.index(), a.index(), queue, stats),
        (Kind::Uop, Kind::Cell) => apply_uop(pool, a.index(), b.index(), queue, stats)?,
        (Kind::Cell, Kind::Uop) => apply_uop(pool, b.index(), a.index(), queue, stats)?,
        (Kind::Bop, Kind::Cell) => stage_bop(pool, a.index(), b.index(), queue, stats),
        (Kind::Cell, Kind::Bop) => stage_bop(pool, b.index(), a.index(), queue, stats),
        (Kind::Bop1, Kind::Cell) => apply_bop1(pool, a.index(), b.index(), queue, stats)?,
        (Kind::Cell, Kind::Bop1) => apply_bop1(pool, b.index(), a.index(), queue, stats)?,
        (Kind::If, Kind::Cell) => select_if(pool, a.index(), b.index(), queue, stats),
        (Kind::Cell, Kind::If) => select_if(pool, b.index(), a.index(), queue, stats),
        _ => Fatal::InvariantViolation(format!("no rewrite rule for ({ka:?}, {kb:?})"))
            .abort(release_pool_lock),
    }
    Ok(())
}
