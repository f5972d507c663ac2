//! Net builder. Threads an `up` port down through the recursion, has `Var`
//! just echo it back, and defers all real wiring of variable occurrences to
//! a final pass over a flat `vars` list. Variables here are ordinary
//! (non-affine): occurrences are grouped per binder and threaded through a
//! fan-in tree of `DUP_0` nodes instead of requiring exactly one use.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::agent::Kind;
use crate::error::OptiscopeError;
use crate::pool::Pool;
use crate::port::{is_active_pair, Port};
use crate::term::{Binder, Term};

struct Ctx {
    in_scope: HashSet<Binder>,
    bound_ports: HashMap<Binder, Port>,
    occurrences: Vec<(Binder, Port)>,
    active_pairs: Vec<(Port, Port)>,
}

/// Connects `a` and `b`, recording the pair as an initial redex if the wire
/// happens to join two principal ports directly (e.g. `(\x. x) 5` wires an
/// `APP`'s function port straight to a `LAM`'s principal port, with no
/// rewrite needed to expose it).
fn wire(pool: &mut Pool, ctx: &mut Ctx, a: Port, b: Port) {
    pool.connect(a, b);
    if is_active_pair(a, b) {
        ctx.active_pairs.push((a, b));
    }
}

fn encode(pool: &mut Pool, term: &Term, ctx: &mut Ctx, up: Port) -> Result<Port, OptiscopeError> {
    match term {
        Term::Var(b) => {
            if !ctx.in_scope.contains(b) {
                return Err(OptiscopeError::InvalidTerm(
                    "free variable: used outside the lambda that binds it".into(),
                ));
            }
            ctx.occurrences.push((b.clone(), up));
            Ok(up)
        }
        Term::Lam(b, body) => {
            let node = pool.alloc_lam();
            ctx.bound_ports.insert(b.clone(), Port::new(Kind::Lam, node, 2));
            ctx.in_scope.insert(b.clone());
            let bod_port = Port::new(Kind::Lam, node, 1);
            let bod_val = encode(pool, body, ctx, bod_port)?;
            wire(pool, ctx, bod_port, bod_val);
            ctx.in_scope.remove(b);
            Ok(Port::principal(Kind::Lam, node))
        }
        Term::App(f, a) => {
            let node = pool.alloc_app();
            let fun_port = Port::principal(Kind::App, node);
            let fun_val = encode(pool, f, ctx, fun_port)?;
            wire(pool, ctx, fun_port, fun_val);
            let arg_port = Port::new(Kind::App, node, 1);
            let arg_val = encode(pool, a, ctx, arg_port)?;
            wire(pool, ctx, arg_port, arg_val);
            Ok(Port::new(Kind::App, node, 2))
        }
        Term::Cell(v) => {
            let node = pool.alloc_cell(*v);
            Ok(Port::principal(Kind::Cell, node))
        }
        Term::UnaryCall(f, x) => {
            let node = pool.alloc_uop(*f);
            let arg_port = Port::principal(Kind::Uop, node);
            let arg_val = encode(pool, x, ctx, arg_port)?;
            wire(pool, ctx, arg_port, arg_val);
            Ok(Port::new(Kind::Uop, node, 1))
        }
        Term::BinaryCall(f, x, y) => {
            let node = pool.alloc_bop(*f);
            let p0 = Port::principal(Kind::Bop, node);
            let x_val = encode(pool, x, ctx, p0)?;
            wire(pool, ctx, p0, x_val);
            let p1 = Port::new(Kind::Bop, node, 1);
            let y_val = encode(pool, y, ctx, p1)?;
            wire(pool, ctx, p1, y_val);
            Ok(Port::new(Kind::Bop, node, 2))
        }
        Term::IfThenElse(c, t, e) => {
            let node = pool.alloc_if();
            let p0 = Port::principal(Kind::If, node);
            let c_val = encode(pool, c, ctx, p0)?;
            wire(pool, ctx, p0, c_val);
            let p1 = Port::new(Kind::If, node, 1);
            let t_val = encode(pool, t, ctx, p1)?;
            wire(pool, ctx, p1, t_val);
            let p2 = Port::new(Kind::If, node, 2);
            let e_val = encode(pool, e, ctx, p2)?;
            wire(pool, ctx, p2, e_val);
            Ok(Port::new(Kind::If, node, 3))
        }
        Term::Fix(body) => {
            if !matches!(body.as_ref(), Term::Lam(..)) {
                return Err(OptiscopeError::InvalidTerm(
                    "malformed fix: argument must be a lambda".into(),
                ));
            }
            let node = pool.alloc_fix();
            let p1 = Port::new(Kind::Fix, node, 1);
            let body_val = encode(pool, body, ctx, p1)?;
            wire(pool, ctx, p1, body_val);
            Ok(Port::principal(Kind::Fix, node))
        }
    }
}

/// Wires a binder's bound port to its occurrences, inserting a right-leaning
/// chain of `DUP_0` nodes when there is more than one, an `ERA` when
/// there are none, and a direct wire when there is exactly one.
fn fan_in(pool: &mut Pool, ctx: &mut Ctx, bound: Port, occurrences: &[Port]) {
    match occurrences {
        [] => {
            let era = pool.alloc_era();
            wire(pool, ctx, bound, Port::principal(Kind::Era, era));
        }
        [only] => wire(pool, ctx, bound, *only),
        [first, rest @ ..] => {
            let dup = pool.alloc_dup(0);
            wire(pool, ctx, bound, Port::principal(Kind::Dup, dup));
            wire(pool, ctx, Port::new(Kind::Dup, dup, 1), *first);
            fan_in(pool, ctx, Port::new(Kind::Dup, dup, 2), rest);
        }
    }
}

/// Translates a term tree into a net, wiring `ROOT` to its top.
/// Returns the `ROOT` node's index together with any active pairs the
/// construction itself exposed (e.g. `(\x. x) 5` wires an `APP` straight
/// onto a `LAM` with no rewrite needed first).
pub fn build_net(pool: &mut Pool, term: &Rc<Term>) -> Result<(u32, Vec<(Port, Port)>), OptiscopeError> {
    let root = pool.alloc_root();
    let root_port = Port::principal(Kind::Root, root);
    let mut ctx = Ctx {
        in_scope: HashSet::new(),
        bound_ports: HashMap::new(),
        occurrences: Vec::new(),
        active_pairs: Vec::new(),
    };
    let value = encode(pool, term, &mut ctx, root_port)?;
    pool.connect(root_port, value); // ROOT never forms an active pair

    let mut grouped: HashMap<Binder, Vec<Port>> = HashMap::new();
    let occurrences = std::mem::take(&mut ctx.occurrences);
    for (b, port) in occurrences {
        grouped.entry(b).or_default().push(port);
    }
    let bound_ports: Vec<(Binder, Port)> = std::mem::take(&mut ctx.bound_ports).into_iter().collect();
    for (b, bound) in &bound_ports {
        let occ = grouped.remove(b).unwrap_or_default();
        fan_in(pool, &mut ctx, *bound, &occ);
    }
    Ok((root, ctx.active_pairs))
}
