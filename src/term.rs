//! Term-construction surface. Variables are identified by binder *identity*
//! rather than by name, so alpha-equivalent terms sharing no binders are
//! never confused even if their source names collide.

use std::rc::Rc;

use crate::agent::{BinaryFn, UnaryFn};

/// Identifies one `lambda` binder. Two `Var`s reference the same binder iff
/// their `Binder` handles are `Rc::ptr_eq`.
#[derive(Clone)]
pub struct Binder(Rc<()>);

impl Binder {
    pub fn new() -> Binder {
        Binder(Rc::new(()))
    }

    fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl Default for Binder {
    fn default() -> Self {
        Binder::new()
    }
}

impl PartialEq for Binder {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Binder {}

impl std::hash::Hash for Binder {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:x}", self.id())
    }
}

/// A lambda term, as consumed by the net builder. Built via the free
/// functions below rather than constructed directly.
#[derive(Clone)]
pub enum Term {
    Var(Binder),
    Lam(Binder, Rc<Term>),
    App(Rc<Term>, Rc<Term>),
    Cell(u64),
    UnaryCall(UnaryFn, Rc<Term>),
    BinaryCall(BinaryFn, Rc<Term>, Rc<Term>),
    IfThenElse(Rc<Term>, Rc<Term>, Rc<Term>),
    Fix(Rc<Term>),
}

pub fn var(b: &Binder) -> Rc<Term> {
    Rc::new(Term::Var(b.clone()))
}

pub fn lambda(b: Binder, body: Rc<Term>) -> Rc<Term> {
    Rc::new(Term::Lam(b, body))
}

/// Builds a `lambda` with a fresh binder, passing it to `body` to construct
/// occurrences. The ergonomic counterpart of a `lambda(x, ...)` macro
/// pattern, adapted to
/// Rust closures since Rust has no out-parameter binder sugar.
pub fn lam(body: impl FnOnce(&Binder) -> Rc<Term>) -> Rc<Term> {
    let b = Binder::new();
    let inner = body(&b);
    lambda(b, inner)
}

pub fn apply(f: Rc<Term>, a: Rc<Term>) -> Rc<Term> {
    Rc::new(Term::App(f, a))
}

pub fn cell(v: u64) -> Rc<Term> {
    Rc::new(Term::Cell(v))
}

pub fn unary_call(f: UnaryFn, x: Rc<Term>) -> Rc<Term> {
    Rc::new(Term::UnaryCall(f, x))
}

pub fn binary_call(f: BinaryFn, x: Rc<Term>, y: Rc<Term>) -> Rc<Term> {
    Rc::new(Term::BinaryCall(f, x, y))
}

pub fn if_then_else(c: Rc<Term>, t: Rc<Term>, e: Rc<Term>) -> Rc<Term> {
    Rc::new(Term::IfThenElse(c, t, e))
}

pub fn fix(body: Rc<Term>) -> Rc<Term> {
    Rc::new(Term::Fix(body))
}

/// The result of readback: a de Bruijn-indexed lambda term, distinct from
/// [`Term`] because it additionally has to represent *stuck* primitive
/// agents that can never appear in a builder-constructed input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Normal {
    Var(u32),
    Lam(Box<Normal>),
    App(Box<Normal>, Box<Normal>),
    Cell(u64),
    StuckUop,
    StuckBop,
    StuckIf,
    StuckFix,
}
