//! The closed set of agent (node) kinds. Dispatch throughout the rewrite
//! engine matches on pairs of `Kind`, never open inheritance.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Kind {
    /// Entry point; never itself participates in a rewrite.
    Root = 0,
    /// Abstraction. p0 principal, p1 body, p2 bound-variable port.
    Lam = 1,
    /// Application. p0 principal (function), p1 argument, p2 result.
    App = 2,
    /// Sharing node at some level. p0 principal, p1/p2 the two copies.
    Dup = 3,
    /// Eraser. p0 principal only.
    Era = 4,
    /// Immutable unboxed value. p0 principal only.
    Cell = 5,
    /// Unary foreign call. p0 principal (argument), p1 result.
    Uop = 6,
    /// Binary foreign call, both arguments pending. p0 principal (first
    /// argument), p1 second argument, p2 result.
    Bop = 7,
    /// Binary foreign call, first argument already absorbed into a `CELL`.
    /// p0 principal (second argument), p1 result.
    Bop1 = 8,
    /// Conditional. p0 principal (scrutinee), p1 then-branch, p2
    /// else-branch, p3 result.
    If = 9,
    /// Fixed point. p0 principal, p1 body.
    Fix = 10,
}

pub const KIND_COUNT: usize = 11;

impl Kind {
    #[inline]
    pub fn from_u8(tag: u8) -> Kind {
        match tag {
            0 => Kind::Root,
            1 => Kind::Lam,
            2 => Kind::App,
            3 => Kind::Dup,
            4 => Kind::Era,
            5 => Kind::Cell,
            6 => Kind::Uop,
            7 => Kind::Bop,
            8 => Kind::Bop1,
            9 => Kind::If,
            10 => Kind::Fix,
            _ => panic!("invariant violation: unknown kind tag {tag}"),
        }
    }

    /// Total port count, including the principal port (port 0).
    #[inline]
    pub fn arity(self) -> u8 {
        match self {
            Kind::Root => 1,
            Kind::Lam => 3,
            Kind::App => 3,
            Kind::Dup => 3,
            Kind::Era => 1,
            Kind::Cell => 1,
            Kind::Uop => 2,
            Kind::Bop => 3,
            Kind::Bop1 => 2,
            Kind::If => 4,
            Kind::Fix => 2,
        }
    }
}

pub type UnaryFn = fn(u64) -> u64;
pub type BinaryFn = fn(u64, u64) -> u64;
