//! Node pool: one growable arena per agent kind, each with an embedded free
//! list, handing out stable `u32` indices. One arena per kind rather than a
//! single shared arena, since several kinds here carry payload beyond ports
//! (a `DUP`'s level, a cell's value, a primitive's function pointer) that
//! would otherwise waste space in every other kind's slots.

use crate::agent::{BinaryFn, Kind, UnaryFn};
use crate::error::Fatal;
use crate::port::Port;

const MAX_NODES_PER_KIND: usize = 1 << 40;

/// Releases the re-entry lock without going through a live [`PoolGuard`].
/// The best-effort "close" a [`Fatal`] condition runs before aborting: the
/// process is about to exit either way, so there is nothing further to
/// reclaim, but a re-entrant `open()` from, say, a `catch_unwind` boundary
/// higher up should not find the lock held by a pool that is never coming
/// back.
pub(crate) fn release_pool_lock() {
    POOL_OPEN.store(false, Ordering::SeqCst);
}

struct Arena<T> {
    slots: Vec<T>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Arena { slots: Vec::new(), free: Vec::new() }
    }

    fn alloc(&mut self, make: impl FnOnce() -> T) -> u32 {
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = make();
            index
        } else {
            if self.slots.len() >= MAX_NODES_PER_KIND {
                Fatal::PoolExhausted.abort(release_pool_lock);
            }
            let index = self.slots.len() as u32;
            self.slots.push(make());
            index
        }
    }

    fn free(&mut self, index: u32) {
        self.free.push(index);
    }

    #[inline]
    fn get(&self, index: u32) -> &T {
        &self.slots[index as usize]
    }

    #[inline]
    fn get_mut(&mut self, index: u32) -> &mut T {
        &mut self.slots[index as usize]
    }
}

#[derive(Clone, Copy)]
struct RootSlot {
    port: Port,
}

#[derive(Clone, Copy)]
struct LamSlot {
    ports: [Port; 3],
}

#[derive(Clone, Copy)]
struct AppSlot {
    ports: [Port; 3],
}

#[derive(Clone, Copy)]
struct DupSlot {
    ports: [Port; 3],
    level: u32,
}

#[derive(Clone, Copy)]
struct EraSlot {
    port: Port,
}

#[derive(Clone, Copy)]
struct CellSlot {
    port: Port,
    value: u64,
}

#[derive(Clone, Copy)]
struct UopSlot {
    ports: [Port; 2],
    f: UnaryFn,
}

#[derive(Clone, Copy)]
struct BopSlot {
    ports: [Port; 3],
    f: BinaryFn,
}

#[derive(Clone, Copy)]
struct Bop1Slot {
    ports: [Port; 2],
    f: BinaryFn,
    value: u64,
}

#[derive(Clone, Copy)]
struct IfSlot {
    ports: [Port; 4],
}

#[derive(Clone, Copy)]
struct FixSlot {
    ports: [Port; 2],
}

/// The node pool set, the sole resource shared across a reduction.
/// Constructed only via [`PoolGuard::open`], which enforces the no-reentry
/// rule.
pub struct Pool {
    root: Arena<RootSlot>,
    lam: Arena<LamSlot>,
    app: Arena<AppSlot>,
    dup: Arena<DupSlot>,
    era: Arena<EraSlot>,
    cell: Arena<CellSlot>,
    uop: Arena<UopSlot>,
    bop: Arena<BopSlot>,
    bop1: Arena<Bop1Slot>,
    r#if: Arena<IfSlot>,
    fix: Arena<FixSlot>,
}

impl Pool {
    fn new() -> Self {
        Pool {
            root: Arena::new(),
            lam: Arena::new(),
            app: Arena::new(),
            dup: Arena::new(),
            era: Arena::new(),
            cell: Arena::new(),
            uop: Arena::new(),
            bop: Arena::new(),
            bop1: Arena::new(),
            r#if: Arena::new(),
            fix: Arena::new(),
        }
    }

    pub fn alloc_root(&mut self) -> u32 {
        let idx = self.root.alloc(|| RootSlot { port: Port::new(Kind::Root, 0, 0) });
        self.root.get_mut(idx).port = Port::principal(Kind::Root, idx);
        idx
    }

    pub fn alloc_lam(&mut self) -> u32 {
        let idx = self.lam.alloc(|| LamSlot { ports: [Port::principal(Kind::Lam, 0); 3] });
        let p = [0, 1, 2].map(|i| Port::new(Kind::Lam, idx, i));
        self.lam.get_mut(idx).ports = p;
        idx
    }

    pub fn alloc_app(&mut self) -> u32 {
        let idx = self.app.alloc(|| AppSlot { ports: [Port::principal(Kind::App, 0); 3] });
        let p = [0, 1, 2].map(|i| Port::new(Kind::App, idx, i));
        self.app.get_mut(idx).ports = p;
        idx
    }

    pub fn alloc_dup(&mut self, level: u32) -> u32 {
        let idx = self
            .dup
            .alloc(|| DupSlot { ports: [Port::principal(Kind::Dup, 0); 3], level: 0 });
        let p = [0, 1, 2].map(|i| Port::new(Kind::Dup, idx, i));
        let slot = self.dup.get_mut(idx);
        slot.ports = p;
        slot.level = level;
        idx
    }

    pub fn alloc_era(&mut self) -> u32 {
        let idx = self.era.alloc(|| EraSlot { port: Port::principal(Kind::Era, 0) });
        self.era.get_mut(idx).port = Port::principal(Kind::Era, idx);
        idx
    }

    pub fn alloc_cell(&mut self, value: u64) -> u32 {
        let idx = self.cell.alloc(|| CellSlot { port: Port::principal(Kind::Cell, 0), value: 0 });
        let slot = self.cell.get_mut(idx);
        slot.port = Port::principal(Kind::Cell, idx);
        slot.value = value;
        idx
    }

    pub fn alloc_uop(&mut self, f: UnaryFn) -> u32 {
        let idx = self.uop.alloc(|| UopSlot { ports: [Port::principal(Kind::Uop, 0); 2], f });
        let p = [0, 1].map(|i| Port::new(Kind::Uop, idx, i));
        let slot = self.uop.get_mut(idx);
        slot.ports = p;
        slot.f = f;
        idx
    }

    pub fn alloc_bop(&mut self, f: BinaryFn) -> u32 {
        let idx = self.bop.alloc(|| BopSlot { ports: [Port::principal(Kind::Bop, 0); 3], f });
        let p = [0, 1, 2].map(|i| Port::new(Kind::Bop, idx, i));
        let slot = self.bop.get_mut(idx);
        slot.ports = p;
        slot.f = f;
        idx
    }

    pub fn alloc_bop1(&mut self, f: BinaryFn, value: u64) -> u32 {
        let idx = self
            .bop1
            .alloc(|| Bop1Slot { ports: [Port::principal(Kind::Bop1, 0); 2], f, value: 0 });
        let p = [0, 1].map(|i| Port::new(Kind::Bop1, idx, i));
        let slot = self.bop1.get_mut(idx);
        slot.ports = p;
        slot.f = f;
        slot.value = value;
        idx
    }

    pub fn alloc_if(&mut self) -> u32 {
        let idx = self.r#if.alloc(|| IfSlot { ports: [Port::principal(Kind::If, 0); 4] });
        let p = [0, 1, 2, 3].map(|i| Port::new(Kind::If, idx, i));
        self.r#if.get_mut(idx).ports = p;
        idx
    }

    pub fn alloc_fix(&mut self) -> u32 {
        let idx = self.fix.alloc(|| FixSlot { ports: [Port::principal(Kind::Fix, 0); 2] });
        let p = [0, 1].map(|i| Port::new(Kind::Fix, idx, i));
        self.fix.get_mut(idx).ports = p;
        idx
    }

    /// Allocates a fresh node of `kind`, copying whatever non-port payload
    /// `src` carries (a `DUP`'s level, a `CELL`'s value, a primitive's
    /// function pointer). Used by the generic commutation rule (`DUP`
    /// passing through an arbitrary agent) to produce a same-shaped copy.
    pub fn alloc_like(&mut self, kind: Kind, src: u32) -> u32 {
        match kind {
            Kind::Root => panic!("invariant violation: ROOT is never duplicated"),
            Kind::Lam => self.alloc_lam(),
            Kind::App => self.alloc_app(),
            Kind::Dup => {
                let level = self.dup.get(src).level;
                self.alloc_dup(level)
            }
            Kind::Era => self.alloc_era(),
            Kind::Cell => {
                let value = self.cell.get(src).value;
                self.alloc_cell(value)
            }
            Kind::Uop => {
                let f = self.uop.get(src).f;
                self.alloc_uop(f)
            }
            Kind::Bop => {
                let f = self.bop.get(src).f;
                self.alloc_bop(f)
            }
            Kind::Bop1 => {
                let slot = *self.bop1.get(src);
                self.alloc_bop1(slot.f, slot.value)
            }
            Kind::If => self.alloc_if(),
            Kind::Fix => self.alloc_fix(),
        }
    }

    pub fn free(&mut self, kind: Kind, index: u32) {
        match kind {
            Kind::Root => panic!("invariant violation: ROOT is never freed"),
            Kind::Lam => self.lam.free(index),
            Kind::App => self.app.free(index),
            Kind::Dup => self.dup.free(index),
            Kind::Era => self.era.free(index),
            Kind::Cell => self.cell.free(index),
            Kind::Uop => self.uop.free(index),
            Kind::Bop => self.bop.free(index),
            Kind::Bop1 => self.bop1.free(index),
            Kind::If => self.r#if.free(index),
            Kind::Fix => self.fix.free(index),
        }
    }

    /// Reads the port stored at `(kind, index, port)`, i.e. that port's
    /// current neighbour.
    #[inline]
    pub fn get_port(&self, kind: Kind, index: u32, port: u8) -> Port {
        match kind {
            Kind::Root => self.root.get(index).port,
            Kind::Lam => self.lam.get(index).ports[port as usize],
            Kind::App => self.app.get(index).ports[port as usize],
            Kind::Dup => self.dup.get(index).ports[port as usize],
            Kind::Era => self.era.get(index).port,
            Kind::Cell => self.cell.get(index).port,
            Kind::Uop => self.uop.get(index).ports[port as usize],
            Kind::Bop => self.bop.get(index).ports[port as usize],
            Kind::Bop1 => self.bop1.get(index).ports[port as usize],
            Kind::If => self.r#if.get(index).ports[port as usize],
            Kind::Fix => self.fix.get(index).ports[port as usize],
        }
    }

    #[inline]
    fn set_port(&mut self, kind: Kind, index: u32, port: u8, value: Port) {
        match kind {
            Kind::Root => self.root.get_mut(index).port = value,
            Kind::Lam => self.lam.get_mut(index).ports[port as usize] = value,
            Kind::App => self.app.get_mut(index).ports[port as usize] = value,
            Kind::Dup => self.dup.get_mut(index).ports[port as usize] = value,
            Kind::Era => self.era.get_mut(index).port = value,
            Kind::Cell => self.cell.get_mut(index).port = value,
            Kind::Uop => self.uop.get_mut(index).ports[port as usize] = value,
            Kind::Bop => self.bop.get_mut(index).ports[port as usize] = value,
            Kind::Bop1 => self.bop1.get_mut(index).ports[port as usize] = value,
            Kind::If => self.r#if.get_mut(index).ports[port as usize] = value,
            Kind::Fix => self.fix.get_mut(index).ports[port as usize] = value,
        }
    }

    /// O(1) `neighbour(port) -> port` via a single array read.
    #[inline]
    pub fn neighbour(&self, port: Port) -> Port {
        self.get_port(port.kind(), port.index(), port.port())
    }

    /// The only primitive the rewrite engine uses to rewire the net.
    #[inline]
    pub fn connect(&mut self, a: Port, b: Port) {
        self.set_port(a.kind(), a.index(), a.port(), b);
        self.set_port(b.kind(), b.index(), b.port(), a);
    }

    pub fn dup_level(&self, index: u32) -> u32 {
        self.dup.get(index).level
    }

    pub fn cell_value(&self, index: u32) -> u64 {
        self.cell.get(index).value
    }

    pub fn uop_fn(&self, index: u32) -> UnaryFn {
        self.uop.get(index).f
    }

    pub fn bop_fn(&self, index: u32) -> BinaryFn {
        self.bop.get(index).f
    }

    pub fn bop1_fn(&self, index: u32) -> BinaryFn {
        self.bop1.get(index).f
    }

    pub fn bop1_value(&self, index: u32) -> u64 {
        self.bop1.get(index).value
    }
}

/// Scoped acquisition of the node-pool set.
/// Re-entry (opening a second guard while one is live) is a fatal
/// programming error; the guard's `Drop` impl guarantees release on every
/// exit path, including unwinding out of a failed rewrite.
pub struct PoolGuard {
    pool: Option<Pool>,
}

use std::sync::atomic::{AtomicBool, Ordering};
static POOL_OPEN: AtomicBool = AtomicBool::new(false);

impl PoolGuard {
    pub fn open() -> PoolGuard {
        if POOL_OPEN.swap(true, Ordering::SeqCst) {
            panic!("invariant violation: pool already open (re-entry is forbidden)");
        }
        PoolGuard { pool: Some(Pool::new()) }
    }

    pub fn pool(&mut self) -> &mut Pool {
        self.pool.as_mut().expect("pool used after close")
    }

    /// Idempotent after the first call; also run implicitly by `Drop`.
    pub fn close(&mut self) {
        self.pool = None;
        POOL_OPEN.store(false, Ordering::SeqCst);
    }
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        if self.pool.is_some() {
            self.close();
        }
    }
}
