use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Unreached marker; a quarter of the integer range so `dist + 1` cannot wrap.
pub const INF: u32 = u32::MAX / 4;

/// An `f32` cell updatable from many worker threads at once.
///
/// There is no `AtomicF32` in the standard library, so additions go through a
/// compare-exchange loop over the raw bit pattern.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(val: f32) -> Self {
        AtomicF32(AtomicU32::new(val.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, val: f32) {
        self.0.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn fetch_add(&self, val: f32) {
        let mut cur = self.0.load(Ordering::Relaxed);
        loop {
            let new = (f32::from_bits(cur) + val).to_bits();
            match self
                .0
                .compare_exchange_weak(cur, new, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(seen) => cur = seen,
            }
        }
    }

    pub fn load_raw(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn store_raw(&self, raw: u32) {
        self.0.store(raw, Ordering::Relaxed);
    }

    pub fn take_raw(&self) -> u32 {
        self.0.swap(0f32.to_bits(), Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenState {
    /// Not yet allowed to feed its neighbors.
    Waiting = 0,
    /// Value finalized; neighbors may consume it this round.
    Ready = 1,
    /// Consumed; must not emit again.
    Done = 2,
}

/// One-shot per-phase propagation token.
#[derive(Debug, Default)]
pub struct Token(AtomicU8);

impl Token {
    pub fn load(&self) -> TokenState {
        match self.0.load(Ordering::Relaxed) {
            0 => TokenState::Waiting,
            1 => TokenState::Ready,
            _ => TokenState::Done,
        }
    }

    pub fn store(&self, state: TokenState) {
        self.0.store(state as u8, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.load() == TokenState::Ready
    }
}

/// Per-vertex scalars and delta buffers.
///
/// Every PE holds one entry per global vertex; the canonical fields (`dist`,
/// `sigma`, `npred`, `nsucc`, `delta`, `bc`) converge across PEs because the
/// delta buffers (`trim`, `to_add`, `trim2`, `to_add_f`) are reconciled at
/// superstep boundaries and then folded in identically everywhere.
#[derive(Debug)]
pub struct VertexState {
    pub dist: AtomicU32,
    pub sigma: AtomicU32,
    pub npred: AtomicU32,
    pub nsucc: AtomicU32,
    pub delta: AtomicF32,
    pub bc: AtomicF32,

    pub trim: AtomicU32,
    pub to_add: AtomicU32,
    pub trim2: AtomicU32,
    pub to_add_f: AtomicF32,

    pub sp_token: Token,
    pub dep_token: Token,
}

impl VertexState {
    pub fn new() -> Self {
        VertexState {
            dist: AtomicU32::new(INF),
            sigma: AtomicU32::new(0),
            npred: AtomicU32::new(0),
            nsucc: AtomicU32::new(0),
            delta: AtomicF32::new(0.0),
            bc: AtomicF32::new(0.0),
            trim: AtomicU32::new(0),
            to_add: AtomicU32::new(0),
            trim2: AtomicU32::new(0),
            to_add_f: AtomicF32::new(0.0),
            sp_token: Token::default(),
            dep_token: Token::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_f32_add() {
        let cell = AtomicF32::new(1.5);
        cell.fetch_add(2.25);
        assert_eq!(cell.load(), 3.75);
        assert_eq!(f32::from_bits(cell.take_raw()), 3.75);
        assert_eq!(cell.load(), 0.0);
    }

    #[test]
    fn token_transitions() {
        let token = Token::default();
        assert_eq!(token.load(), TokenState::Waiting);
        token.store(TokenState::Ready);
        assert!(token.is_ready());
        token.store(TokenState::Done);
        assert_eq!(token.load(), TokenState::Done);
        assert!(!token.is_ready());
    }

    #[test]
    fn inf_addition_is_safe() {
        assert!(INF + 1 > INF);
        assert!(1 + INF < u32::MAX);
    }
}
