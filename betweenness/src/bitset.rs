use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-size bitset with atomic set, used to track which vertices have dirty
/// delta fields in the current superstep. Allocated once per field at graph
/// load time and cleared at phase boundaries.
#[derive(Debug)]
pub struct AtomicBitSet {
    words: Vec<AtomicU64>,
    len: usize,
}

impl AtomicBitSet {
    pub fn new(len: usize) -> Self {
        let words = (0..(len + 63) / 64).map(|_| AtomicU64::new(0)).collect();
        AtomicBitSet { words, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn set(&self, idx: usize) {
        debug_assert!(idx < self.len);
        self.words[idx / 64].fetch_or(1 << (idx % 64), Ordering::Relaxed);
    }

    pub fn test(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len);
        self.words[idx / 64].load(Ordering::Relaxed) & (1 << (idx % 64)) != 0
    }

    pub fn clear(&self) {
        for word in &self.words {
            word.store(0, Ordering::Relaxed);
        }
    }

    /// Visit every set index in ascending order.
    pub fn for_each_set(&self, mut f: impl FnMut(usize)) {
        for (w, word) in self.words.iter().enumerate() {
            let mut bits = word.load(Ordering::Relaxed);
            while bits != 0 {
                let b = bits.trailing_zeros() as usize;
                f(w * 64 + b);
                bits &= bits - 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_test_clear() {
        let bits = AtomicBitSet::new(130);
        assert!(!bits.test(0));
        bits.set(0);
        bits.set(63);
        bits.set(64);
        bits.set(129);
        assert!(bits.test(0) && bits.test(63) && bits.test(64) && bits.test(129));
        assert!(!bits.test(1));

        let mut seen = vec![];
        bits.for_each_set(|i| seen.push(i));
        assert_eq!(seen, vec![0, 63, 64, 129]);

        bits.clear();
        let mut count = 0;
        bits.for_each_set(|_| count += 1);
        assert_eq!(count, 0);
    }
}
