//! Deterministic split-key randomness for self-play and sampling.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same root seed produces identical keys and draws
//! - **Linear**: `RngKey::split` consumes the key, so a key value cannot be
//!   reused after children are derived from it (unless explicitly cloned)
//! - **Serializable**: Keys are plain values and can be stored in snapshots
//!
//! ## Usage
//!
//! ```
//! use rust_muzero_loop::core::RngKey;
//!
//! let key = RngKey::new(42);
//!
//! // Continuation key for later decisions, leaf key for this one
//! let (key, leaf) = key.split();
//! let action = leaf.into_rng().gen_range_usize(0..4);
//! assert!(action < 4);
//!
//! // Same root seed = same keys
//! assert_eq!(RngKey::new(42).split().0, key);
//! ```

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A purely functional random key.
///
/// Keys are not `Copy`: deriving children moves the parent. Reusing a key on
/// purpose (e.g. the evaluation key) requires an explicit `clone()`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RngKey(u64);

impl RngKey {
    /// Create a root key from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Raw key value.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Split into `(continuation, leaf)`.
    #[must_use]
    pub fn split(self) -> (RngKey, RngKey) {
        let [continuation, leaf] = self.split_n();
        (continuation, leaf)
    }

    /// Split into three independent keys.
    #[must_use]
    pub fn split3(self) -> (RngKey, RngKey, RngKey) {
        let [a, b, c] = self.split_n();
        (a, b, c)
    }

    /// Split into `N` independent keys.
    ///
    /// Children are drawn from a ChaCha8 stream seeded by the parent, so the
    /// first child of `split_n::<2>` equals the first child of `split_n::<3>`.
    #[must_use]
    pub fn split_n<const N: usize>(self) -> [RngKey; N] {
        let mut stream = ChaCha8Rng::seed_from_u64(self.0);
        std::array::from_fn(|_| RngKey(stream.next_u64()))
    }

    /// Turn a leaf key into a sampling stream.
    #[must_use]
    pub fn into_rng(self) -> KeyRng {
        KeyRng::from_key(self)
    }
}

/// Sampling stream derived from a leaf key.
///
/// Uses ChaCha8 for speed while keeping draws reproducible across platforms.
#[derive(Clone, Debug)]
pub struct KeyRng {
    inner: ChaCha8Rng,
}

impl KeyRng {
    fn from_key(key: RngKey) -> Self {
        // Offset the seed so the stream differs from the key's own split stream.
        Self {
            inner: ChaCha8Rng::seed_from_u64(key.0 ^ 0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Generate a uniform float in `[0, 1)`.
    pub fn gen_unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Choose an index with probability proportional to `weights`.
    ///
    /// Weights do not need to sum to 1.0. Returns `None` if weights are
    /// empty or sum to zero.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }

        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return None;
        }

        let mut threshold = self.gen_unit() * total;
        let mut last_positive = None;

        for (i, &weight) in weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            last_positive = Some(i);
            threshold -= weight;
            if threshold < 0.0 {
                return Some(i);
            }
        }

        // Floating point edge case
        last_positive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_deterministic() {
        let (a1, b1) = RngKey::new(42).split();
        let (a2, b2) = RngKey::new(42).split();

        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
    }

    #[test]
    fn test_split_children_differ() {
        let (a, b, c) = RngKey::new(7).split3();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
        assert_ne!(a, RngKey::new(7));
    }

    #[test]
    fn test_split_prefix_stable() {
        let [a2, _] = RngKey::new(3).split_n::<2>();
        let [a3, _, _] = RngKey::new(3).split_n::<3>();

        assert_eq!(a2, a3);
    }

    #[test]
    fn test_different_seeds() {
        let (a, _) = RngKey::new(1).split();
        let (b, _) = RngKey::new(2).split();

        assert_ne!(a, b);
    }

    #[test]
    fn test_key_stream_reproducible() {
        let mut r1 = RngKey::new(99).into_rng();
        let mut r2 = RngKey::new(99).into_rng();

        for _ in 0..50 {
            assert_eq!(r1.gen_range_usize(0..1000), r2.gen_range_usize(0..1000));
        }
    }

    #[test]
    fn test_chained_splits_never_repeat() {
        let mut key = RngKey::new(0);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..1000 {
            let (next, leaf) = key.split();
            assert!(seen.insert(leaf.raw()));
            key = next;
        }
    }

    #[test]
    fn test_choose_weighted() {
        let mut rng = RngKey::new(42).into_rng();

        let weights = vec![100.0, 0.0, 0.0];
        for _ in 0..10 {
            assert_eq!(rng.choose_weighted(&weights), Some(0));
        }

        // Zero-weight entries are never chosen
        let weights = vec![0.0, 1.0, 0.0, 1.0];
        for _ in 0..50 {
            let i = rng.choose_weighted(&weights).unwrap();
            assert!(i == 1 || i == 3);
        }

        assert_eq!(rng.choose_weighted(&[]), None);
        assert_eq!(rng.choose_weighted(&[0.0, 0.0]), None);
    }

    #[test]
    fn test_choose_weighted_is_proportional() {
        let mut rng = RngKey::new(5).into_rng();
        let weights = [1.0, 3.0];
        let mut counts = [0usize; 2];

        for _ in 0..4000 {
            counts[rng.choose_weighted(&weights).unwrap()] += 1;
        }

        let ratio = counts[1] as f64 / counts[0] as f64;
        assert!(ratio > 2.5 && ratio < 3.5, "ratio was {}", ratio);
    }

    #[test]
    fn test_key_serde() {
        let key = RngKey::new(12345);
        let json = serde_json::to_string(&key).unwrap();
        let deserialized: RngKey = serde_json::from_str(&json).unwrap();

        assert_eq!(key, deserialized);
    }
}
