//! Atomic Bloom filter for fast negative lookups, shared by the answer
//! cache and the block-filter engine's exact-domain index.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct AtomicBloom {
    bits: Vec<AtomicU64>,
    num_bits: usize,
    num_hashes: usize,
}

impl AtomicBloom {
    pub fn new(capacity: usize, fp_rate: f64) -> Self {
        let num_bits = Self::optimal_num_bits(capacity, fp_rate);
        let num_hashes = Self::optimal_num_hashes(capacity, num_bits);
        let num_words = num_bits.div_ceil(64);
        let bits = (0..num_words).map(|_| AtomicU64::new(0)).collect();
        Self {
            bits,
            num_bits,
            num_hashes,
        }
    }

    #[inline]
    pub fn check<K: Hash>(&self, key: &K) -> bool {
        self.hash_key(key).into_iter().all(|bit_idx| {
            let word = self.bits[bit_idx / 64].load(Ordering::Relaxed);
            (word & (1u64 << (bit_idx % 64))) != 0
        })
    }

    #[inline]
    pub fn set<K: Hash>(&self, key: &K) {
        for bit_idx in self.hash_key(key) {
            self.bits[bit_idx / 64].fetch_or(1u64 << (bit_idx % 64), Ordering::Relaxed);
        }
    }

    pub fn clear(&self) {
        for word in &self.bits {
            word.store(0, Ordering::Relaxed);
        }
    }

    fn hash_key<K: Hash>(&self, key: &K) -> Vec<usize> {
        use std::collections::hash_map::DefaultHasher;
        (0..self.num_hashes)
            .map(|i| {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                i.hash(&mut hasher);
                (hasher.finish() as usize) % self.num_bits
            })
            .collect()
    }

    fn optimal_num_bits(capacity: usize, fp_rate: f64) -> usize {
        let m = -1.0 * (capacity as f64) * fp_rate.ln() / (2.0_f64.ln().powi(2));
        m.ceil() as usize
    }

    fn optimal_num_hashes(capacity: usize, num_bits: usize) -> usize {
        let k = (num_bits as f64 / capacity as f64) * 2.0_f64.ln();
        k.ceil().max(1.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_key_is_found() {
        let bloom = AtomicBloom::new(1000, 0.01);
        bloom.set(&"ads.example.com");
        assert!(bloom.check(&"ads.example.com"));
    }

    #[test]
    fn unset_key_usually_absent() {
        let bloom = AtomicBloom::new(1000, 0.01);
        bloom.set(&"ads.example.com");
        assert!(!bloom.check(&"totally-unrelated.example.net"));
    }
}
