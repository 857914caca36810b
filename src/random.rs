//! Random sampling helpers.
//!
//! All randomness is drawn from a caller-supplied generator, so a fixed
//! seed reproduces a run exactly.
//!
//! # Reference
//! Bentley & Floyd (1987), "Programming Pearls: A Sample of Brilliance"

use std::collections::BTreeSet;

use rand::Rng;

/// Samples `k` distinct indices from `[0, n)`, returned in increasing order.
///
/// Uses Floyd's algorithm: `k` draws regardless of `n`, every `k`-subset
/// equally likely.
///
/// # Panics
/// Panics if `k > n`.
pub fn sample_floyd<R: Rng>(k: usize, n: usize, rng: &mut R) -> Vec<usize> {
    assert!(k <= n, "cannot sample {k} of {n}");
    let mut chosen = BTreeSet::new();
    for u in (n - k)..n {
        let t = rng.random_range(0..=u);
        if !chosen.insert(t) {
            chosen.insert(u);
        }
    }
    chosen.into_iter().collect()
}

/// Uniform draw from `[0, 1)`.
#[inline]
pub fn uniform<R: Rng>(rng: &mut R) -> f64 {
    rng.random::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_sample_is_sorted_and_distinct() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            let s = sample_floyd(5, 12, &mut rng);
            assert_eq!(s.len(), 5);
            assert!(s.windows(2).all(|w| w[0] < w[1]));
            assert!(s.iter().all(|&i| i < 12));
        }
    }

    #[test]
    fn test_sample_everything() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(sample_floyd(4, 4, &mut rng), vec![0, 1, 2, 3]);
        assert!(sample_floyd(0, 4, &mut rng).is_empty());
    }

    #[test]
    fn test_sample_covers_all_indices() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut seen = [false; 6];
        for _ in 0..200 {
            for i in sample_floyd(2, 6, &mut rng) {
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..1000 {
            let u = uniform(&mut rng);
            assert!((0.0..1.0).contains(&u));
        }
    }
}
