//! Fair-draw selector
//!
//! Partial Fisher-Yates over the first `k` positions, driven by the operating
//! system's random source. Every ordered k-subset of the pool is equally likely
//! and the result keeps selection order.

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng};

/// Pick `k` distinct items uniformly at random, in selection order
///
/// `k` is clamped to the pool size.
pub fn select<T: Clone>(pool: &[T], k: usize) -> Vec<T> {
    select_with(&mut OsRng, pool, k)
}

/// [`select`] with an explicit cryptographic random source
pub fn select_with<T, R>(rng: &mut R, pool: &[T], k: usize) -> Vec<T>
where
    T: Clone,
    R: Rng + CryptoRng,
{
    let n = pool.len();
    let k = k.min(n);
    let mut indices: Vec<usize> = (0..n).collect();

    for i in 0..k {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }

    indices[..k].iter().map(|&i| pool[i].clone()).collect()
}
