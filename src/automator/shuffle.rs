//! Seeded, reproducible reordering of the run list.
//!
//! The permutation is a fixed recurrence over the full list length rather
//! than a textbook Fisher-Yates, evaluated in `f64` the way recorded seeds
//! were produced. Changing either the recurrence or the arithmetic changes
//! which order a seed selects.

/// Mersenne prime driving the index recurrence.
pub const SHUFFLE_PRIME: u64 = 2_147_483_647;

/// Permute `items` in place, deterministically in (`items`, `seed`).
///
/// For `i` from `len` down to 1, swaps `i - 1` with
/// `(SHUFFLE_PRIME^i + seed) % len` computed in double precision. Once the
/// power overflows (`i` above 33) or the sum goes negative there is no valid
/// index, and that swap is skipped.
pub fn shuffle<T>(items: &mut [T], seed: i64) {
    let length = items.len();
    for idx in (1..=length).rev() {
        match swap_index(idx, seed, length) {
            Some(rnd) => items.swap(idx - 1, rnd),
            None => tracing::debug!(idx, seed, "shuffle index out of range; swap skipped"),
        }
    }
}

fn swap_index(idx: usize, seed: i64, length: usize) -> Option<usize> {
    let power = (SHUFFLE_PRIME as f64).powf(idx as f64);
    let rnd = (power + seed as f64) % length as f64;
    if !rnd.is_finite() || rnd < 0.0 {
        return None;
    }
    Some(rnd as usize)
}
