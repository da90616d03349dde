//! Deterministic randomness for reproducible training
//!
//! Every consumer of randomness gets its own ChaCha8 stream derived from the
//! run seed and a stream id, so results do not depend on scheduling or on
//! how many threads rayon uses.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Stream used for the train/test shuffle
pub const SPLIT_STREAM: u64 = 0;

/// First stream used by forest trees; tree `i` uses `TREE_STREAM_BASE + i`
pub const TREE_STREAM_BASE: u64 = 1;

/// RNG for `stream` under the run `seed`
pub fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Row indices `0..n` in a seeded random order
pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut stream_rng(seed, SPLIT_STREAM));
    indices
}

/// `n` draws with replacement from `0..n`
pub fn bootstrap_indices<R: Rng>(rng: &mut R, n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// `k` distinct features out of `0..feature_count`, sorted ascending.
///
/// Sorting keeps split search order (and therefore tie-breaking) independent
/// of the draw order.
pub fn sample_features<R: Rng>(rng: &mut R, feature_count: usize, k: usize) -> Vec<usize> {
    let k = k.clamp(1, feature_count.max(1));
    let mut picked = rand::seq::index::sample(rng, feature_count, k.min(feature_count)).into_vec();
    picked.sort_unstable();
    picked
}

/// Default per-tree feature count: `max(1, floor(sqrt(n)))`
pub fn default_max_features(feature_count: usize) -> usize {
    ((feature_count as f64).sqrt().floor() as usize).max(1)
}
