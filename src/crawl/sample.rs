use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// Reproducible when `seed` is given, OS-seeded otherwise.
pub fn sampling_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Draw `min(size, items.len())` distinct elements uniformly without replacement.
pub fn sample_accounts<T: Clone, R: Rng + ?Sized>(items: &[T], size: usize, rng: &mut R) -> Vec<T> {
    if size < items.len() {
        items.choose_multiple(rng, size).cloned().collect()
    } else {
        items.to_vec()
    }
}
