//! Node level assignment.

use rand::Rng;

/// Draw a level for a new node from the geometric distribution
/// `floor(-ln(u) * ml)` with `u` uniform on `(epsilon, 1]`.
///
/// `ml` is the layer multiplier `1 / ln(m)`. Most draws land on level 0;
/// rare high draws become the long-range shortcuts the search descends
/// through. The PRNG is thread-local, so concurrent inserters never share
/// generator state.
pub fn random_level(ml: f64) -> usize {
    let mut rng = rand::thread_rng();
    let u: f64 = rng.gen_range(f64::EPSILON..=1.0);
    (-u.ln() * ml) as usize
}
