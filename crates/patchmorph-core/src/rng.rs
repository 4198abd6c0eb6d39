//! Session randomness.
//!
//! All operators take `&mut R where R: Rng + ?Sized`, so a session shares one
//! generator and tests pass a seeded one. A fixed seed and a fixed call
//! sequence give identical results.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Session RNG type.
pub type SessionRng = Pcg32;

/// Creates a PCG32 RNG from a 64-bit seed.
pub fn create_rng(seed: u64) -> SessionRng {
    Pcg32::seed_from_u64(seed)
}

/// Creates a PCG32 RNG seeded from system entropy.
pub fn create_entropy_rng() -> SessionRng {
    Pcg32::from_entropy()
}

/// True with probability `p`. `p <= 0` is never true and `p >= 1` always is.
#[inline]
pub fn coin_toss<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    if p <= 0.0 || p.is_nan() {
        false
    } else if p >= 1.0 {
        true
    } else {
        rng.gen_bool(p)
    }
}

/// Uniform integer in `[lo, hi]`, tolerating reversed bounds.
#[inline]
pub fn uniform_inclusive<R: Rng + ?Sized>(rng: &mut R, lo: i32, hi: i32) -> i32 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    rng.gen_range(lo..=hi)
}

/// Standard normal draw via the Box-Muller transform.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // gen::<f64>() is in [0, 1); 1 - u keeps the log argument in (0, 1]
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = create_rng(42);
        let mut rng2 = create_rng(42);

        let values1: Vec<i32> = (0..100).map(|_| uniform_inclusive(&mut rng1, 0, 127)).collect();
        let values2: Vec<i32> = (0..100).map(|_| uniform_inclusive(&mut rng2, 0, 127)).collect();

        assert_eq!(values1, values2);
    }

    #[test]
    fn test_coin_toss_extremes() {
        let mut rng = create_rng(7);
        assert!((0..1000).all(|_| !coin_toss(&mut rng, 0.0)));
        assert!((0..1000).all(|_| coin_toss(&mut rng, 1.0)));
        assert!(!coin_toss(&mut rng, f64::NAN));
    }

    #[test]
    fn test_uniform_reversed_bounds() {
        let mut rng = create_rng(1);
        for _ in 0..100 {
            let v = uniform_inclusive(&mut rng, 10, 3);
            assert!((3..=10).contains(&v));
        }
    }

    #[test]
    fn test_gaussian_is_centered() {
        let mut rng = create_rng(99);
        let n = 20_000;
        let mean = (0..n).map(|_| gaussian(&mut rng)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
    }
}
