use rand::Rng;

/// Fixed-point scale: one unit is 0.01%
pub const ROLL_SCALE: u32 = 10_000;

/// Convert a percentage into the number of passing draws out of [`ROLL_SCALE`]
pub fn threshold(chance_percent: f64) -> u32 {
    let scaled = (chance_percent * 100.0).round();
    scaled.clamp(0.0, ROLL_SCALE as f64) as u32
}

/// Roll a drop chance given in percent.
///
/// `<= 0` never passes and `>= 100` always passes without consuming
/// randomness. Otherwise a draw in `1..=10000` passes when it is at most
/// `round(chance * 100)`.
pub fn roll<R: Rng + ?Sized>(chance_percent: f64, rng: &mut R) -> bool {
    if chance_percent.is_nan() || chance_percent <= 0.0 {
        return false;
    }
    if chance_percent >= 100.0 {
        return true;
    }

    let draw = rng.gen_range(1..=ROLL_SCALE);
    draw <= threshold(chance_percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const TRIALS: usize = 10_000;

    #[test]
    fn test_zero_never_passes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!((0..TRIALS).all(|_| !roll(0.0, &mut rng)));
        assert!(!roll(-5.0, &mut rng));
        assert!(!roll(f64::NAN, &mut rng));
    }

    #[test]
    fn test_hundred_always_passes() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert!((0..TRIALS).all(|_| roll(100.0, &mut rng)));
        assert!(roll(250.0, &mut rng));
    }

    #[test]
    fn test_half_rate() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let iterations = 100_000;
        let hits = (0..iterations).filter(|_| roll(50.0, &mut rng)).count();
        let rate = hits as f64 / iterations as f64;
        // ~1.5% either side is well over 9 standard deviations
        assert!(rate > 0.485 && rate < 0.515, "Rate was {}", rate);
    }

    #[test]
    fn test_same_seed_same_outcomes() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        let first: Vec<bool> = (0..1000).map(|_| roll(1.0, &mut a)).collect();
        let second: Vec<bool> = (0..1000).map(|_| roll(1.0, &mut b)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_threshold_rounding() {
        assert_eq!(threshold(1.0), 100);
        assert_eq!(threshold(0.005), 1);
        assert_eq!(threshold(0.004), 0);
        assert_eq!(threshold(12.34), 1234);
        assert_eq!(threshold(99.999), 10_000);
    }

    proptest! {
        #[test]
        fn threshold_within_scale(chance in -1000.0f64..1000.0) {
            prop_assert!(threshold(chance) <= ROLL_SCALE);
        }

        #[test]
        fn boundaries_ignore_rng(seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            prop_assert!(!roll(0.0, &mut rng));
            prop_assert!(roll(100.0, &mut rng));
        }
    }
}
