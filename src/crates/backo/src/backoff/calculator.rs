//! Full-jitter backoff calculation
//!
//! The delay for attempt `n` is `base * factor^n`, optionally moved up or
//! down by a random fraction of itself, then clamped into `[base, cap]`.

use crate::config::BackoffConfig;
use rand::Rng;
use std::time::Duration;
use tracing::trace;

/// Computes how long to wait before retrying
///
/// A calculator only holds its [`BackoffConfig`], so it is `Copy`, `Send`
/// and `Sync`, and can be shared freely between threads and tasks.
///
/// # Example
///
/// ```rust
/// use backo::BackoffCalculator;
/// use std::time::Duration;
///
/// let backoff = BackoffCalculator::default();
/// assert_eq!(backoff.compute(0), Duration::from_millis(100));
/// assert_eq!(backoff.compute(1), Duration::from_millis(200));
/// assert_eq!(backoff.compute(2), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BackoffCalculator {
    config: BackoffConfig,
}

impl BackoffCalculator {
    /// Create a calculator for a resolved configuration
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    /// Get the configuration this calculator was built with
    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// Delay before retrying after failure number `attempt` (0-indexed)
    ///
    /// Jitter, when enabled, is drawn from the thread-local generator.
    pub fn compute(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.compute_millis(attempt))
    }

    /// Same as [`compute`](Self::compute), in milliseconds
    pub fn compute_millis(&self, attempt: u32) -> u64 {
        let mut rng = rand::thread_rng();
        self.compute_millis_with_rng(attempt, &mut rng)
    }

    /// Delay for `attempt`, drawing jitter from the given generator
    ///
    /// Use a seeded generator for reproducible delays:
    ///
    /// ```rust
    /// use backo::{BackoffCalculator, BackoffConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = BackoffConfig::builder().with_jitter(1.0).build().unwrap();
    /// let backoff = BackoffCalculator::new(config);
    ///
    /// let mut a = StdRng::seed_from_u64(7);
    /// let mut b = StdRng::seed_from_u64(7);
    /// assert_eq!(backoff.compute_with_rng(4, &mut a), backoff.compute_with_rng(4, &mut b));
    /// ```
    pub fn compute_with_rng<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        Duration::from_millis(self.compute_millis_with_rng(attempt, rng))
    }

    /// Same as [`compute_with_rng`](Self::compute_with_rng), in milliseconds
    ///
    /// The generator is only consulted when jitter is non-zero.
    pub fn compute_millis_with_rng<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> u64 {
        let raw = self.raw_millis(attempt);

        let jittered = if self.config.jitter() != 0.0 {
            let random: f64 = rng.gen();
            apply_jitter(raw, self.config.jitter(), random)
        } else {
            raw
        };

        let delay = jittered
            .max(self.config.base_millis())
            .min(self.config.cap_millis());

        trace!(attempt, raw, delay, "Computed backoff");
        delay
    }

    /// `base * factor^attempt`, saturating at `u64::MAX`
    fn raw_millis(&self, attempt: u32) -> u64 {
        u64::from(self.config.factor())
            .checked_pow(attempt)
            .and_then(|growth| self.config.base_millis().checked_mul(growth))
            .unwrap_or(u64::MAX)
    }
}

/// Move `raw` by `floor(random * jitter * raw)`
///
/// The direction comes from the parity of `floor(random * 10)`: even
/// subtracts, odd adds. A result that leaves the representable range in
/// either direction is treated as unbounded.
fn apply_jitter(raw: u64, jitter: f64, random: f64) -> u64 {
    let deviation = (random * jitter * raw as f64).floor() as i128;
    let raw = i128::from(raw);

    let adjusted = if ((random * 10.0).floor() as u64) & 1 == 0 {
        raw.saturating_sub(deviation)
    } else {
        raw.saturating_add(deviation)
    };

    if adjusted < 0 {
        return u64::MAX;
    }
    u64::try_from(adjusted).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use std::sync::Arc;

    /// Generator whose `gen::<f64>()` always yields `(bits >> 11) / 2^53`
    struct FixedRng {
        bits: u64,
    }

    impl FixedRng {
        /// 0.25: `floor(2.5)` is even, so jitter subtracts
        fn subtracting() -> Self {
            Self { bits: 1 << 62 }
        }

        /// 0.375: `floor(3.75)` is odd, so jitter adds
        fn adding() -> Self {
            Self { bits: 3 << 61 }
        }
    }

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            (self.bits >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.bits
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for (i, byte) in dest.iter_mut().enumerate() {
                *byte = self.bits.to_le_bytes()[i % 8];
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn calculator(base_ms: u64, factor: u32, jitter: f64, cap_ms: u64) -> BackoffCalculator {
        let config = BackoffConfig::builder()
            .with_base_millis(base_ms)
            .with_factor(factor)
            .with_jitter(jitter)
            .with_cap_millis(cap_ms)
            .build()
            .unwrap();
        BackoffCalculator::new(config)
    }

    #[test]
    fn test_fixed_rng_values() {
        let random: f64 = FixedRng::subtracting().gen();
        assert_eq!(random, 0.25);
        let random: f64 = FixedRng::adding().gen();
        assert_eq!(random, 0.375);
    }

    #[test]
    fn test_default_sequence() {
        let backoff = BackoffCalculator::default();

        assert_eq!(backoff.compute_millis(0), 100);
        assert_eq!(backoff.compute_millis(1), 200);
        assert_eq!(backoff.compute_millis(2), 400);
        assert_eq!(backoff.compute_millis(3), 800);

        // No state carried between calls
        assert_eq!(backoff.compute_millis(0), 100);
        assert_eq!(backoff.compute_millis(1), 200);
    }

    #[test]
    fn test_compute_returns_duration() {
        let backoff = BackoffCalculator::default();
        assert_eq!(backoff.compute(4), Duration::from_millis(1600));
    }

    #[test]
    fn test_without_jitter_is_deterministic() {
        let backoff = calculator(3, 3, 0.0, 1_000_000);

        let delays: Vec<u64> = (0..10).map(|_| backoff.compute_millis(5)).collect();
        assert!(delays.iter().all(|&d| d == 3 * 3u64.pow(5)));
    }

    #[test]
    fn test_rng_unused_without_jitter() {
        struct PanickingRng;

        impl RngCore for PanickingRng {
            fn next_u32(&mut self) -> u32 {
                panic!("rng should not be used")
            }
            fn next_u64(&mut self) -> u64 {
                panic!("rng should not be used")
            }
            fn fill_bytes(&mut self, _dest: &mut [u8]) {
                panic!("rng should not be used")
            }
            fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
                panic!("rng should not be used")
            }
        }

        let backoff = BackoffCalculator::default();
        assert_eq!(backoff.compute_millis_with_rng(2, &mut PanickingRng), 400);
    }

    #[test]
    fn test_factor_one_is_constant() {
        let backoff = calculator(250, 1, 0.0, u64::MAX);
        for attempt in 0..20 {
            assert_eq!(backoff.compute_millis(attempt), 250);
        }
    }

    #[test]
    fn test_factor_zero_falls_back_to_base() {
        let backoff = calculator(100, 0, 0.0, u64::MAX);
        assert_eq!(backoff.compute_millis(0), 100);
        assert_eq!(backoff.compute_millis(1), 100);
        assert_eq!(backoff.compute_millis(7), 100);
    }

    #[test]
    fn test_cap_clamps_growth() {
        let backoff = calculator(10, 2, 0.0, 50);
        assert_eq!(backoff.compute_millis(2), 40);
        assert_eq!(backoff.compute_millis(3), 50);
        assert_eq!(backoff.compute_millis(30), 50);
    }

    #[test]
    fn test_overflow_clamps_to_cap() {
        let backoff = calculator(100, 2, 0.0, 10_000);
        assert_eq!(backoff.compute_millis(63), 10_000);
        assert_eq!(backoff.compute_millis(64), 10_000);
        assert_eq!(backoff.compute_millis(u32::MAX), 10_000);
    }

    #[test]
    fn test_overflow_without_cap_saturates() {
        let backoff = BackoffCalculator::default();
        assert_eq!(backoff.compute_millis(1000), u64::MAX);
        assert_eq!(backoff.compute(1000), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_jitter_subtracts_on_even_branch() {
        let backoff = calculator(100, 2, 1.0, u64::MAX);
        // raw 400, deviation floor(0.25 * 400) = 100
        assert_eq!(
            backoff.compute_millis_with_rng(2, &mut FixedRng::subtracting()),
            300
        );
    }

    #[test]
    fn test_jitter_adds_on_odd_branch() {
        let backoff = calculator(100, 2, 1.0, u64::MAX);
        // raw 400, deviation floor(0.375 * 400) = 150
        assert_eq!(
            backoff.compute_millis_with_rng(2, &mut FixedRng::adding()),
            550
        );
    }

    #[test]
    fn test_jitter_fraction_scales_deviation() {
        let backoff = calculator(100, 2, 0.5, u64::MAX);
        // raw 800, deviation floor(0.375 * 0.5 * 800) = 150
        assert_eq!(
            backoff.compute_millis_with_rng(3, &mut FixedRng::adding()),
            950
        );
    }

    #[test]
    fn test_jitter_below_base_clamps_to_base() {
        let backoff = calculator(100, 2, 1.0, u64::MAX);
        // raw 100, deviation 25 subtracted, then clamped back up
        assert_eq!(
            backoff.compute_millis_with_rng(0, &mut FixedRng::subtracting()),
            100
        );
    }

    #[test]
    fn test_heavy_subtraction_is_unbounded() {
        // jitter 8: deviation floor(0.25 * 8 * 400) = 800 > raw
        let backoff = calculator(100, 2, 8.0, 5_000);
        assert_eq!(
            backoff.compute_millis_with_rng(2, &mut FixedRng::subtracting()),
            5_000
        );
    }

    #[test]
    fn test_jitter_addition_overflow_is_unbounded() {
        // raw 2^63, deviation 1.5 * 2^63 pushes past u64::MAX
        let backoff = calculator(1, 2, 4.0, u64::MAX);
        assert_eq!(
            backoff.compute_millis_with_rng(63, &mut FixedRng::adding()),
            u64::MAX
        );
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let backoff = calculator(100, 2, 1.0, 10_000);

        for attempt in 0..100 {
            let delay = backoff.compute_millis(attempt);
            assert!(delay >= 100, "attempt {} gave {}", attempt, delay);
            assert!(delay <= 10_000, "attempt {} gave {}", attempt, delay);
        }
    }

    #[test]
    fn test_jitter_varies_delays() {
        let backoff = calculator(1000, 2, 1.0, u64::MAX);
        let mut rng = StdRng::seed_from_u64(42);

        let delays: Vec<u64> = (0..20)
            .map(|_| backoff.compute_millis_with_rng(4, &mut rng))
            .collect();

        let first = delays[0];
        assert!(delays.iter().any(|&d| d != first), "Jitter should vary delays");
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let backoff = calculator(1, 2, 1.0, u64::MAX);
        let mut a = StdRng::seed_from_u64(1234);
        let mut b = StdRng::seed_from_u64(1234);

        for attempt in 0..30 {
            assert_eq!(
                backoff.compute_millis_with_rng(attempt, &mut a),
                backoff.compute_millis_with_rng(attempt, &mut b)
            );
        }
    }

    #[test]
    fn test_shared_across_threads() {
        let backoff = Arc::new(calculator(100, 2, 1.0, 10_000));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let backoff = Arc::clone(&backoff);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|attempt| backoff.compute_millis(attempt))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for delay in handle.join().unwrap() {
                assert!((100..=10_000).contains(&delay));
            }
        }
    }

    #[test]
    fn test_calculator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BackoffCalculator>();
    }
}
