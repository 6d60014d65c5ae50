use std::error::Error as StdError;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::TryRngCore;
use rand::rngs::OsRng;

/// Supplies the unpredictable 64-bit seeds used to initialize the sampler of each histogram.
///
/// One seed is requested per registered histogram. If the source fails, the registration fails
/// with [`Error::EntropyUnavailable`][crate::Error::EntropyUnavailable] - sampling never starts
/// from a predictable state.
///
/// The default is [`OsSeedSource`], which reads from the operating system.
pub trait SeedSource: Debug + Send + Sync + 'static {
    /// Obtains a fresh seed.
    ///
    /// # Errors
    ///
    /// Returns an error if no seed can be obtained from the underlying source.
    fn next_seed(&self) -> Result<u64, Box<dyn StdError + Send + Sync>>;
}

/// Seeds histogram samplers from the cryptographically secure random source of the
/// operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsSeedSource;

impl SeedSource for OsSeedSource {
    fn next_seed(&self) -> Result<u64, Box<dyn StdError + Send + Sync>> {
        Ok(OsRng.try_next_u64()?)
    }
}

/// Increment of the SplitMix64 sequence (the 64-bit golden ratio).
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// 2^-53, scales the top 53 bits of a draw into the half-open interval [0, 1).
const UNIT_INTERVAL_SCALE: f64 = 1.0 / 9_007_199_254_740_992.0;

/// Decides which observations of a histogram are retained as raw samples.
///
/// The generator is a SplitMix64 sequence whose state lives in a single atomic, so any number of
/// writers can draw from it concurrently without a lock. Concurrent draws each advance the state
/// exactly once, so no two draws observe the same state.
///
/// The generators in `rand` advance through `&mut self`, which would force every observation to
/// take a lock around the generator, so only the seed comes from `rand`.
#[derive(Debug)]
pub(crate) struct Sampler {
    state: AtomicU64,

    /// Inclusion probability in [0, 1].
    rate: f64,
}

impl Sampler {
    pub(crate) fn new(seed: u64, rate: f64) -> Self {
        debug_assert!(
            (0.0..=1.0).contains(&rate),
            "sample rate is validated by the registry builder"
        );

        Self {
            state: AtomicU64::new(seed),
            rate,
        }
    }

    /// Draws a uniformly distributed value from the half-open interval [0, 1).
    pub(crate) fn next_unit(&self) -> f64 {
        // The state is only a counter - ordering with other memory operations is irrelevant.
        let state = self
            .state
            .fetch_add(GOLDEN_GAMMA, Ordering::Relaxed)
            .wrapping_add(GOLDEN_GAMMA);

        #[expect(
            clippy::cast_precision_loss,
            reason = "53 bits fit exactly into the f64 mantissa"
        )]
        let mantissa = (mix(state) >> 11) as f64;

        mantissa * UNIT_INTERVAL_SCALE
    }

    /// Whether the next observation should be retained as a raw sample.
    ///
    /// The draw is half-open, so a rate of 0 never includes and a rate of 1 always includes.
    pub(crate) fn should_include(&self) -> bool {
        self.next_unit() < self.rate
    }

    #[cfg(test)]
    pub(crate) fn rate(&self) -> f64 {
        self.rate
    }
}

/// The SplitMix64 output function.
const fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
