use std::num::NonZero;

use crate::{
    DEFAULT_CAPACITY, DEFAULT_SAMPLE_CAPACITY, DEFAULT_SAMPLE_RATE, OsSeedSource, Registry,
    SeedSource,
};

/// Creates instances of [`Registry`].
///
/// All parameters are optional. Once the registry is built, its configuration is fixed.
///
/// Use `Registry::builder()` to create a new instance of this builder.
///
/// # Example
///
/// ```
/// use duohist::Registry;
/// use new_zealand::nz;
///
/// let registry = Registry::builder()
///     .capacity(nz!(16))
///     .sample_capacity(nz!(1024))
///     .sample_rate(0.1)
///     .build();
///
/// assert_eq!(registry.capacity(), 16);
/// ```
#[derive(Debug)]
pub struct RegistryBuilder {
    capacity: NonZero<usize>,

    /// Always a power of two.
    sample_capacity: NonZero<usize>,

    /// Always in [0, 1].
    sample_rate: f64,

    seed_source: Box<dyn SeedSource>,
}

impl RegistryBuilder {
    pub(crate) fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            sample_capacity: DEFAULT_SAMPLE_CAPACITY,
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed_source: Box::new(OsSeedSource),
        }
    }

    /// Sets the maximum number of histograms the registry can hold.
    ///
    /// Registering a histogram beyond this limit fails. The default is 100.
    #[must_use]
    pub fn capacity(self, capacity: NonZero<usize>) -> Self {
        Self { capacity, ..self }
    }

    /// Sets the number of raw values each histogram retains per generation.
    ///
    /// When more values than this are sampled in one generation, the oldest are overwritten.
    /// Each histogram holds two rings of this size, of 8 bytes per value. The default is 16384.
    ///
    /// # Panics
    ///
    /// Panics if the value is not a power of two.
    #[must_use]
    pub fn sample_capacity(self, sample_capacity: NonZero<usize>) -> Self {
        assert!(
            sample_capacity.is_power_of_two(),
            "sample capacity must be a power of two, got {sample_capacity}"
        );

        Self {
            sample_capacity,
            ..self
        }
    }

    /// Sets the probability with which an observation is retained as a raw sample.
    ///
    /// Observations that are not retained still update the minimum and maximum.
    /// The default is 0.25.
    ///
    /// # Panics
    ///
    /// Panics if the value is not within `0.0..=1.0`.
    #[must_use]
    pub fn sample_rate(self, sample_rate: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&sample_rate),
            "sample rate must be within 0.0..=1.0, got {sample_rate}"
        );

        Self {
            sample_rate,
            ..self
        }
    }

    /// Sets the source of the seeds used to initialize the sampler of each histogram.
    ///
    /// The default seeds from the random source of the operating system.
    #[must_use]
    pub fn seed_source(self, seed_source: impl SeedSource) -> Self {
        Self {
            seed_source: Box::new(seed_source),
            ..self
        }
    }

    /// Builds the registry.
    ///
    /// No histograms exist yet - register them via [`Registry::register()`].
    #[must_use]
    pub fn build(self) -> Registry {
        Registry::new(
            self.capacity,
            self.sample_capacity,
            self.sample_rate,
            self.seed_source,
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn defaults_are_applied() {
        let registry = RegistryBuilder::new().build();

        assert_eq!(registry.capacity(), DEFAULT_CAPACITY.get());
        assert_eq!(registry.sample_capacity(), DEFAULT_SAMPLE_CAPACITY.get());
        assert!((registry.sample_rate() - DEFAULT_SAMPLE_RATE).abs() < f64::EPSILON);
    }

    #[test]
    fn custom_values_are_applied() {
        let registry = RegistryBuilder::new()
            .capacity(nz!(3))
            .sample_capacity(nz!(64))
            .sample_rate(1.0)
            .build();

        assert_eq!(registry.capacity(), 3);
        assert_eq!(registry.sample_capacity(), 64);
        assert!((registry.sample_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    #[should_panic]
    fn non_power_of_two_sample_capacity_panics() {
        drop(RegistryBuilder::new().sample_capacity(nz!(1000)));
    }

    #[test]
    #[should_panic]
    fn negative_sample_rate_panics() {
        drop(RegistryBuilder::new().sample_rate(-0.1));
    }

    #[test]
    #[should_panic]
    fn sample_rate_above_one_panics() {
        drop(RegistryBuilder::new().sample_rate(1.5));
    }

    #[test]
    #[should_panic]
    fn nan_sample_rate_panics() {
        drop(RegistryBuilder::new().sample_rate(f64::NAN));
    }
}
