use std::any::type_name;
use std::fmt::{self, Display};

use crate::{DataBuffer, NO_DATA_MAX, NO_DATA_MIN};

/// The data of one histogram generation, as returned by an [`Extractor`][crate::Extractor].
///
/// The snapshot reads directly from the retired buffer of the histogram. Nothing is copied and
/// nothing is allocated. No writer targets the buffer again until the extractor performs another
/// extraction of the same histogram, which the borrow of the extractor rules out while the
/// snapshot exists.
///
/// # Example
///
/// ```
/// use duohist::Registry;
///
/// let registry = Registry::builder().sample_rate(1.0).build();
/// let id = registry.register("latency").unwrap();
///
/// registry.observe(id, 100);
/// registry.observe(id, 50);
///
/// let mut extractor = registry.extractor().unwrap();
/// let snapshot = extractor.extract(id);
///
/// assert_eq!(snapshot.count(), 2);
/// assert_eq!(snapshot.samples().sum::<u64>(), 150);
/// ```
#[derive(Clone, Copy)]
pub struct Snapshot<'a> {
    buffer: &'a DataBuffer,
}

impl<'a> Snapshot<'a> {
    pub(crate) fn new(buffer: &'a DataBuffer) -> Self {
        Self { buffer }
    }

    /// The number of observations retained as raw samples in this generation.
    ///
    /// This is an estimate of the true observation count scaled by the sample rate.
    /// It may exceed [`sample_capacity()`][Self::sample_capacity], in which case only the
    /// most recent samples are still available.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.buffer.count()
    }

    /// The smallest observed value, or [`NO_DATA_MIN`] if nothing was observed.
    ///
    /// Every observation is considered, not only the sampled ones.
    #[must_use]
    pub fn min(&self) -> u64 {
        self.buffer.min()
    }

    /// The largest observed value, or [`NO_DATA_MAX`] if nothing was observed.
    ///
    /// Every observation is considered, not only the sampled ones.
    #[must_use]
    pub fn max(&self) -> u64 {
        self.buffer.max()
    }

    /// The smallest observed value, if anything was observed.
    #[must_use]
    pub fn min_value(&self) -> Option<u64> {
        (!self.is_empty()).then(|| self.min())
    }

    /// The largest observed value, if anything was observed.
    #[must_use]
    pub fn max_value(&self) -> Option<u64> {
        (!self.is_empty()).then(|| self.max())
    }

    /// Whether nothing at all was observed in this generation.
    ///
    /// Note that a generation can have observations but no samples, as the
    /// minimum and maximum consider every observation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        // Any observation makes min <= max, so the two sentinels are the only way to get here.
        self.min() > self.max()
    }

    /// Iterates over the retained raw values.
    ///
    /// Yields at most [`sample_capacity()`][Self::sample_capacity] values. The order is the
    /// order of slots in the sample ring, which only matches observation order until the ring
    /// wraps around.
    pub fn samples(&self) -> impl Iterator<Item = u64> + use<'a> {
        self.buffer.samples()
    }

    /// The maximum number of raw values retained per generation.
    #[must_use]
    pub fn sample_capacity(&self) -> usize {
        self.buffer.sample_capacity()
    }

    #[cfg(test)]
    pub(crate) fn buffer(&self) -> &'a DataBuffer {
        self.buffer
    }
}

impl fmt::Debug for Snapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("count", &self.count())
            .field("min", &self.min())
            .field("max", &self.max())
            .field("sample_capacity", &self.sample_capacity())
            .finish_non_exhaustive()
    }
}

impl Display for Snapshot<'_> {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no data");
        }

        write!(
            f,
            "min {}; max {}; {} sampled",
            self.min(),
            self.max(),
            self.count()
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::num::NonZero;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Snapshot<'static>: Send, Sync, Copy);

    fn buffer() -> DataBuffer {
        DataBuffer::new(NonZero::new(8).unwrap())
    }

    #[test]
    fn empty_buffer_has_no_values() {
        let buffer = buffer();
        let snapshot = Snapshot::new(&buffer);

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.count(), 0);
        assert_eq!(snapshot.min(), NO_DATA_MIN);
        assert_eq!(snapshot.max(), NO_DATA_MAX);
        assert_eq!(snapshot.min_value(), None);
        assert_eq!(snapshot.max_value(), None);
        assert_eq!(snapshot.to_string(), "no data");
    }

    #[test]
    fn observed_buffer_has_values() {
        let buffer = buffer();
        buffer.record_extremes(40);
        buffer.record_extremes(2);
        buffer.record_sample(40);

        let snapshot = Snapshot::new(&buffer);

        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.min_value(), Some(2));
        assert_eq!(snapshot.max_value(), Some(40));
        assert_eq!(snapshot.samples().collect::<Vec<_>>(), vec![40]);
        assert_eq!(snapshot.sample_capacity(), 8);
        assert_eq!(snapshot.to_string(), "min 2; max 40; 1 sampled");
    }

    #[test]
    fn zero_is_a_real_observation() {
        let buffer = buffer();
        buffer.record_extremes(0);

        let snapshot = Snapshot::new(&buffer);

        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.min_value(), Some(0));
        assert_eq!(snapshot.max_value(), Some(0));
    }

    #[test]
    fn maximum_value_is_a_real_observation() {
        let buffer = buffer();
        buffer.record_extremes(u64::MAX);

        let snapshot = Snapshot::new(&buffer);

        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.min_value(), Some(u64::MAX));
    }

    #[test]
    fn debug_output_omits_samples() {
        let buffer = buffer();
        let output = format!("{:?}", Snapshot::new(&buffer));

        assert!(output.contains("count: 0"));
        assert!(output.contains("sample_capacity: 8"));
    }
}
