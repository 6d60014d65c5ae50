use std::any::type_name;
use std::fmt::{self, Display};
use std::iter::{Copied, Zip};
use std::slice;

use tracing::trace;

use crate::{HistogramId, Registry, Snapshot};

/// The single reader of a [`Registry`], taking out the data collected by its histograms.
///
/// Each extraction ends the current generation of a histogram: its two buffers swap roles,
/// the buffer that becomes active is reset and the retired buffer is returned as a [`Snapshot`].
/// Writers are only held up for the duration of the swap.
///
/// Obtain the extractor via [`Registry::extractor()`]. Only one extractor per registry can exist
/// at a time and each snapshot borrows it, so a snapshot can never observe its buffer being
/// reactivated by a later extraction.
///
/// # Example
///
/// ```
/// use duohist::Registry;
///
/// let registry = Registry::builder().build();
/// let connect = registry.register("connect_time_us").unwrap();
/// let send = registry.register("send_time_us").unwrap();
///
/// registry.observe(connect, 420);
/// registry.observe(send, 9);
///
/// let mut extractor = registry.extractor().unwrap();
///
/// // Typically done periodically by a reporting task.
/// let extraction = extractor.extract_all();
///
/// for (name, snapshot) in &extraction {
///     println!("{name}: {snapshot}");
/// }
/// ```
pub struct Extractor<'r> {
    registry: &'r Registry,
}

impl<'r> Extractor<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Ends the current generation of one histogram and returns its data.
    ///
    /// Extracting again without any observations in between yields an empty snapshot.
    ///
    /// # Panics
    ///
    /// Panics if no histogram was registered in this registry under the index of the ID.
    /// An ID from a different registry is not detected if its index is registered here.
    pub fn extract(&mut self, id: HistogramId) -> Snapshot<'_> {
        let histogram = self.registry.histogram(id);
        let snapshot = Snapshot::new(histogram.swap_buffers());

        trace!(id = id.index(), count = snapshot.count(), "extracted histogram");

        snapshot
    }

    /// Ends the current generation of every registered histogram and returns their data.
    ///
    /// Histograms are extracted one after the other in ID order. Each extraction is
    /// independent, so the generations of different histograms do not end at the same instant.
    pub fn extract_all(&mut self) -> Extraction<'_> {
        let (names, snapshots) = self
            .registry
            .registered()
            .map(|histogram| (histogram.name(), Snapshot::new(histogram.swap_buffers())))
            .unzip::<_, _, Vec<_>, Vec<_>>();

        trace!(histograms = names.len(), "extracted all histograms");

        Extraction { names, snapshots }
    }
}

impl Drop for Extractor<'_> {
    fn drop(&mut self) {
        self.registry.release_extractor();
    }
}

impl fmt::Debug for Extractor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("registry", self.registry)
            .finish()
    }
}

/// The data of every registered histogram, as returned by [`Extractor::extract_all()`].
///
/// Names and snapshots are parallel sequences in ID order. The names are borrowed
/// from the registry.
///
/// For human-readable output, use the `Display` trait implementation. This is intended
/// for writing to a terminal and uses only the basic ASCII character set.
#[derive(Debug)]
pub struct Extraction<'a> {
    names: Vec<&'a str>,
    snapshots: Vec<Snapshot<'a>>,
}

impl<'a> Extraction<'a> {
    /// The names of the histograms, in ID order.
    #[must_use]
    pub fn names(&self) -> &[&'a str] {
        &self.names
    }

    /// The snapshots of the histograms, in ID order.
    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot<'a>] {
        &self.snapshots
    }

    /// Iterates over pairs of histogram name and snapshot, in ID order.
    pub fn iter(&self) -> ExtractionIter<'_, 'a> {
        self.names
            .iter()
            .copied()
            .zip(self.snapshots.iter().copied())
    }

    /// The number of histograms in the extraction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the registry had no histograms at the time of extraction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Splits the extraction into its parallel sequences of names and snapshots.
    #[must_use]
    pub fn into_parts(self) -> (Vec<&'a str>, Vec<Snapshot<'a>>) {
        (self.names, self.snapshots)
    }
}

/// Iterator over the pairs of histogram name and snapshot in an [`Extraction`].
pub type ExtractionIter<'e, 'a> =
    Zip<Copied<slice::Iter<'e, &'a str>>, Copied<slice::Iter<'e, Snapshot<'a>>>>;

impl<'e, 'a> IntoIterator for &'e Extraction<'a> {
    type Item = (&'a str, Snapshot<'a>);
    type IntoIter = ExtractionIter<'e, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for Extraction<'_> {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, snapshot) in self {
            writeln!(f, "{name}: {snapshot}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::indexing_slicing, reason = "panic is fine in tests")]

    use std::ptr;
    use std::thread;

    use new_zealand::nz;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{NO_DATA_MAX, NO_DATA_MIN};

    assert_impl_all!(Extractor<'static>: Send, Sync);
    assert_impl_all!(Extraction<'static>: Send, Sync);

    fn always_sampling_registry() -> Registry {
        Registry::builder()
            .capacity(nz!(4))
            .sample_capacity(nz!(16))
            .sample_rate(1.0)
            .build()
    }

    #[test]
    fn extract_returns_generation_then_resets() {
        let registry = always_sampling_registry();
        let id = registry.register("latency").unwrap();

        assert_eq!(id.index(), 0);

        registry.observe(id, 100);
        registry.observe(id, 50);
        registry.observe(id, 200);

        let mut extractor = registry.extractor().unwrap();

        let snapshot = extractor.extract(id);
        assert_eq!(snapshot.count(), 3);
        assert_eq!(snapshot.min(), 50);
        assert_eq!(snapshot.max(), 200);

        let mut samples = snapshot.samples().collect::<Vec<_>>();
        samples.sort_unstable();
        assert_eq!(samples, vec![50, 100, 200]);

        let snapshot = extractor.extract(id);
        assert_eq!(snapshot.count(), 0);
        assert_eq!(snapshot.min(), NO_DATA_MIN);
        assert_eq!(snapshot.max(), NO_DATA_MAX);
    }

    #[test]
    fn repeated_extraction_stays_empty() {
        let registry = always_sampling_registry();
        let id = registry.register("idle").unwrap();

        let mut extractor = registry.extractor().unwrap();

        for _ in 0..10 {
            let snapshot = extractor.extract(id);

            assert!(snapshot.is_empty());
            assert_eq!(snapshot.count(), 0);
            assert_eq!(snapshot.min(), NO_DATA_MIN);
            assert_eq!(snapshot.max(), NO_DATA_MAX);
            assert_eq!(snapshot.samples().count(), 0);
        }
    }

    #[test]
    fn extraction_reuses_the_same_two_buffers() {
        let registry = always_sampling_registry();
        let id = registry.register("stable").unwrap();

        let mut extractor = registry.extractor().unwrap();

        let first = ptr::from_ref(extractor.extract(id).buffer());
        let second = ptr::from_ref(extractor.extract(id).buffer());
        let first_samples = extractor.extract(id).buffer().samples_ptr();

        assert_ne!(first, second);

        for cycle in 0..1000_u64 {
            registry.observe(id, cycle);

            let buffer = extractor.extract(id).buffer();
            let expected = if cycle % 2 == 0 { second } else { first };

            assert_eq!(ptr::from_ref(buffer), expected);
            assert_eq!(buffer.max(), cycle);
        }

        // The sample ring of a buffer is never reallocated either.
        _ = extractor.extract(id);
        assert_eq!(extractor.extract(id).buffer().samples_ptr(), first_samples);
    }

    #[test]
    fn extract_all_returns_every_histogram_in_order() {
        let registry = always_sampling_registry();
        let a = registry.register("alpha").unwrap();
        registry.register("beta").unwrap();
        let c = registry.register("gamma").unwrap();

        registry.observe(a, 1);
        registry.observe(c, 3);
        registry.observe(c, 30);

        let mut extractor = registry.extractor().unwrap();
        let extraction = extractor.extract_all();

        assert_eq!(extraction.len(), 3);
        assert!(!extraction.is_empty());
        assert_eq!(extraction.names(), &["alpha", "beta", "gamma"]);

        let snapshots = extraction.snapshots();
        assert_eq!(snapshots[0].count(), 1);
        assert!(snapshots[1].is_empty());
        assert_eq!(snapshots[2].min(), 3);
        assert_eq!(snapshots[2].max(), 30);

        let (names, snapshots) = extraction.into_parts();
        assert_eq!(names.len(), snapshots.len());
    }

    #[test]
    fn extract_all_on_empty_registry_is_empty() {
        let registry = always_sampling_registry();
        let mut extractor = registry.extractor().unwrap();

        let extraction = extractor.extract_all();

        assert!(extraction.is_empty());
        assert_eq!(extraction.to_string(), "");
    }

    #[test]
    fn extract_all_resets_every_histogram() {
        let registry = always_sampling_registry();
        let a = registry.register("a").unwrap();
        let b = registry.register("b").unwrap();

        registry.observe(a, 5);
        registry.observe(b, 6);

        let mut extractor = registry.extractor().unwrap();
        _ = extractor.extract_all();

        let extraction = extractor.extract_all();
        assert!(extraction.snapshots().iter().all(Snapshot::is_empty));
    }

    #[test]
    fn extraction_display_lists_histograms() {
        let registry = always_sampling_registry();
        let a = registry.register("connect_time_us").unwrap();
        registry.register("idle").unwrap();

        registry.observe(a, 42);
        registry.observe(a, 7);

        let mut extractor = registry.extractor().unwrap();
        let output = extractor.extract_all().to_string();

        assert_eq!(
            output,
            "connect_time_us: min 7; max 42; 2 sampled\nidle: no data\n"
        );
    }

    #[test]
    fn extraction_iterates_pairs() {
        let registry = always_sampling_registry();
        let a = registry.register("a").unwrap();
        registry.observe(a, 9);

        let mut extractor = registry.extractor().unwrap();
        let extraction = extractor.extract_all();

        let pairs = extraction
            .iter()
            .map(|(name, snapshot)| (name, snapshot.max()))
            .collect::<Vec<_>>();

        assert_eq!(pairs, vec![("a", 9)]);
    }

    #[test]
    fn extractor_can_run_on_another_thread() {
        let registry = always_sampling_registry();
        let id = registry.register("cross_thread").unwrap();

        registry.observe(id, 11);

        thread::scope(|s| {
            s.spawn(|| {
                let mut extractor = registry.extractor().unwrap();
                assert_eq!(extractor.extract(id).max(), 11);
            });
        });

        // The extractor was dropped on the other thread, releasing the role.
        drop(registry.extractor().unwrap());
    }
}
