use std::any::type_name;
use std::fmt::{self, Display};
use std::num::NonZero;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::{debug, warn};

use crate::{Error, Extractor, Histogram, RegistryBuilder, Result, SeedSource};

/// Identifies a histogram within the [`Registry`] it was registered in.
///
/// IDs are assigned in registration order, starting from zero, and are never reused.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HistogramId(usize);

impl HistogramId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The position of the histogram in the registry.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for HistogramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fixed-capacity table of histograms.
///
/// Writers on any number of threads record observations via [`observe()`][Self::observe] or
/// directly on a [`Histogram`]. A single reader periodically takes the data out via the
/// [`Extractor`] of the registry.
///
/// Histograms are expected to be registered before steady-state traffic begins. Registration is
/// thread-safe but allocates; observation and extraction never allocate.
///
/// # Example
///
/// ```
/// use duohist::Registry;
///
/// let registry = Registry::builder().sample_rate(1.0).build();
///
/// let latency = registry.register("latency").unwrap();
/// registry.observe(latency, 100);
/// registry.observe(latency, 50);
/// registry.observe(latency, 200);
///
/// let mut extractor = registry.extractor().unwrap();
/// let snapshot = extractor.extract(latency);
///
/// assert_eq!(snapshot.count(), 3);
/// assert_eq!(snapshot.min(), 50);
/// assert_eq!(snapshot.max(), 200);
/// ```
pub struct Registry {
    /// Slot `i` holds the histogram with ID `i` once its registration has completed.
    histograms: Box<[OnceLock<Histogram>]>,

    /// Number of IDs handed out so far. Never exceeds the capacity.
    next_index: AtomicUsize,

    sample_capacity: NonZero<usize>,
    sample_rate: f64,
    seed_source: Box<dyn SeedSource>,

    extractor_claimed: AtomicBool,
}

impl Registry {
    /// Creates a builder to configure a new registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub(crate) fn new(
        capacity: NonZero<usize>,
        sample_capacity: NonZero<usize>,
        sample_rate: f64,
        seed_source: Box<dyn SeedSource>,
    ) -> Self {
        debug!(
            capacity = capacity.get(),
            sample_capacity = sample_capacity.get(),
            sample_rate,
            "creating histogram registry"
        );

        Self {
            histograms: (0..capacity.get()).map(|_| OnceLock::new()).collect(),
            next_index: AtomicUsize::new(0),
            sample_capacity,
            sample_rate,
            seed_source,
            extractor_claimed: AtomicBool::new(false),
        }
    }

    /// Registers a new histogram with the given name and returns its ID.
    ///
    /// Names are not required to be unique - registering the same name twice
    /// creates two independent histograms.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the registry is already full.
    ///
    /// Returns [`Error::EntropyUnavailable`] if no seed could be obtained for the sampler of
    /// the new histogram. No ID is consumed in this case.
    pub fn register(&self, name: impl Into<String>) -> Result<HistogramId> {
        let name = name.into();
        let capacity = self.capacity();

        // A full registry stays full, so reject before spending entropy on a seed.
        if self.len() >= capacity {
            warn!(name = %name, capacity, "histogram registry is full");
            return Err(Error::CapacityExceeded { name, capacity });
        }

        let seed = self.seed_source.next_seed().map_err(|e| {
            warn!(name = %name, error = %e, "failed to seed histogram sampler");

            Error::EntropyUnavailable {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;

        // Concurrent registrations may have filled the registry since the check above.
        // The counter only hands out unique indexes. Each slot publishes its histogram
        // through its own `OnceLock`, so readers skip slots that are not filled yet.
        let Ok(index) =
            self.next_index
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
                    (next < capacity).then_some(next.wrapping_add(1))
                })
        else {
            warn!(name = %name, capacity, "histogram registry is full");
            return Err(Error::CapacityExceeded { name, capacity });
        };

        let id = HistogramId::new(index);

        debug!(id = index, name = %name, "registered histogram");

        let histogram = Histogram::new(
            id,
            name,
            self.sample_capacity,
            self.sample_rate,
            seed,
        );

        self.histograms
            .get(index)
            .expect("index is below capacity, which is the number of slots")
            .set(histogram)
            .expect("each index is handed out exactly once");

        Ok(id)
    }

    /// Records an observed value into the histogram with the given ID.
    ///
    /// See [`Histogram::observe()`].
    ///
    /// # Panics
    ///
    /// Panics if no histogram was registered in this registry under the index of the ID.
    /// An ID from a different registry is not detected if its index is registered here.
    pub fn observe(&self, id: HistogramId, value: u64) {
        self.histogram(id).observe(value);
    }

    /// Returns the histogram with the given ID.
    ///
    /// Holding on to the reference avoids looking up the histogram on every observation.
    ///
    /// # Panics
    ///
    /// Panics if no histogram was registered in this registry under the index of the ID.
    /// An ID from a different registry is not detected if its index is registered here.
    #[must_use]
    pub fn histogram(&self, id: HistogramId) -> &Histogram {
        self.histograms
            .get(id.index())
            .and_then(OnceLock::get)
            .expect("histogram ID must come from a completed registration in this registry")
    }

    /// Claims the single reader role for this registry.
    ///
    /// The role is released when the returned extractor is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExtractorInUse`] if another extractor for this registry is still alive.
    pub fn extractor(&self) -> Result<Extractor<'_>> {
        self.extractor_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_claimed| Error::ExtractorInUse)?;

        Ok(Extractor::new(self))
    }

    pub(crate) fn release_extractor(&self) {
        self.extractor_claimed.store(false, Ordering::Release);
    }

    /// Iterates over all registered histograms in ID order.
    ///
    /// A histogram whose registration is still in progress on another thread is skipped.
    pub(crate) fn registered(&self) -> impl Iterator<Item = &Histogram> {
        self.histograms
            .iter()
            .take(self.len())
            .filter_map(OnceLock::get)
    }

    /// The number of histogram IDs handed out so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.next_index.load(Ordering::Acquire)
    }

    /// Whether no histogram has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The maximum number of histograms the registry can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.histograms.len()
    }

    /// The number of raw values each histogram retains per generation.
    #[must_use]
    pub fn sample_capacity(&self) -> usize {
        self.sample_capacity.get()
    }

    /// The probability with which an observation is retained as a raw sample.
    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("sample_capacity", &self.sample_capacity)
            .field("sample_rate", &self.sample_rate)
            .field("seed_source", &self.seed_source)
            .finish_non_exhaustive()
    }
}
