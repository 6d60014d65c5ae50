use std::any::type_name;
use std::fmt;
use std::num::NonZero;
use std::time::Duration;

use parking_lot::RwLock;

use crate::{DataBuffer, HistogramId, Sampler};

/// Which of the two buffers of a histogram is currently receiving observations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ActiveBuffer {
    First,
    Second,
}

impl ActiveBuffer {
    const fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// A named histogram that any number of threads can record observations into.
///
/// Every observation updates the running minimum and maximum of the current generation.
/// A random subset of observations, chosen by the sample rate of the registry, is also
/// retained as raw values in a fixed-size sample ring.
///
/// Histograms are created via [`Registry::register()`][crate::Registry::register] and their data
/// is read via an [`Extractor`][crate::Extractor].
///
/// # Example
///
/// ```
/// use duohist::Registry;
///
/// let registry = Registry::builder().build();
/// let id = registry.register("request_duration_us").unwrap();
///
/// let histogram = registry.histogram(id);
/// histogram.observe(1250);
/// histogram.observe(980);
///
/// assert_eq!(histogram.name(), "request_duration_us");
/// ```
pub struct Histogram {
    id: HistogramId,
    name: String,

    first: DataBuffer,
    second: DataBuffer,

    /// Observers hold this in shared mode for the duration of an observation,
    /// extraction holds it exclusively while swapping the buffer roles. This makes each
    /// observation land entirely within one generation.
    active: RwLock<ActiveBuffer>,

    sampler: Sampler,
}

impl Histogram {
    pub(crate) fn new(
        id: HistogramId,
        name: String,
        sample_capacity: NonZero<usize>,
        sample_rate: f64,
        seed: u64,
    ) -> Self {
        Self {
            id,
            name,
            first: DataBuffer::new(sample_capacity),
            second: DataBuffer::new(sample_capacity),
            active: RwLock::new(ActiveBuffer::First),
            sampler: Sampler::new(seed, sample_rate),
        }
    }

    /// The ID assigned to the histogram when it was registered.
    #[must_use]
    pub fn id(&self) -> HistogramId {
        self.id
    }

    /// The name the histogram was registered with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records an observed value into the current generation.
    ///
    /// This never fails and never allocates. It only waits if an extraction of this histogram
    /// is swapping buffers at the same moment.
    ///
    /// # Example
    ///
    /// ```
    /// use duohist::Registry;
    ///
    /// let registry = Registry::builder().build();
    /// let id = registry.register("queue_depth").unwrap();
    ///
    /// registry.histogram(id).observe(17);
    /// ```
    pub fn observe(&self, value: u64) {
        let active = self.active.read();
        let buffer = self.buffer(*active);

        buffer.record_extremes(value);

        if self.sampler.should_include() {
            buffer.record_sample(value);
        }
    }

    /// Records a duration in nanoseconds.
    ///
    /// Durations too long to express as `u64` nanoseconds (about 584 years)
    /// are recorded as `u64::MAX`.
    pub fn observe_duration(&self, duration: Duration) {
        self.observe(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX));
    }

    /// Ends the current generation and returns its buffer.
    ///
    /// The other buffer is reset and becomes the target of new observations. The returned buffer
    /// receives no more writes until the next call makes it active again, so it can be read
    /// without synchronization until then.
    pub(crate) fn swap_buffers(&self) -> &DataBuffer {
        let mut active = self.active.write();

        let retired = *active;
        *active = retired.other();
        self.buffer(*active).reset();

        drop(active);

        self.buffer(retired)
    }

    fn buffer(&self, which: ActiveBuffer) -> &DataBuffer {
        match which {
            ActiveBuffer::First => &self.first,
            ActiveBuffer::Second => &self.second,
        }
    }
}

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The sample rings are far too large to be useful in debug output.
        f.debug_struct(type_name::<Self>())
            .field("id", &self.id)
            .field("name", &self.name)
            .field("sample_capacity", &self.first.sample_capacity())
            .finish_non_exhaustive()
    }
}
