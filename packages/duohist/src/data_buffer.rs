use std::iter;
use std::num::NonZero;
use std::sync::atomic::{self, AtomicU64};

use crate::{NO_DATA_MAX, NO_DATA_MIN};

/// We use `Relaxed` ordering for all atomic operations on buffer fields. Writers only need the
/// individual read-modify-write operations to be atomic. Visibility of the data to the reader is
/// established by the histogram lock: the reader takes it exclusively before reading, which
/// synchronizes with every writer that released it in shared mode.
const BUFFER_ACCESS_ORDERING: atomic::Ordering = atomic::Ordering::Relaxed;

/// One generation of the state of a histogram.
///
/// Allocated once when the histogram is created and reused for every later generation via
/// [`reset()`][Self::reset]. Nothing on the write or extraction path allocates.
#[derive(Debug)]
pub(crate) struct DataBuffer {
    /// Number of observations retained as samples in this generation.
    count: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,

    /// Ring of retained values. The length is always a power of two.
    samples: Box<[AtomicU64]>,

    /// `samples.len() - 1`, used to map the counter to a slot.
    mask: u64,
}

impl DataBuffer {
    pub(crate) fn new(sample_capacity: NonZero<usize>) -> Self {
        assert!(
            sample_capacity.is_power_of_two(),
            "sample capacity must be a power of two"
        );

        let samples = iter::repeat_with(|| AtomicU64::new(0))
            .take(sample_capacity.get())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            count: AtomicU64::new(0),
            min: AtomicU64::new(NO_DATA_MIN),
            max: AtomicU64::new(NO_DATA_MAX),
            samples,
            mask: (sample_capacity.get() as u64).wrapping_sub(1),
        }
    }

    /// Folds `value` into the running minimum and maximum.
    ///
    /// Each bound is only written when `value` actually extends it, so the common case of an
    /// unremarkable value costs two loads and no writes.
    pub(crate) fn record_extremes(&self, value: u64) {
        let mut current = self.max.load(BUFFER_ACCESS_ORDERING);
        while value > current {
            match self.max.compare_exchange_weak(
                current,
                value,
                BUFFER_ACCESS_ORDERING,
                BUFFER_ACCESS_ORDERING,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let mut current = self.min.load(BUFFER_ACCESS_ORDERING);
        while value < current {
            match self.min.compare_exchange_weak(
                current,
                value,
                BUFFER_ACCESS_ORDERING,
                BUFFER_ACCESS_ORDERING,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Stores `value` in the next slot of the sample ring, overwriting whatever was there.
    ///
    /// Two writers racing on the same slot may lose one of the values. The samples are an
    /// approximation, so we accept this.
    pub(crate) fn record_sample(&self, value: u64) {
        let previous = self.count.fetch_add(1, BUFFER_ACCESS_ORDERING);

        #[expect(
            clippy::cast_possible_truncation,
            reason = "the mask was derived from a usize length, so the slot fits in usize"
        )]
        let slot = (previous & self.mask) as usize;

        // SAFETY: Type invariant: `mask` is `samples.len() - 1` and the length is a power of two,
        // so masking always yields an index within bounds.
        unsafe { self.samples.get_unchecked(slot) }.store(value, BUFFER_ACCESS_ORDERING);
    }

    /// Starts a new generation by resetting the counter and both bounds in place.
    ///
    /// The sample slots are left as they are - the counter defines which of them are valid.
    pub(crate) fn reset(&self) {
        self.count.store(0, BUFFER_ACCESS_ORDERING);
        self.max.store(NO_DATA_MAX, BUFFER_ACCESS_ORDERING);
        self.min.store(NO_DATA_MIN, BUFFER_ACCESS_ORDERING);
    }

    pub(crate) fn count(&self) -> u64 {
        self.count.load(BUFFER_ACCESS_ORDERING)
    }

    pub(crate) fn min(&self) -> u64 {
        self.min.load(BUFFER_ACCESS_ORDERING)
    }

    pub(crate) fn max(&self) -> u64 {
        self.max.load(BUFFER_ACCESS_ORDERING)
    }

    pub(crate) fn sample_capacity(&self) -> usize {
        self.samples.len()
    }

    /// The values retained in this generation, in slot order.
    ///
    /// Once the ring has wrapped around, every slot is valid and the slot order no longer
    /// matches observation order.
    pub(crate) fn samples(&self) -> impl Iterator<Item = u64> + '_ {
        let retained = usize::try_from(self.count()).map_or(self.samples.len(), |count| {
            count.min(self.samples.len())
        });

        self.samples
            .iter()
            .take(retained)
            .map(|slot| slot.load(BUFFER_ACCESS_ORDERING))
    }

    /// Address of the sample storage, which must never change over the life of the buffer.
    #[cfg(test)]
    pub(crate) fn samples_ptr(&self) -> *const AtomicU64 {
        self.samples.as_ptr()
    }
}
