use thiserror::Error;

/// Errors that can occur when setting up histograms or the reader that extracts them.
///
/// None of these can occur on the observation or extraction hot paths. They are all
/// configuration-time conditions and the caller decides whether they are fatal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Every slot in the registry is already taken by a histogram.
    #[error("cannot register histogram '{name}': all {capacity} histogram slots are in use")]
    CapacityExceeded {
        /// The name of the histogram that could not be registered.
        name: String,

        /// The fixed number of histograms the registry can hold.
        capacity: usize,
    },

    /// The seed source could not supply a seed for the histogram's sampler.
    #[error("cannot seed sampler of histogram '{name}': {reason}")]
    EntropyUnavailable {
        /// The name of the histogram that could not be registered.
        name: String,

        /// A human-readable description of the problem, as reported by the seed source.
        reason: String,
    },

    /// An [`Extractor`][crate::Extractor] already exists for the registry.
    ///
    /// Only one reader may extract data from a registry at a time.
    #[error("an extractor for this registry already exists")]
    ExtractorInUse,
}

/// A specialized `Result` type for histogram setup operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
