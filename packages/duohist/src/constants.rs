use std::num::NonZero;

use new_zealand::nz;

/// How many histograms a registry can hold unless configured otherwise.
pub const DEFAULT_CAPACITY: NonZero<usize> = nz!(100);

/// How many raw values each histogram buffer retains unless configured otherwise.
pub const DEFAULT_SAMPLE_CAPACITY: NonZero<usize> = nz!(16_384);

/// Fraction of observations retained as raw samples unless configured otherwise.
pub const DEFAULT_SAMPLE_RATE: f64 = 0.25;

/// The minimum reported for a generation that observed nothing.
pub const NO_DATA_MIN: u64 = u64::MAX;

/// The maximum reported for a generation that observed nothing.
pub const NO_DATA_MAX: u64 = 0;
