#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! # duohist - double-buffered sampled histograms
//!
//! Collect the distribution of observed values (e.g. latencies) from many concurrent writers and
//! hand it to a single periodic reader, without allocating on either path and without holding up
//! writers for more than a brief buffer swap.
//!
//! # Collected data
//!
//! For each histogram, every generation (the period between two extractions) collects:
//!
//! * Minimum and maximum of all observed values (`u64`).
//! * A random sample of the observed values, retained in a fixed-size ring (`[u64]`).
//! * The number of sampled values (`u64`).
//!
//! The sample is intended as input for percentile estimation by the consumer of the data.
//! The minimum and maximum are exact for the generation, the sample is approximate.
//!
//! # Registering histograms
//!
//! Histograms live in a [`Registry`] with a fixed capacity. Register all histograms before
//! steady-state traffic begins:
//!
//! ```
//! use duohist::Registry;
//!
//! let registry = Registry::builder().build();
//!
//! let connect_time = registry.register("net_http_connect_time_us").unwrap();
//! let response_size = registry.register("net_http_response_size_bytes").unwrap();
//! ```
//!
//! Registration fails once the registry is full. A registry that cannot track a metric is a
//! configuration mistake, so you will typically want to treat this as fatal.
//!
//! # Capturing observations
//!
//! Observe values via the registry or, to skip the lookup, via the [`Histogram`] itself.
//! Both are usable from any number of threads at the same time:
//!
//! ```
//! use std::thread;
//! use std::time::Duration;
//!
//! use duohist::Registry;
//!
//! let registry = Registry::builder().build();
//! let connect_time = registry.register("net_http_connect_time_ns").unwrap();
//!
//! thread::scope(|s| {
//!     for _ in 0..4 {
//!         s.spawn(|| {
//!             let histogram = registry.histogram(connect_time);
//!
//!             histogram.observe(1_250_000);
//!             histogram.observe_duration(Duration::from_micros(980));
//!         });
//!     }
//! });
//!
//! registry.observe(connect_time, 1_100_000);
//! ```
//!
//! # Extracting data
//!
//! A single reader owns the [`Extractor`] of the registry and periodically extracts the data
//! of one or all histograms. Each extraction ends the current generation: the histogram swaps
//! its two buffers, so writers continue into a freshly reset buffer while the reader inspects
//! the retired one.
//!
//! ```
//! use duohist::Registry;
//!
//! let registry = Registry::builder().build();
//! let connect_time = registry.register("net_http_connect_time_us").unwrap();
//!
//! registry.observe(connect_time, 420);
//! registry.observe(connect_time, 380);
//!
//! let mut extractor = registry.extractor().unwrap();
//!
//! let extraction = extractor.extract_all();
//!
//! for (name, snapshot) in &extraction {
//!     println!(
//!         "{name}: min {:?}, max {:?}, {} samples",
//!         snapshot.min_value(),
//!         snapshot.max_value(),
//!         snapshot.samples().count()
//!     );
//! }
//!
//! // The extraction also implements `Display` for printing to a terminal.
//! println!("{extraction}");
//! ```
//!
//! # Configuration
//!
//! The capacity of the registry, the size of the sample ring and the sample rate are set via
//! [`RegistryBuilder`] and fixed for the life of the registry. Memory is allocated at
//! registration time: two sample rings of 8 bytes per slot for every histogram.
//!
//! # Panic policy
//!
//! This crate may panic when building a registry if an invalid configuration is supplied,
//! and when an observation or extraction uses a histogram ID whose index was never registered
//! in that registry.
//!
//! This crate will not panic for "mathematical" reasons during observation of values.
//!
//! # Logging
//!
//! Registry creation and histogram registration are logged via `tracing` at debug level,
//! registration failures at warn level and extractions at trace level. Observations are
//! never logged.

mod constants;
mod data_buffer;
mod error;
mod extractor;
mod histogram;
mod registry;
mod registry_builder;
mod sampler;
mod snapshot;

pub use constants::*;
pub(crate) use data_buffer::DataBuffer;
pub use error::Error;
pub(crate) use error::Result;
pub use extractor::*;
pub use histogram::*;
pub use registry::*;
pub use registry_builder::*;
pub(crate) use sampler::Sampler;
pub use sampler::{OsSeedSource, SeedSource};
pub use snapshot::*;
