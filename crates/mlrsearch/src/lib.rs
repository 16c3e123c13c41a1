//! # mlrsearch
//!
//! Find the highest load a system under test sustains at several target loss
//! ratios at once, with as few expensive trials as possible.
//!
//! The search is driven by a [`MeasurementProvider`], typically a traffic
//! generator, that runs one trial at a given load for a given duration. The
//! search:
//! - bootstraps from a trial at the maximum load
//! - runs phases of growing trial duration and shrinking width goal
//! - reuses short-trial results from earlier phases where it can
//! - returns, per target ratio, an interval whose lower side meets the ratio
//!   and whose upper side does not
//!
//! ## Quick Start
//!
//! ```ignore
//! use mlrsearch::{MultipleLossRatioSearch, SearchConfig};
//!
//! let mut search = MultipleLossRatioSearch::new(SearchConfig::default(), traffic_generator)?;
//! let intervals = search.narrow_down_intervals(10_000.0, 14_880_952.0, &[0.0, 0.005])?;
//!
//! for interval in &intervals {
//!     println!("{}", interval);
//! }
//! ```
//!
//! Search progress is reported through `tracing` events; install a
//! subscriber to see them.

mod config;
mod error;
mod provider;
mod search;

pub use config::SearchConfig;
pub use error::SearchError;
pub use provider::MeasurementProvider;
pub use search::{MultipleLossRatioSearch, SearchReport};

// Re-exports from the core crate
pub use mlrsearch_core::{
    ComparableMeasurement, CoreError, Interval, Measurement, MeasurementDatabase, PhaseEnd,
    PhaseSchedule, SearchAction,
};
