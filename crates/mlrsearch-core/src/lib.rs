//! Core building blocks for multiple loss ratio search (MLRsearch).
//!
//! This crate holds everything about the search that does not need a clock or
//! a traffic generator: width arithmetic, trial measurement records, the
//! measurement database with its bound queries, load limit handling and the
//! pure decision of which load to measure next. It works in `no_std`
//! environments with only an allocator.
//!
//! # Features
//!
//! - `std` (default): Enable standard library support and serde derives
//!
//! # Usage
//!
//! This crate is typically used through the main `mlrsearch` crate, which
//! drives trials through a measurement provider and enforces the overall
//! timeout. The pieces here can also be used directly, for example to replay
//! recorded trials:
//!
//! ```ignore
//! use mlrsearch_core::{
//!     database::{MeasurementDatabase, RelevantBounds},
//!     selection::{next_load, SelectionContext},
//!     Measurement, PhaseSchedule,
//! };
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod constants;
pub mod database;
pub mod error;
pub mod interval;
pub mod limits;
pub mod math;
pub mod measurement;
pub mod schedule;
pub mod selection;
pub mod width;

// Re-export commonly used items at crate root
pub use database::{MeasurementDatabase, RelevantBounds, ValidBounds};
pub use error::CoreError;
pub use interval::Interval;
pub use limits::LoadLimits;
pub use measurement::{ComparableMeasurement, Measurement};
pub use schedule::PhaseSchedule;
pub use selection::{LoadSelection, PhaseEnd, SearchAction, SelectionContext};
