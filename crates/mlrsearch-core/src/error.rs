//! Error types for the search building blocks.

use core::fmt;

/// Error returned by core search operations.
///
/// Apart from [`CoreError::InvalidMeasurement`] and
/// [`CoreError::InvalidSchedule`], which reject bad caller input, every
/// variant signals a logic error in whoever drives the search.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Phase schedule parameters are out of range.
    InvalidSchedule {
        /// Which parameter was rejected.
        message: &'static str,
    },

    /// Measurement counts or targets are out of range.
    InvalidMeasurement {
        /// Which value was rejected.
        message: &'static str,
    },

    /// Two measurements share both intended load and intended duration.
    ///
    /// The search never measures the same load twice at one duration, so
    /// this points at a broken caller.
    DuplicateMeasurement {
        /// Intended load of both measurements [tps].
        load: f64,
        /// Intended duration of both measurements [s].
        duration: f64,
    },

    /// No measurement is at least as long as the requested duration.
    NotFound {
        /// The duration floor that nothing satisfied [s].
        min_duration: f64,
    },

    /// An internal precondition did not hold.
    InvariantViolation {
        /// Description of the broken precondition.
        message: &'static str,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSchedule { message } => write!(f, "invalid phase schedule: {}", message),
            Self::InvalidMeasurement { message } => write!(f, "invalid measurement: {}", message),
            Self::DuplicateMeasurement { load, duration } => write!(
                f,
                "duplicate measurement at load {} tps and duration {} s",
                load, duration
            ),
            Self::NotFound { min_duration } => write!(
                f,
                "no measurement with duration of at least {} s",
                min_duration
            ),
            Self::InvariantViolation { message } => write!(f, "invariant violated: {}", message),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}
