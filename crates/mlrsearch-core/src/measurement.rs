//! Trial measurement records.
//!
//! A [`Measurement`] is the outcome of one trial: traffic was offered at an
//! intended load for an intended duration, and the system under test either
//! forwarded or lost each transaction. Everything the search needs, the loss
//! ratio in particular, is derived from the counts.

use core::cmp::Ordering;

use crate::error::CoreError;

/// Result of one trial at a fixed intended load and duration.
///
/// Counts are signed: a negative loss count means the system under test
/// produced duplicates, and contributes its absolute value to the loss ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Measurement {
    /// Intended trial duration in seconds.
    pub intended_duration: f64,

    /// Intended load in transactions per second.
    pub intended_load: f64,

    /// Number of transactions actually offered.
    pub offered_count: i64,

    /// Number of transactions lost.
    pub loss_count: i64,

    /// Number of transactions forwarded, `offered - loss`.
    pub forwarding_count: i64,

    /// Number of transactions the traffic generator meant to offer.
    ///
    /// Larger than `offered_count` when the generator could not keep up.
    pub intended_count: i64,

    /// Actual duration of the trial including overheads, in seconds.
    pub offered_duration: f64,
}

impl Measurement {
    /// Create from the offered and lost counts.
    pub fn from_offered_and_loss(
        intended_duration: f64,
        intended_load: f64,
        offered_count: i64,
        loss_count: i64,
    ) -> Result<Self, CoreError> {
        Self::build(
            intended_duration,
            intended_load,
            offered_count,
            loss_count,
            offered_count - loss_count,
        )
    }

    /// Create from the offered and forwarded counts.
    pub fn from_offered_and_forwarding(
        intended_duration: f64,
        intended_load: f64,
        offered_count: i64,
        forwarding_count: i64,
    ) -> Result<Self, CoreError> {
        Self::build(
            intended_duration,
            intended_load,
            offered_count,
            offered_count - forwarding_count,
            forwarding_count,
        )
    }

    /// Create from the lost and forwarded counts.
    pub fn from_loss_and_forwarding(
        intended_duration: f64,
        intended_load: f64,
        loss_count: i64,
        forwarding_count: i64,
    ) -> Result<Self, CoreError> {
        Self::build(
            intended_duration,
            intended_load,
            loss_count + forwarding_count,
            loss_count,
            forwarding_count,
        )
    }

    fn build(
        intended_duration: f64,
        intended_load: f64,
        offered_count: i64,
        loss_count: i64,
        forwarding_count: i64,
    ) -> Result<Self, CoreError> {
        if !(intended_duration.is_finite() && intended_duration > 0.0) {
            return Err(CoreError::InvalidMeasurement {
                message: "intended duration must be positive and finite",
            });
        }
        if !(intended_load.is_finite() && intended_load > 0.0) {
            return Err(CoreError::InvalidMeasurement {
                message: "intended load must be positive and finite",
            });
        }
        if offered_count < 0 {
            return Err(CoreError::InvalidMeasurement {
                message: "offered count must not be negative",
            });
        }
        if forwarding_count < 0 {
            return Err(CoreError::InvalidMeasurement {
                message: "forwarding count must not be negative",
            });
        }
        Ok(Self {
            intended_duration,
            intended_load,
            offered_count,
            loss_count,
            forwarding_count,
            intended_count: offered_count,
            offered_duration: intended_duration,
        })
    }

    /// Set the intended count, for traffic generators that report underrun.
    pub fn with_intended_count(mut self, intended_count: i64) -> Result<Self, CoreError> {
        if intended_count < 0 {
            return Err(CoreError::InvalidMeasurement {
                message: "intended count must not be negative",
            });
        }
        self.intended_count = intended_count;
        Ok(self)
    }

    /// Set the actual trial duration including overheads.
    pub fn with_offered_duration(mut self, offered_duration: f64) -> Self {
        self.offered_duration = offered_duration;
        self
    }

    /// Transactions the generator failed to send, `intended - offered`.
    #[inline]
    pub fn unsent_count(&self) -> i64 {
        self.intended_count - self.offered_count
    }

    /// Fraction of intended transactions that were lost or never sent.
    ///
    /// Always within `[0, 1]`; zero when nothing was intended or offered.
    pub fn loss_ratio(&self) -> f64 {
        let denominator = self.offered_count.max(self.intended_count);
        if denominator == 0 {
            return 0.0;
        }
        let lost = self.loss_count.unsigned_abs() + self.unsent_count().unsigned_abs();
        (lost as f64 / denominator as f64).min(1.0)
    }

    /// Intended load scaled by the fraction that made it through.
    #[inline]
    pub fn relative_receive_rate(&self) -> f64 {
        self.intended_load * (1.0 - self.loss_ratio())
    }
}

/// A [`Measurement`] as stored in the measurement database.
///
/// Ordered by intended load, then intended duration. The effective loss ratio
/// is assigned by database normalization and never decreases with load.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparableMeasurement {
    /// The underlying trial result.
    pub measurement: Measurement,

    /// Largest loss ratio seen at this load or any lower load.
    pub effective_loss_ratio: f64,
}

impl ComparableMeasurement {
    /// Wrap a measurement, with the effective ratio equal to its own ratio.
    pub fn new(measurement: Measurement) -> Self {
        Self {
            effective_loss_ratio: measurement.loss_ratio(),
            measurement,
        }
    }

    /// Intended load [tps].
    #[inline]
    pub fn load(&self) -> f64 {
        self.measurement.intended_load
    }

    /// Intended duration [s].
    #[inline]
    pub fn duration(&self) -> f64 {
        self.measurement.intended_duration
    }

    /// Loss ratio of this measurement alone.
    #[inline]
    pub fn loss_ratio(&self) -> f64 {
        self.measurement.loss_ratio()
    }

    /// True when the effective ratio does not exceed `ratio`.
    #[inline]
    pub fn is_lower_bound_for(&self, ratio: f64) -> bool {
        self.effective_loss_ratio <= ratio
    }

    /// Compare by intended load, then intended duration.
    pub fn cmp_by_load(&self, other: &Self) -> Ordering {
        self.load()
            .total_cmp(&other.load())
            .then_with(|| self.duration().total_cmp(&other.duration()))
    }
}

impl From<Measurement> for ComparableMeasurement {
    fn from(measurement: Measurement) -> Self {
        Self::new(measurement)
    }
}
