//! Measurement database with bound queries.
//!
//! The database keeps every measurement of one search run that still carries
//! information, sorted by load. After each insertion it is normalized:
//!
//! 1. Sorted by (load, duration).
//! 2. Dominated measurements are removed, so that each load keeps only its
//!    longest trial.
//! 3. Effective loss ratios are recomputed as a running maximum over
//!    ascending load.
//!
//! After normalization a lower bound for a target ratio is any measurement
//! with effective ratio at or below the target, and all of those sit below
//! every upper bound.

mod bounds;

pub use bounds::RelevantBounds;

use alloc::vec::Vec;

use crate::error::CoreError;
use crate::interval::Interval;
use crate::measurement::{ComparableMeasurement, Measurement};

/// Tightest and second-tightest bounds on each side of a target ratio.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValidBounds {
    /// Highest-load lower bound.
    pub lower1: Option<ComparableMeasurement>,
    /// Next lower bound below `lower1`.
    pub lower2: Option<ComparableMeasurement>,
    /// Lowest-load upper bound.
    pub upper1: Option<ComparableMeasurement>,
    /// Next upper bound above `upper1`.
    pub upper2: Option<ComparableMeasurement>,
}

/// Normalized set of measurements from one search run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementDatabase {
    measurements: Vec<ComparableMeasurement>,
}

impl MeasurementDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a database holding `seed`, normalized.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateMeasurement`] if two seed measurements
    /// share both load and duration.
    pub fn from_measurements<I>(seed: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = Measurement>,
    {
        let mut measurements: Vec<ComparableMeasurement> =
            seed.into_iter().map(ComparableMeasurement::new).collect();
        measurements.sort_by(ComparableMeasurement::cmp_by_load);
        if let Some(pair) = measurements
            .windows(2)
            .find(|pair| pair[0].load() == pair[1].load() && pair[0].duration() == pair[1].duration())
        {
            return Err(CoreError::DuplicateMeasurement {
                load: pair[0].load(),
                duration: pair[0].duration(),
            });
        }
        let mut db = Self { measurements };
        db.normalize();
        Ok(db)
    }

    /// Store a copy of `measurement` and re-normalize.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateMeasurement`] if a measurement with the
    /// same load and duration is already stored. The database is unchanged.
    pub fn add(&mut self, measurement: Measurement) -> Result<(), CoreError> {
        let load = measurement.intended_load;
        let duration = measurement.intended_duration;
        if self
            .measurements
            .iter()
            .any(|m| m.load() == load && m.duration() == duration)
        {
            return Err(CoreError::DuplicateMeasurement { load, duration });
        }
        self.measurements.push(ComparableMeasurement::new(measurement));
        self.normalize();
        Ok(())
    }

    fn normalize(&mut self) {
        self.measurements.sort_by(ComparableMeasurement::cmp_by_load);
        let before = self.measurements.len();

        // Scan from the highest load down. A kept measurement replaces any
        // candidate at its load with duration not above its own. It also
        // wins against a shorter candidate with a worse ratio when its load
        // is not higher than the candidate's.
        let mut kept: Vec<ComparableMeasurement> = Vec::with_capacity(before);
        for candidate in self.measurements.iter().rev() {
            let dominated = kept.iter().any(|k| {
                if k.duration() < candidate.duration() {
                    return false;
                }
                if k.load() == candidate.load() {
                    return true;
                }
                k.duration() > candidate.duration()
                    && k.loss_ratio() < candidate.loss_ratio()
                    && k.load() <= candidate.load()
            });
            if !dominated {
                kept.push(*candidate);
            }
        }
        kept.reverse();

        let mut running_max = 0.0_f64;
        for m in kept.iter_mut() {
            running_max = running_max.max(m.loss_ratio());
            m.effective_loss_ratio = running_max;
        }

        tracing::trace!(
            before = before,
            after = kept.len(),
            "normalized measurement database"
        );
        self.measurements = kept;
    }

    /// Number of stored measurements.
    #[inline]
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// True when nothing is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Iterate over stored measurements in ascending load order.
    pub fn iter(&self) -> impl Iterator<Item = &ComparableMeasurement> + '_ {
        self.measurements.iter()
    }

    /// Longest trial duration stored, if any.
    pub fn current_duration(&self) -> Option<f64> {
        self.measurements
            .iter()
            .map(ComparableMeasurement::duration)
            .reduce(f64::max)
    }

    fn at_least(&self, min_duration: f64) -> impl Iterator<Item = &ComparableMeasurement> + '_ {
        self.measurements
            .iter()
            .filter(move |m| m.duration() >= min_duration)
    }

    /// Bounds around `ratio` among measurements at least `min_duration` long.
    pub fn get_valid_bounds(&self, ratio: f64, min_duration: f64) -> ValidBounds {
        let mut bounds = ValidBounds::default();
        for m in self.at_least(min_duration) {
            if m.is_lower_bound_for(ratio) {
                bounds.lower2 = bounds.lower1;
                bounds.lower1 = Some(*m);
            } else if bounds.upper1.is_none() {
                bounds.upper1 = Some(*m);
            } else if bounds.upper2.is_none() {
                bounds.upper2 = Some(*m);
            }
        }
        bounds
    }

    /// Lowest-load measurement at least `min_duration` long.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no measurement is long enough.
    pub fn smallest_load_measurement(
        &self,
        min_duration: f64,
    ) -> Result<&ComparableMeasurement, CoreError> {
        self.at_least(min_duration)
            .next()
            .ok_or(CoreError::NotFound { min_duration })
    }

    /// Highest-load measurement at least `min_duration` long.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no measurement is long enough.
    pub fn largest_load_measurement(
        &self,
        min_duration: f64,
    ) -> Result<&ComparableMeasurement, CoreError> {
        self.at_least(min_duration)
            .last()
            .ok_or(CoreError::NotFound { min_duration })
    }

    /// One interval per ratio, from measurements at least `duration` long.
    ///
    /// A missing lower bound is replaced by the smallest-load measurement and
    /// a missing upper bound by the largest-load one, which may produce
    /// degenerate intervals.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if a bound is missing and no
    /// measurement is long enough to substitute.
    pub fn get_results(&self, ratios: &[f64], duration: f64) -> Result<Vec<Interval>, CoreError> {
        ratios
            .iter()
            .map(|&ratio| {
                let bounds = self.get_valid_bounds(ratio, duration);
                let low = match bounds.lower1 {
                    Some(m) => m,
                    None => *self.smallest_load_measurement(duration)?,
                };
                let high = match bounds.upper1 {
                    Some(m) => m,
                    None => *self.largest_load_measurement(duration)?,
                };
                Ok(Interval::new(low, high))
            })
            .collect()
    }
}
