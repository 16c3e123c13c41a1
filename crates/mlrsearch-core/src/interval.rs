//! Load intervals bounded by two measurements.

use core::fmt;

use crate::measurement::ComparableMeasurement;
use crate::width;

/// Pair of measurements, the lower-load one first.
///
/// For a finished search the low side is the lower bound (effective loss
/// ratio at or below the target) and the high side the upper bound. The two
/// sides may be the same measurement when no bound was found on one side.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    low: ComparableMeasurement,
    high: ComparableMeasurement,
}

impl Interval {
    /// Create an interval, swapping the arguments if needed.
    pub fn new(a: ComparableMeasurement, b: ComparableMeasurement) -> Self {
        if a.load() <= b.load() {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Measurement at the lower load.
    #[inline]
    pub fn low(&self) -> &ComparableMeasurement {
        &self.low
    }

    /// Measurement at the higher load.
    #[inline]
    pub fn high(&self) -> &ComparableMeasurement {
        &self.high
    }

    /// Difference of the two loads [tps].
    #[inline]
    pub fn absolute_width(&self) -> f64 {
        self.high.load() - self.low.load()
    }

    /// Relative width, zero for a degenerate interval.
    #[inline]
    pub fn relative_width(&self) -> f64 {
        width::relative_width(self.low.load(), self.high.load())
    }

    /// Relative width expressed in multiples of `goal`.
    #[inline]
    pub fn width_in_goals(&self, goal: f64) -> f64 {
        width::width_in_goals(self.relative_width(), goal)
    }

    /// True when both sides are at the same load.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.low.load() == self.high.load()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.3}, {:.3}] tps (relative width {:.6})",
            self.low.load(),
            self.high.load(),
            self.relative_width()
        )
    }
}
