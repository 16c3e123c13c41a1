//! Load limit handling.
//!
//! Candidate loads are computed by width arithmetic and know nothing about
//! the configured rate range or about loads that are already bounds. Before a
//! candidate is measured it goes through [`LoadLimits::handle`], which:
//!
//! - clamps it into `[min_load, max_load]`,
//! - keeps it at least one width goal away from existing bounds, moving it
//!   toward the middle of the remaining gap,
//! - reports `None` when the gap between bounds is already narrow enough, so
//!   no measurement there could change the outcome.
//!
//! The configured limits themselves may be measured, existing bounds may not.

use crate::error::CoreError;
use crate::width::{geometric_middle, relative_width, shift_down, shift_up};

/// Minimum and maximum load allowed for trials.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadLimits {
    /// Smallest load that may be measured [tps].
    pub min_load: f64,
    /// Largest load that may be measured [tps].
    pub max_load: f64,
}

impl LoadLimits {
    /// Create limits, requiring `0 < min_load < max_load`, both finite.
    pub fn new(min_load: f64, max_load: f64) -> Result<Self, CoreError> {
        if !(min_load.is_finite() && min_load > 0.0) {
            return Err(CoreError::InvariantViolation {
                message: "minimum load must be positive and finite",
            });
        }
        if !(max_load.is_finite() && max_load > min_load) {
            return Err(CoreError::InvariantViolation {
                message: "maximum load must be finite and above minimum load",
            });
        }
        Ok(Self { min_load, max_load })
    }

    /// Clamp `load` into the limits.
    #[inline]
    pub fn clamp(&self, load: f64) -> f64 {
        load.max(self.min_load).min(self.max_load)
    }

    /// Adjust a candidate `load` to the limits and to adjacent bound loads.
    ///
    /// `clo` is the load of the current lower bound and `chi` of the current
    /// upper bound, when they exist. Returns `Ok(None)` when there is nothing
    /// worth measuring between the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvariantViolation`] when a lower bound exists
    /// and the candidate is not above it, or when the candidate is not below
    /// an upper bound that comes with a lower bound.
    pub fn handle(
        &self,
        load: f64,
        width_goal: f64,
        clo: Option<f64>,
        chi: Option<f64>,
    ) -> Result<Option<f64>, CoreError> {
        let load = self.clamp(load);
        let rounded = match (clo, chi) {
            (None, None) => {
                round_within(load, width_goal, self.min_load, false, self.max_load, false)
            }
            (None, Some(chi)) => {
                if chi <= self.min_load || load >= chi {
                    return Ok(None);
                }
                round_within(load, width_goal, self.min_load, false, chi, true)
            }
            (Some(clo), None) => {
                if clo >= self.max_load {
                    return Err(CoreError::InvariantViolation {
                        message: "lower bound already at maximum load",
                    });
                }
                if load <= clo {
                    return Err(CoreError::InvariantViolation {
                        message: "higher load expected",
                    });
                }
                round_within(load, width_goal, clo, true, self.max_load, false)
            }
            (Some(clo), Some(chi)) => {
                if load <= clo {
                    return Err(CoreError::InvariantViolation {
                        message: "higher load expected",
                    });
                }
                if load >= chi {
                    return Err(CoreError::InvariantViolation {
                        message: "lower load expected",
                    });
                }
                round_within(load, width_goal, clo, true, chi, true)
            }
        };
        Ok(rounded.map(|l| self.clamp(l)))
    }
}

/// Keep `load` one goal away from excluded ends of `[low, high]`.
fn round_within(
    load: f64,
    goal: f64,
    low: f64,
    low_excluded: bool,
    high: f64,
    high_excluded: bool,
) -> Option<f64> {
    if relative_width(low, high) <= goal {
        return match (low_excluded, high_excluded) {
            (false, _) => Some(low),
            (true, false) => Some(high),
            (true, true) => None,
        };
    }
    let mut soft_low = shift_up(low, goal);
    let mut soft_high = shift_down(high, goal);
    if soft_low > soft_high {
        let middle = geometric_middle(low, high);
        soft_low = middle;
        soft_high = middle;
    }
    if load < soft_low {
        return Some(if low_excluded { soft_low } else { low });
    }
    if load > soft_high {
        return Some(if high_excluded { soft_high } else { high });
    }
    Some(load)
}
