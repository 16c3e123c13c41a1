//! Bounds the load selection looks at in one phase iteration.

use super::MeasurementDatabase;
use crate::measurement::ComparableMeasurement;

/// Current-duration and previous-duration bounds for one target ratio.
///
/// The `c*` bounds come from trials at least as long as the current phase
/// duration, `plo`/`phi` from trials at least as long as the previous phase
/// duration. Longer trials count for both, so `plo` is never below `clo1`
/// and `phi` never above `chi1`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelevantBounds {
    /// Tightest current-duration lower bound.
    pub clo1: Option<ComparableMeasurement>,
    /// Second-tightest current-duration lower bound.
    pub clo2: Option<ComparableMeasurement>,
    /// Tightest current-duration upper bound.
    pub chi1: Option<ComparableMeasurement>,
    /// Second-tightest current-duration upper bound.
    pub chi2: Option<ComparableMeasurement>,
    /// Tightest previous-duration lower bound.
    pub plo: Option<ComparableMeasurement>,
    /// Tightest previous-duration upper bound.
    pub phi: Option<ComparableMeasurement>,
}

impl RelevantBounds {
    /// Query `database` for the bounds around `ratio`.
    pub fn from_database(
        database: &MeasurementDatabase,
        ratio: f64,
        current_duration: f64,
        previous_duration: f64,
    ) -> Self {
        let current = database.get_valid_bounds(ratio, current_duration);
        let previous = database.get_valid_bounds(ratio, previous_duration);
        Self {
            clo1: current.lower1,
            clo2: current.lower2,
            chi1: current.upper1,
            chi2: current.upper2,
            plo: previous.lower1,
            phi: previous.upper1,
        }
    }

    /// Previous lower bound, if it came from a trial shorter than `duration`.
    pub fn short_plo(&self, duration: f64) -> Option<&ComparableMeasurement> {
        self.plo.as_ref().filter(|m| m.duration() < duration)
    }

    /// Previous upper bound, if it came from a trial shorter than `duration`.
    pub fn short_phi(&self, duration: f64) -> Option<&ComparableMeasurement> {
        self.phi.as_ref().filter(|m| m.duration() < duration)
    }

    /// Tighter of `clo1` and `plo`.
    pub fn combined_lower(&self) -> Option<&ComparableMeasurement> {
        match (self.clo1.as_ref(), self.plo.as_ref()) {
            (Some(c), Some(p)) => Some(if p.load() > c.load() { p } else { c }),
            (c, p) => c.or(p),
        }
    }

    /// Tighter of `chi1` and `phi`.
    pub fn combined_upper(&self) -> Option<&ComparableMeasurement> {
        match (self.chi1.as_ref(), self.phi.as_ref()) {
            (Some(c), Some(p)) => Some(if p.load() < c.load() { p } else { c }),
            (c, p) => c.or(p),
        }
    }
}
