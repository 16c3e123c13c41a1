//! Trial durations and width goals per search phase.
//!
//! Phase 0 uses the initial trial duration and the widest goal. Each later
//! phase multiplies the duration by the same factor and halves the width goal
//! in logarithmic terms, until the last phase reaches exactly the final
//! duration and the final width goal.

use alloc::vec::Vec;

use crate::constants::PHASE_WIDTH_COEFFICIENT;
use crate::error::CoreError;
use crate::math;
use crate::width::combine_width;

/// Precomputed duration and width goal for every phase.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseSchedule {
    durations: Vec<f64>,
    width_goals: Vec<f64>,
}

impl PhaseSchedule {
    /// Build a schedule with `phases` intermediate phases plus the final one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSchedule`] when `phases` is zero, a duration
    /// is not positive, the final duration is shorter than the initial one, or
    /// the width is outside `(0, 1)`.
    ///
    /// # Example
    ///
    /// ```
    /// use mlrsearch_core::PhaseSchedule;
    ///
    /// let schedule = PhaseSchedule::new(2, 1.0, 30.0, 0.005).unwrap();
    /// assert_eq!(schedule.duration(0), 1.0);
    /// assert_eq!(schedule.duration(2), 30.0);
    /// assert_eq!(schedule.width_goal(2), 0.005);
    /// ```
    pub fn new(
        phases: usize,
        initial_duration: f64,
        final_duration: f64,
        final_width: f64,
    ) -> Result<Self, CoreError> {
        if phases == 0 {
            return Err(CoreError::InvalidSchedule {
                message: "at least one intermediate phase is required",
            });
        }
        if !(initial_duration.is_finite() && initial_duration > 0.0) {
            return Err(CoreError::InvalidSchedule {
                message: "initial duration must be positive and finite",
            });
        }
        if !(final_duration.is_finite() && final_duration > 0.0) {
            return Err(CoreError::InvalidSchedule {
                message: "final duration must be positive and finite",
            });
        }
        if final_duration < initial_duration {
            return Err(CoreError::InvalidSchedule {
                message: "final duration must not be shorter than initial duration",
            });
        }
        if !(final_width > 0.0 && final_width < 1.0) {
            return Err(CoreError::InvalidSchedule {
                message: "final width must be within (0, 1)",
            });
        }

        let multiplier = math::pow(final_duration / initial_duration, 1.0 / phases as f64);
        let mut durations: Vec<f64> = (0..=phases)
            .map(|i| initial_duration * math::pow(multiplier, i as f64))
            .collect();
        // Endpoints exactly as given, free of pow rounding.
        durations[0] = initial_duration;
        durations[phases] = final_duration;

        let mut width_goals = alloc::vec![final_width; phases + 1];
        for i in (0..phases).rev() {
            width_goals[i] = combine_width(width_goals[i + 1], PHASE_WIDTH_COEFFICIENT);
        }

        Ok(Self {
            durations,
            width_goals,
        })
    }

    /// Index of the final phase, equal to the number of intermediate phases.
    #[inline]
    pub fn phases(&self) -> usize {
        self.durations.len() - 1
    }

    /// Trial duration of phase `index` [s].
    ///
    /// # Panics
    ///
    /// Panics if `index > self.phases()`.
    #[inline]
    pub fn duration(&self, index: usize) -> f64 {
        self.durations[index]
    }

    /// Width goal of phase `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > self.phases()`.
    #[inline]
    pub fn width_goal(&self, index: usize) -> f64 {
        self.width_goals[index]
    }

    /// Duration of the phase before `index`, or of phase 0 for `index == 0`.
    #[inline]
    pub fn previous_duration(&self, index: usize) -> f64 {
        self.durations[index.saturating_sub(1)]
    }

    /// Trial duration of phase 0 [s].
    #[inline]
    pub fn initial_duration(&self) -> f64 {
        self.durations[0]
    }

    /// Trial duration of the final phase [s].
    #[inline]
    pub fn final_duration(&self) -> f64 {
        self.durations[self.phases()]
    }

    /// Width goal of phase 0.
    #[inline]
    pub fn initial_width_goal(&self) -> f64 {
        self.width_goals[0]
    }

    /// Width goal of the final phase.
    #[inline]
    pub fn final_width_goal(&self) -> f64 {
        self.width_goals[self.phases()]
    }

    /// Iterate over `(index, duration, width_goal)` for all phases.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.durations
            .iter()
            .zip(self.width_goals.iter())
            .enumerate()
            .map(|(i, (&d, &w))| (i, d, w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::width::width_in_goals;

    #[test]
    fn test_endpoints_exact() {
        for phases in 1..6 {
            let s = PhaseSchedule::new(phases, 0.7, 29.3, 0.0043).unwrap();
            assert_eq!(s.phases(), phases);
            assert_eq!(s.duration(0), 0.7);
            assert_eq!(s.duration(phases), 29.3);
            assert_eq!(s.width_goal(phases), 0.0043);
            assert_eq!(s.final_duration(), 29.3);
            assert_eq!(s.final_width_goal(), 0.0043);
        }
    }

    #[test]
    fn test_durations_geometric() {
        let s = PhaseSchedule::new(2, 1.0, 100.0, 0.005).unwrap();
        assert!((s.duration(1) - 10.0).abs() < 1e-9);
        assert_eq!(s.previous_duration(0), 1.0);
        assert!((s.previous_duration(2) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_width_goals_double_per_phase() {
        let s = PhaseSchedule::new(3, 1.0, 8.0, 0.005).unwrap();
        for i in 0..3 {
            let wig = width_in_goals(s.width_goal(i), s.width_goal(i + 1));
            assert!((wig - PHASE_WIDTH_COEFFICIENT).abs() < 1e-9);
            assert!(wig < 2.0);
        }
        assert!(s.initial_width_goal() > s.final_width_goal());
    }

    #[test]
    fn test_equal_durations_allowed() {
        let s = PhaseSchedule::new(2, 5.0, 5.0, 0.01).unwrap();
        assert!(s.iter().all(|(_, d, _)| d == 5.0));
    }

    #[test]
    fn test_iter_covers_all_phases() {
        let s = PhaseSchedule::new(4, 1.0, 16.0, 0.01).unwrap();
        let entries: Vec<_> = s.iter().collect();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[4], (4, 16.0, 0.01));
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(PhaseSchedule::new(0, 1.0, 30.0, 0.005).is_err());
        assert!(PhaseSchedule::new(2, 0.0, 30.0, 0.005).is_err());
        assert!(PhaseSchedule::new(2, 1.0, -1.0, 0.005).is_err());
        assert!(PhaseSchedule::new(2, 10.0, 1.0, 0.005).is_err());
        assert!(PhaseSchedule::new(2, 1.0, 30.0, 0.0).is_err());
        assert!(PhaseSchedule::new(2, 1.0, 30.0, 1.0).is_err());
    }
}
