//! Choice of the next load to measure within a phase.
//!
//! [`next_load`] is a pure function of the current bounds. Rules are tried in
//! a fixed order and the first one that applies decides:
//!
//! 1. Halve a combined current/previous interval that is one to two goals wide.
//! 2. Re-measure a short previous lower bound that is within a goal of the
//!    upper side.
//! 3. Re-measure a short previous upper bound sitting at the minimum load.
//! 4. Re-measure a short previous upper bound within a goal of the lower side.
//! 5. Re-measure a short previous lower bound sitting at the maximum load.
//! 6. Without a current lower bound, extend down from the upper bound.
//! 7. Without a current upper bound, extend up from the lower bound.
//! 8. With both bounds, stop when narrow enough, else bisect or extend down,
//!    whichever lands higher.
//!
//! Computed loads (rules 1, 6, 7, 8) go through [`LoadLimits::handle`];
//! re-measurements target loads that already exist and skip it.

use core::fmt;

use crate::database::RelevantBounds;
use crate::error::CoreError;
use crate::limits::LoadLimits;
use crate::width::{extend_down, extend_up, halving_point, relative_width, width_in_goals};

/// Parameters of one phase iteration for one target ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionContext {
    /// Target loss ratio.
    pub ratio: f64,
    /// Width goal of the current phase.
    pub width_goal: f64,
    /// Trial duration of the current phase [s].
    pub current_duration: f64,
    /// Configured load range.
    pub limits: LoadLimits,
    /// Multiplier applied to the last external step.
    pub expansion_coefficient: f64,
}

/// Why a load was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchAction {
    /// Halving an interval combined from current and previous bounds.
    Halve,
    /// Re-measuring a previous lower bound at the current duration.
    RefineLower,
    /// Re-measuring a previous upper bound at the minimum load.
    RefineMinimum,
    /// Re-measuring a previous upper bound at the current duration.
    RefineUpper,
    /// Re-measuring a previous lower bound at the maximum load.
    RefineMaximum,
    /// External search below the upper bound.
    ExtendDown,
    /// External search above the lower bound.
    ExtendUp,
    /// Internal search between the bounds.
    Bisect,
}

impl fmt::Display for SearchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Halve => "halve",
            Self::RefineLower => "refine lower",
            Self::RefineMinimum => "refine minimum",
            Self::RefineUpper => "refine upper",
            Self::RefineMaximum => "refine maximum",
            Self::ExtendDown => "extend down",
            Self::ExtendUp => "extend up",
            Self::Bisect => "bisect",
        };
        f.write_str(name)
    }
}

/// Why a phase stopped measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum PhaseEnd {
    /// Bounds are within the width goal.
    NarrowEnough,
    /// The upper bound is at the minimum load.
    HitMinimum,
    /// The lower bound is at the maximum load.
    HitMaximum,
}

impl fmt::Display for PhaseEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NarrowEnough => "narrow enough",
            Self::HitMinimum => "hit minimum load",
            Self::HitMaximum => "hit maximum load",
        };
        f.write_str(name)
    }
}

/// Outcome of [`next_load`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadSelection {
    /// Measure at `load` with the current phase duration.
    Measure {
        /// Target load [tps].
        load: f64,
        /// Rule that selected it.
        action: SearchAction,
    },
    /// The phase is finished for this ratio.
    Done(PhaseEnd),
}

impl LoadSelection {
    fn measure(load: f64, action: SearchAction) -> Self {
        Self::Measure { load, action }
    }
}

/// Decide the next load to measure, or that the phase is done.
///
/// # Errors
///
/// Returns [`CoreError::InvariantViolation`] when there is no bound of any
/// duration to start from, or when limit handling detects inconsistent
/// bounds.
pub fn next_load(
    ctx: &SelectionContext,
    bounds: &RelevantBounds,
) -> Result<LoadSelection, CoreError> {
    let goal = ctx.width_goal;
    let duration = ctx.current_duration;
    let min_load = ctx.limits.min_load;
    let max_load = ctx.limits.max_load;
    let clo = bounds.clo1.as_ref();
    let chi = bounds.chi1.as_ref();

    // Halving across phases.
    if let (Some(lo), Some(hi)) = (bounds.combined_lower(), bounds.combined_upper()) {
        let wig = width_in_goals(relative_width(lo.load(), hi.load()), goal);
        if wig > 1.0 && wig <= 2.0 {
            let load = halving_point(lo.load(), hi.load(), goal);
            return clamped(ctx, load, SearchAction::Halve, Some(lo.load()), Some(hi.load()));
        }
    }

    let current_narrow = match (clo, chi) {
        (Some(lo), Some(hi)) => width_in_goals(relative_width(lo.load(), hi.load()), goal) <= 1.0,
        _ => false,
    };

    if let Some(plo) = bounds.short_plo(duration) {
        if let Some(reference) = chi.or(bounds.phi.as_ref()) {
            if !current_narrow
                && plo.load() < reference.load()
                && width_in_goals(relative_width(plo.load(), reference.load()), goal) <= 1.0
            {
                return Ok(LoadSelection::measure(plo.load(), SearchAction::RefineLower));
            }
        }
    }

    if let Some(phi) = bounds.short_phi(duration) {
        if phi.load() == min_load {
            return Ok(LoadSelection::measure(phi.load(), SearchAction::RefineMinimum));
        }
    }

    if let Some(phi) = bounds.short_phi(duration) {
        if let Some(reference) = clo.or(bounds.plo.as_ref()) {
            if !current_narrow
                && reference.load() < phi.load()
                && width_in_goals(relative_width(reference.load(), phi.load()), goal) <= 1.0
            {
                return Ok(LoadSelection::measure(phi.load(), SearchAction::RefineUpper));
            }
        }
    }

    if let Some(plo) = bounds.short_plo(duration) {
        if plo.load() == max_load {
            return Ok(LoadSelection::measure(plo.load(), SearchAction::RefineMaximum));
        }
    }

    let Some(clo) = clo else {
        let Some(chi) = chi else {
            // Nothing at the current duration yet: carry a previous bound over.
            if let Some(plo) = bounds.plo.as_ref() {
                return Ok(LoadSelection::measure(plo.load(), SearchAction::RefineLower));
            }
            if let Some(phi) = bounds.phi.as_ref() {
                return Ok(LoadSelection::measure(phi.load(), SearchAction::RefineUpper));
            }
            return Err(CoreError::InvariantViolation {
                message: "no bounds to continue the search from",
            });
        };
        if chi.load() <= min_load {
            return Ok(LoadSelection::Done(PhaseEnd::HitMinimum));
        }
        let step = match bounds.chi2.as_ref() {
            Some(chi2) => relative_width(chi.load(), chi2.load()),
            None => goal,
        };
        let load = extend_down(chi.load(), step, ctx.expansion_coefficient);
        return Ok(match ctx.limits.handle(load, goal, None, Some(chi.load()))? {
            Some(load) => LoadSelection::measure(load, SearchAction::ExtendDown),
            None => LoadSelection::Done(PhaseEnd::HitMinimum),
        });
    };

    let Some(chi) = chi else {
        if clo.load() >= max_load {
            return Ok(LoadSelection::Done(PhaseEnd::HitMaximum));
        }
        let step = match bounds.clo2.as_ref() {
            Some(clo2) => relative_width(clo2.load(), clo.load()),
            None => goal,
        };
        let load = extend_up(clo.load(), step, ctx.expansion_coefficient);
        return Ok(match ctx.limits.handle(load, goal, Some(clo.load()), None)? {
            Some(load) => LoadSelection::measure(load, SearchAction::ExtendUp),
            None => LoadSelection::Done(PhaseEnd::HitMaximum),
        });
    };

    if current_narrow {
        return Ok(LoadSelection::Done(PhaseEnd::NarrowEnough));
    }
    let bisect = halving_point(clo.load(), chi.load(), goal);
    if let Some(chi2) = bounds.chi2.as_ref() {
        let step = relative_width(chi.load(), chi2.load());
        let extended = extend_down(chi.load(), step, ctx.expansion_coefficient);
        if extended > bisect {
            return clamped(
                ctx,
                extended,
                SearchAction::ExtendDown,
                Some(clo.load()),
                Some(chi.load()),
            );
        }
    }
    clamped(ctx, bisect, SearchAction::Bisect, Some(clo.load()), Some(chi.load()))
}

fn clamped(
    ctx: &SelectionContext,
    load: f64,
    action: SearchAction,
    clo: Option<f64>,
    chi: Option<f64>,
) -> Result<LoadSelection, CoreError> {
    Ok(match ctx.limits.handle(load, ctx.width_goal, clo, chi)? {
        Some(load) => LoadSelection::measure(load, action),
        None => LoadSelection::Done(PhaseEnd::NarrowEnough),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{ComparableMeasurement, Measurement};
    use crate::width::{geometric_middle, shift_down};

    const GOAL: f64 = 0.01;

    fn ctx(duration: f64) -> SelectionContext {
        SelectionContext {
            ratio: 0.0,
            width_goal: GOAL,
            current_duration: duration,
            limits: LoadLimits::new(1000.0, 1_000_000.0).unwrap(),
            expansion_coefficient: 4.0,
        }
    }

    fn lower(duration: f64, load: f64) -> Option<ComparableMeasurement> {
        let m = Measurement::from_offered_and_loss(duration, load, 1000, 0).unwrap();
        Some(m.into())
    }

    fn upper(duration: f64, load: f64) -> Option<ComparableMeasurement> {
        let m = Measurement::from_offered_and_loss(duration, load, 1000, 100).unwrap();
        Some(m.into())
    }

    fn expect_measure(selection: LoadSelection) -> (f64, SearchAction) {
        match selection {
            LoadSelection::Measure { load, action } => (load, action),
            LoadSelection::Done(end) => panic!("expected a measurement, got {:?}", end),
        }
    }

    #[test]
    fn test_narrow_enough() {
        let b = RelevantBounds {
            clo1: lower(1.0, shift_down(500_000.0, 0.005)),
            chi1: upper(1.0, 500_000.0),
            plo: lower(1.0, shift_down(500_000.0, 0.005)),
            phi: upper(1.0, 500_000.0),
            ..Default::default()
        };
        assert_eq!(
            next_load(&ctx(1.0), &b).unwrap(),
            LoadSelection::Done(PhaseEnd::NarrowEnough)
        );
    }

    #[test]
    fn test_bisect_wide_interval() {
        let b = RelevantBounds {
            clo1: lower(1.0, 100_000.0),
            chi1: upper(1.0, 1_000_000.0),
            plo: lower(1.0, 100_000.0),
            phi: upper(1.0, 1_000_000.0),
            ..Default::default()
        };
        let (load, action) = expect_measure(next_load(&ctx(1.0), &b).unwrap());
        assert_eq!(action, SearchAction::Bisect);
        let expected = halving_point(100_000.0, 1_000_000.0, GOAL);
        assert!((load - expected).abs() < 1e-6);
    }

    #[test]
    fn test_extend_down_beats_far_bisection() {
        let b = RelevantBounds {
            clo1: lower(1.0, 1000.0),
            chi1: upper(1.0, 500_000.0),
            chi2: upper(1.0, 510_000.0),
            plo: lower(1.0, 1000.0),
            phi: upper(1.0, 500_000.0),
            ..Default::default()
        };
        let (load, action) = expect_measure(next_load(&ctx(1.0), &b).unwrap());
        assert_eq!(action, SearchAction::ExtendDown);
        assert!(load < 500_000.0);
        assert!(load > 400_000.0);
    }

    #[test]
    fn test_extend_down_without_lower_bound() {
        let b = RelevantBounds {
            chi1: upper(1.0, 500_000.0),
            phi: upper(1.0, 500_000.0),
            ..Default::default()
        };
        let (load, action) = expect_measure(next_load(&ctx(1.0), &b).unwrap());
        assert_eq!(action, SearchAction::ExtendDown);
        assert!((load - extend_down(500_000.0, GOAL, 4.0)).abs() < 1e-6);
    }

    #[test]
    fn test_upper_bound_at_minimum_ends_phase() {
        let b = RelevantBounds {
            chi1: upper(1.0, 1000.0),
            phi: upper(1.0, 1000.0),
            ..Default::default()
        };
        assert_eq!(
            next_load(&ctx(1.0), &b).unwrap(),
            LoadSelection::Done(PhaseEnd::HitMinimum)
        );
    }

    #[test]
    fn test_extend_up_without_upper_bound() {
        let b = RelevantBounds {
            clo1: lower(1.0, 100_000.0),
            plo: lower(1.0, 100_000.0),
            ..Default::default()
        };
        let (load, action) = expect_measure(next_load(&ctx(1.0), &b).unwrap());
        assert_eq!(action, SearchAction::ExtendUp);
        assert!((load - extend_up(100_000.0, GOAL, 4.0)).abs() < 1e-6);
    }

    #[test]
    fn test_lower_bound_at_maximum_ends_phase() {
        let b = RelevantBounds {
            clo1: lower(1.0, 1_000_000.0),
            plo: lower(1.0, 1_000_000.0),
            ..Default::default()
        };
        assert_eq!(
            next_load(&ctx(1.0), &b).unwrap(),
            LoadSelection::Done(PhaseEnd::HitMaximum)
        );
    }

    #[test]
    fn test_halve_previous_phase_interval() {
        let b = RelevantBounds {
            plo: lower(1.0, 492_000.0),
            phi: upper(1.0, 500_000.0),
            ..Default::default()
        };
        let (load, action) = expect_measure(next_load(&ctx(10.0), &b).unwrap());
        assert_eq!(action, SearchAction::Halve);
        assert!((load - geometric_middle(492_000.0, 500_000.0)).abs() < 1e-3);
    }

    #[test]
    fn test_refine_short_lower_bound() {
        let b = RelevantBounds {
            chi1: upper(10.0, 500_000.0),
            plo: lower(1.0, 497_000.0),
            phi: upper(10.0, 500_000.0),
            ..Default::default()
        };
        let (load, action) = expect_measure(next_load(&ctx(10.0), &b).unwrap());
        assert_eq!(action, SearchAction::RefineLower);
        assert_eq!(load, 497_000.0);
    }

    #[test]
    fn test_refine_short_upper_bound() {
        let b = RelevantBounds {
            clo1: lower(10.0, 497_000.0),
            plo: lower(10.0, 497_000.0),
            phi: upper(1.0, 500_000.0),
            ..Default::default()
        };
        let (load, action) = expect_measure(next_load(&ctx(10.0), &b).unwrap());
        assert_eq!(action, SearchAction::RefineUpper);
        assert_eq!(load, 500_000.0);
    }

    #[test]
    fn test_refine_minimum() {
        let b = RelevantBounds {
            phi: upper(1.0, 1000.0),
            ..Default::default()
        };
        let (load, action) = expect_measure(next_load(&ctx(10.0), &b).unwrap());
        assert_eq!(action, SearchAction::RefineMinimum);
        assert_eq!(load, 1000.0);
    }

    #[test]
    fn test_refine_maximum() {
        let b = RelevantBounds {
            plo: lower(1.0, 1_000_000.0),
            ..Default::default()
        };
        let (load, action) = expect_measure(next_load(&ctx(10.0), &b).unwrap());
        assert_eq!(action, SearchAction::RefineMaximum);
        assert_eq!(load, 1_000_000.0);
    }

    #[test]
    fn test_wide_previous_interval_carries_lower_bound() {
        let b = RelevantBounds {
            plo: lower(1.0, 100_000.0),
            phi: upper(1.0, 900_000.0),
            ..Default::default()
        };
        let (load, action) = expect_measure(next_load(&ctx(10.0), &b).unwrap());
        assert_eq!(action, SearchAction::RefineLower);
        assert_eq!(load, 100_000.0);
    }

    #[test]
    fn test_no_bounds_is_invariant_violation() {
        let b = RelevantBounds::default();
        assert!(matches!(
            next_load(&ctx(1.0), &b),
            Err(CoreError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_display_names() {
        use alloc::string::ToString;
        assert_eq!(SearchAction::ExtendDown.to_string(), "extend down");
        assert_eq!(PhaseEnd::HitMinimum.to_string(), "hit minimum load");
    }
}
