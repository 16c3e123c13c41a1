//! Relative width arithmetic.
//!
//! Loads are compared on a logarithmic scale. The relative width between a
//! lower load `lo` and a higher load `hi` is `(hi - lo) / hi`, so moving a
//! load by a width multiplies it by `1 - width`. Combining widths multiplies
//! `ln(1 - width)`, which is computed with `log1p` and `expm1` so that widths
//! near the machine epsilon keep their precision.

use crate::constants::{ROUNDING_CONSTANT, UNEVEN_HALVING_THRESHOLD};
use crate::math;

/// Load one relative width below `load`.
#[inline]
pub fn shift_down(load: f64, width: f64) -> f64 {
    load * (1.0 - width)
}

/// Load one relative width above `load`.
#[inline]
pub fn shift_up(load: f64, width: f64) -> f64 {
    load / (1.0 - width)
}

/// Relative width between two loads, `(high - low) / high`.
#[inline]
pub fn relative_width(low_load: f64, high_load: f64) -> f64 {
    (high_load - low_load) / high_load
}

/// Width whose logarithm is `coefficient` times that of `width`.
///
/// A coefficient of 2 doubles the width in logarithmic terms, 0.5 halves it.
///
/// # Example
///
/// ```
/// use mlrsearch_core::width::combine_width;
///
/// // Two consecutive 10% steps down leave 81% of the load.
/// assert!((combine_width(0.1, 2.0) - 0.19).abs() < 1e-12);
/// ```
#[inline]
pub fn combine_width(width: f64, coefficient: f64) -> f64 {
    -math::expm1(coefficient * math::log1p(-width))
}

/// How many goal widths fit into `width`, as a real number.
#[inline]
pub fn width_in_goals(width: f64, goal: f64) -> f64 {
    math::log1p(-width) / math::log1p(-goal)
}

/// Half of `width` in logarithmic terms.
#[inline]
pub fn halve_even(width: f64) -> f64 {
    combine_width(width, 0.5)
}

/// Width of the upper part when splitting `width` into whole goal multiples.
///
/// Wide intervals are split so that the upper part spans an even number of
/// goal widths (`ceil(wig / 2)` goals rounded down slightly), which keeps
/// later bisections aligned to the final goal. Narrow intervals, up to
/// [`UNEVEN_HALVING_THRESHOLD`] goals, are halved evenly.
pub fn halve_uneven(width: f64, goal: f64) -> f64 {
    let wig = width_in_goals(width, goal);
    if wig <= UNEVEN_HALVING_THRESHOLD {
        return halve_even(width);
    }
    let upper_goals = math::ceil(wig / 2.0);
    combine_width(goal, upper_goals * ROUNDING_CONSTANT)
}

/// Load reached by stepping down from `load` by `width` expanded `coefficient` times.
#[inline]
pub fn extend_down(load: f64, width: f64, coefficient: f64) -> f64 {
    shift_down(load, combine_width(width, coefficient * ROUNDING_CONSTANT))
}

/// Load reached by stepping up from `load` by `width` expanded `coefficient` times.
#[inline]
pub fn extend_up(load: f64, width: f64, coefficient: f64) -> f64 {
    shift_up(load, combine_width(width, coefficient * ROUNDING_CONSTANT))
}

/// Load splitting `[low_load, high_load]` per [`halve_uneven`].
#[inline]
pub fn halving_point(low_load: f64, high_load: f64, goal: f64) -> f64 {
    let width = relative_width(low_load, high_load);
    shift_down(high_load, halve_uneven(width, goal))
}

/// Geometric middle of two loads.
#[inline]
pub fn geometric_middle(low_load: f64, high_load: f64) -> f64 {
    math::sqrt(low_load * high_load)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_round_trip() {
        let load = 123_456.0;
        let back = shift_up(shift_down(load, 0.02), 0.02);
        assert!((back - load).abs() < 1e-6);
    }

    #[test]
    fn test_relative_width_of_shift() {
        let hi = 1_000_000.0;
        let lo = shift_down(hi, 0.005);
        assert!((relative_width(lo, hi) - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_combine_width_identity() {
        assert!((combine_width(0.3, 1.0) - 0.3).abs() < 1e-15);
    }

    #[test]
    fn test_combine_width_tiny_width_keeps_precision() {
        let w = 1e-12;
        assert!((combine_width(w, 2.0) - 2e-12).abs() < 1e-22);
    }

    #[test]
    fn test_width_in_goals_counts_steps() {
        let goal = 0.005;
        let width = combine_width(goal, 3.0);
        assert!((width_in_goals(width, goal) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_halve_even_twice_gives_original() {
        let w = 0.2;
        let half = halve_even(w);
        assert!((combine_width(half, 2.0) - w).abs() < 1e-12);
    }

    #[test]
    fn test_halve_uneven_small_width_is_even() {
        let goal = 0.01;
        let width = combine_width(goal, 1.8);
        assert_eq!(halve_uneven(width, goal), halve_even(width));
    }

    #[test]
    fn test_halve_uneven_wide_width_uses_goal_multiples() {
        let goal = 0.01;
        // Seven goals: the upper part covers four of them (slightly less).
        let width = combine_width(goal, 7.0);
        let upper = halve_uneven(width, goal);
        let upper_goals = width_in_goals(upper, goal);
        assert!(upper_goals < 4.0);
        assert!(upper_goals > 3.99);
        // Lower part is three goals and a bit.
        let lower_goals = 7.0 - upper_goals;
        assert!(lower_goals > 3.0);
    }

    #[test]
    fn test_halve_uneven_just_below_three_goals_is_even() {
        let goal = 0.01;
        let width = combine_width(goal, 2.85);
        assert_eq!(halve_uneven(width, goal), halve_even(width));
    }

    #[test]
    fn test_extend_then_halve_never_overshoots_goal() {
        let goal = 0.005;
        let hi = 100_000.0;
        let lo = extend_down(hi, goal, 4.0);
        let mut width = relative_width(lo, hi);
        for _ in 0..2 {
            width = halve_even(width);
        }
        assert!(width <= goal);
    }

    #[test]
    fn test_extend_up_down_symmetry() {
        let load = 50_000.0;
        let up = extend_up(load, 0.01, 4.0);
        let down = extend_down(up, 0.01, 4.0);
        assert!((down - load).abs() < 1e-6);
    }

    #[test]
    fn test_halving_point_inside_interval() {
        let point = halving_point(1000.0, 1_000_000.0, 0.005);
        assert!(point > 1000.0);
        assert!(point < 1_000_000.0);
    }

    #[test]
    fn test_geometric_middle() {
        assert!((geometric_middle(100.0, 10_000.0) - 1000.0).abs() < 1e-9);
    }
}
