//! Numeric constants shared by the search.

/// Factor applied to width coefficients when expanding or halving.
///
/// Slightly below one, so that an expanded width halved the matching number
/// of times never ends up wider than the goal it started from.
pub const ROUNDING_CONSTANT: f64 = 0.999999;

/// Widths of at most this many goals are halved evenly.
///
/// Above two goals the uneven split needs `ceil(wig / 2)`, and close to three
/// goals rounding errors make that ceiling unreliable, so the even split is
/// kept up to here.
pub const UNEVEN_HALVING_THRESHOLD: f64 = 2.9;

/// Default multiplier for external search steps.
pub const DEFAULT_EXPANSION_COEFFICIENT: f64 = 4.0;

/// Coefficient relating width goals of consecutive phases.
///
/// Each earlier phase gets a width twice as large in logarithmic terms,
/// reduced twice by [`ROUNDING_CONSTANT`].
pub const PHASE_WIDTH_COEFFICIENT: f64 = 2.0 * ROUNDING_CONSTANT * ROUNDING_CONSTANT;
