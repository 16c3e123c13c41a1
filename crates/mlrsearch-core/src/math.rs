//! Math functions for no_std compatibility.
//!
//! In no_std mode, f64 doesn't have transcendental methods like ln or exp.
//! This module provides the ones width arithmetic needs using libm.

/// `ln(1 + x)`, accurate for small `x`.
#[inline]
pub fn log1p(x: f64) -> f64 {
    libm::log1p(x)
}

/// `e^x - 1`, accurate for small `x`.
#[inline]
pub fn expm1(x: f64) -> f64 {
    libm::expm1(x)
}

/// Natural logarithm.
#[inline]
pub fn ln(x: f64) -> f64 {
    libm::log(x)
}

/// Ceiling (round up).
#[inline]
pub fn ceil(x: f64) -> f64 {
    libm::ceil(x)
}

/// Power (x^y).
#[inline]
pub fn pow(x: f64, y: f64) -> f64 {
    libm::pow(x, y)
}

/// Square root.
#[inline]
pub fn sqrt(x: f64) -> f64 {
    libm::sqrt(x)
}
