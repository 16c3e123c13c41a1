//! Initial trials that seed the measurement database.
//!
//! Bootstrap uses the initial trial duration. It measures at the maximum
//! load, estimates where the first target ratio could be met from the
//! forwarding rate seen there, and refines that estimate once more. At most
//! three trials are spent.
//!
//! An optional warmup trial at the maximum load may run first. Its result is
//! discarded and never reaches the database.

use mlrsearch_core::width::shift_up;
use mlrsearch_core::{LoadLimits, Measurement};

use super::Trials;
use crate::error::SearchError;
use crate::provider::MeasurementProvider;

/// Load where `measurement` suggests the loss ratio would be `ratio`.
fn corrected_estimate(measurement: &Measurement, ratio: f64) -> f64 {
    measurement.relative_receive_rate() / (1.0 - ratio)
}

/// Run one trial at the maximum load and throw the result away.
pub(crate) fn warmup<P: MeasurementProvider>(
    trials: &mut Trials<'_, P>,
    limits: &LoadLimits,
    duration: f64,
) -> Result<(), SearchError> {
    let discarded = trials.measure(duration, limits.max_load)?;
    tracing::debug!(
        load = limits.max_load,
        duration = duration,
        loss_ratio = discarded.loss_ratio(),
        "warmup trial discarded"
    );
    Ok(())
}

/// Run the bootstrap trials and return the measurements to seed with.
pub(crate) fn bootstrap<P: MeasurementProvider>(
    trials: &mut Trials<'_, P>,
    limits: &LoadLimits,
    duration: f64,
    width_goal: f64,
    first_ratio: f64,
) -> Result<Vec<Measurement>, SearchError> {
    let max_load = limits.max_load;
    let line = trials.measure(duration, max_load)?;
    let estimate = corrected_estimate(&line, first_ratio);
    tracing::debug!(
        load = max_load,
        loss_ratio = line.loss_ratio(),
        estimate = estimate,
        "bootstrap line measurement"
    );
    if estimate > max_load {
        return Ok(vec![line]);
    }

    let Some(mrr_load) = limits.handle(estimate, width_goal, None, Some(max_load))? else {
        return Ok(vec![line]);
    };
    let mrr = trials.measure(duration, mrr_load)?;
    tracing::debug!(
        load = mrr_load,
        loss_ratio = mrr.loss_ratio(),
        "bootstrap receive rate measurement"
    );

    let mrr2_load = if mrr.loss_ratio() > first_ratio {
        limits.handle(
            corrected_estimate(&mrr, first_ratio),
            width_goal,
            None,
            Some(mrr_load),
        )?
    } else {
        // The line measurement already covers the maximum load.
        limits
            .handle(shift_up(mrr_load, width_goal), width_goal, Some(mrr_load), None)?
            .filter(|&load| load < max_load)
    };

    match mrr2_load {
        Some(load) if load != mrr_load => {
            let mrr2 = trials.measure(duration, load)?;
            tracing::debug!(
                load = load,
                loss_ratio = mrr2.loss_ratio(),
                "bootstrap refinement measurement"
            );
            Ok(vec![mrr, mrr2])
        }
        _ => Ok(vec![line, mrr]),
    }
}
