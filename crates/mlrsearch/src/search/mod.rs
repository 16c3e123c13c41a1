//! The search controller.
//!
//! A run goes through three stages:
//!
//! 1. Bootstrap: an optional discarded warmup trial, then up to three
//!    trials at the initial duration seed the measurement database.
//! 2. Phases: for every target ratio in order, and for every phase of the
//!    schedule, loads are selected and measured until the phase ends.
//! 3. Results: one interval per ratio is read from trials at the final
//!    duration.
//!
//! The deadline is checked before every phase-loop trial.
//!
//! Each run emits its events inside an `mlrsearch` span. A dispatcher given
//! to [`MultipleLossRatioSearch::with_log_dispatch`] receives them instead of
//! the ambient one.

mod bootstrap;

use std::time::{Duration, Instant};

use mlrsearch_core::selection::next_load;
use mlrsearch_core::{
    Interval, LoadLimits, LoadSelection, Measurement, MeasurementDatabase, PhaseSchedule,
    RelevantBounds, SelectionContext,
};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::provider::MeasurementProvider;

/// Provider calls with a running count.
pub(crate) struct Trials<'a, P> {
    provider: &'a mut P,
    count: usize,
}

impl<'a, P: MeasurementProvider> Trials<'a, P> {
    pub(crate) fn new(provider: &'a mut P) -> Self {
        Self { provider, count: 0 }
    }

    pub(crate) fn measure(&mut self, duration: f64, load: f64) -> Result<Measurement, SearchError> {
        let measurement = self
            .provider
            .measure(duration, load)
            .map_err(|e| SearchError::Provider(Box::new(e)))?;
        self.count += 1;
        Ok(measurement)
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }
}

/// Everything a finished search produced.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchReport {
    /// One interval per target ratio, in input order.
    pub intervals: Vec<Interval>,

    /// Number of trials measured during this run.
    pub trial_count: usize,

    /// Wall-clock time spent.
    pub elapsed: Duration,

    /// Final state of the measurement database.
    pub database: MeasurementDatabase,
}

/// Multiple loss ratio search over a measurement provider.
///
/// # Example
///
/// ```
/// use mlrsearch::{Measurement, MultipleLossRatioSearch, SearchConfig};
/// use mlrsearch_core::CoreError;
///
/// // A system that forwards at most 500k transactions per second.
/// let provider = |duration: f64, load: f64| -> Result<Measurement, CoreError> {
///     let offered = (load * duration).round() as i64;
///     let forwarded = offered.min((500_000.0 * duration).round() as i64);
///     Measurement::from_offered_and_forwarding(duration, load, offered, forwarded)
/// };
///
/// let mut search = MultipleLossRatioSearch::new(SearchConfig::quick(), provider).unwrap();
/// let intervals = search
///     .narrow_down_intervals(1_000.0, 1_000_000.0, &[0.0, 0.005])
///     .unwrap();
/// assert!(intervals[0].low().load() <= 500_000.0);
/// assert!(intervals[0].high().load() > 500_000.0);
/// ```
pub struct MultipleLossRatioSearch<P> {
    config: SearchConfig,
    schedule: PhaseSchedule,
    provider: P,
    seed: Vec<Measurement>,
    dispatch: Option<tracing::Dispatch>,
}

impl<P: MeasurementProvider> MultipleLossRatioSearch<P> {
    /// Create a search, validating the configuration.
    pub fn new(config: SearchConfig, provider: P) -> Result<Self, SearchError> {
        let schedule = config.schedule()?;
        Ok(Self {
            config,
            schedule,
            provider,
            seed: Vec::new(),
            dispatch: None,
        })
    }

    /// Start every run from these measurements.
    ///
    /// Bootstrap is skipped when a seed measurement is at least as long as
    /// the initial trial duration.
    pub fn with_seed_measurements<I>(mut self, seed: I) -> Self
    where
        I: IntoIterator<Item = Measurement>,
    {
        self.seed = seed.into_iter().collect();
        self
    }

    /// Send this search's log events to `dispatch`.
    ///
    /// Without one, events go to whatever subscriber is current when a run
    /// starts.
    pub fn with_log_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The phase schedule derived from the configuration.
    pub fn schedule(&self) -> &PhaseSchedule {
        &self.schedule
    }

    /// The measurement provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The measurement provider, mutably.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Consume the search, returning the provider.
    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Search and return one interval per ratio, in input order.
    ///
    /// `ratios` must be non-empty, strictly increasing and within `[0, 1)`,
    /// and `0 < min_rate < max_rate`.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidConfig`] for invalid arguments, before any trial
    /// - [`SearchError::Timeout`] when the deadline passes between trials
    /// - [`SearchError::Provider`] when a trial fails
    /// - [`SearchError::Internal`] on a logic error inside the search
    pub fn narrow_down_intervals(
        &mut self,
        min_rate: f64,
        max_rate: f64,
        ratios: &[f64],
    ) -> Result<Vec<Interval>, SearchError> {
        Ok(self.narrow_down(min_rate, max_rate, ratios)?.intervals)
    }

    /// Search like [`narrow_down_intervals`](Self::narrow_down_intervals),
    /// also returning run statistics and the final database.
    pub fn narrow_down(
        &mut self,
        min_rate: f64,
        max_rate: f64,
        ratios: &[f64],
    ) -> Result<SearchReport, SearchError> {
        match self.dispatch.clone() {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, || {
                self.run(min_rate, max_rate, ratios)
            }),
            None => self.run(min_rate, max_rate, ratios),
        }
    }

    fn run(
        &mut self,
        min_rate: f64,
        max_rate: f64,
        ratios: &[f64],
    ) -> Result<SearchReport, SearchError> {
        let span = tracing::info_span!("mlrsearch", min_rate = min_rate, max_rate = max_rate);
        let _enter = span.enter();
        validate_ratios(ratios)?;
        let limits = validate_rates(min_rate, max_rate)?;
        let start = Instant::now();
        let timeout = self.config.timeout;
        let deadline = start.checked_add(timeout);
        let schedule = &self.schedule;

        tracing::info!(
            min_rate = min_rate,
            max_rate = max_rate,
            ratios = ?ratios,
            phases = schedule.phases(),
            "starting multiple loss ratio search"
        );

        let mut trials = Trials::new(&mut self.provider);
        if let Some(duration) = self.config.warmup_duration {
            bootstrap::warmup(&mut trials, &limits, duration)?;
        }
        let mut database = MeasurementDatabase::from_measurements(self.seed.iter().copied())?;
        let seeded = self
            .seed
            .iter()
            .any(|m| m.intended_duration >= schedule.initial_duration());
        if !seeded {
            let initial = bootstrap::bootstrap(
                &mut trials,
                &limits,
                schedule.initial_duration(),
                schedule.initial_width_goal(),
                ratios[0],
            )?;
            for measurement in initial {
                database.add(measurement)?;
            }
        }

        for &ratio in ratios {
            for (phase, duration, width_goal) in schedule.iter() {
                let previous_duration = schedule.previous_duration(phase);
                let ctx = SelectionContext {
                    ratio,
                    width_goal,
                    current_duration: duration,
                    limits,
                    expansion_coefficient: self.config.expansion_coefficient,
                };
                tracing::info!(
                    ratio = ratio,
                    phase = phase,
                    duration = duration,
                    width_goal = width_goal,
                    "starting phase"
                );
                let phase_start = trials.count();
                loop {
                    if deadline.map_or(false, |d| Instant::now() >= d) {
                        let elapsed = start.elapsed();
                        tracing::warn!(?elapsed, ?timeout, "search deadline passed");
                        return Err(SearchError::Timeout { elapsed, timeout });
                    }
                    let bounds =
                        RelevantBounds::from_database(&database, ratio, duration, previous_duration);
                    match next_load(&ctx, &bounds)? {
                        LoadSelection::Done(end) => {
                            tracing::info!(
                                ratio = ratio,
                                phase = phase,
                                reason = %end,
                                trials = trials.count() - phase_start,
                                "phase finished"
                            );
                            break;
                        }
                        LoadSelection::Measure { load, action } => {
                            tracing::debug!(
                                ratio = ratio,
                                phase = phase,
                                action = %action,
                                load = load,
                                "measuring"
                            );
                            let measurement = trials.measure(duration, load)?;
                            database.add(measurement)?;
                        }
                    }
                }
            }
        }

        let intervals = database.get_results(ratios, schedule.final_duration())?;
        let trial_count = trials.count();
        let elapsed = start.elapsed();
        for (ratio, interval) in ratios.iter().zip(&intervals) {
            tracing::info!(ratio = ratio, interval = %interval, "result");
        }
        tracing::info!(trials = trial_count, ?elapsed, "search finished");

        Ok(SearchReport {
            intervals,
            trial_count,
            elapsed,
            database,
        })
    }
}

fn validate_ratios(ratios: &[f64]) -> Result<(), SearchError> {
    if ratios.is_empty() {
        return Err(SearchError::invalid_config("at least one loss ratio is required"));
    }
    if let Some(bad) = ratios.iter().find(|r| !(**r >= 0.0 && **r < 1.0)) {
        return Err(SearchError::invalid_config(format!(
            "loss ratio {} is outside [0, 1)",
            bad
        )));
    }
    if ratios.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(SearchError::invalid_config(
            "loss ratios must be strictly increasing",
        ));
    }
    Ok(())
}

fn validate_rates(min_rate: f64, max_rate: f64) -> Result<LoadLimits, SearchError> {
    if !(min_rate.is_finite() && min_rate > 0.0) {
        return Err(SearchError::invalid_config(format!(
            "min_rate must be positive and finite, got {}",
            min_rate
        )));
    }
    if !(max_rate.is_finite() && max_rate > min_rate) {
        return Err(SearchError::invalid_config(format!(
            "max_rate must be finite and above min_rate, got {} <= {}",
            max_rate, min_rate
        )));
    }
    Ok(LoadLimits::new(min_rate, max_rate)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ratios() {
        assert!(validate_ratios(&[0.0, 0.005]).is_ok());
        assert!(validate_ratios(&[]).is_err());
        assert!(validate_ratios(&[0.01, 0.01]).is_err());
        assert!(validate_ratios(&[0.02, 0.01]).is_err());
        assert!(validate_ratios(&[1.0]).is_err());
        assert!(validate_ratios(&[-0.1]).is_err());
        assert!(validate_ratios(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_validate_rates() {
        assert!(validate_rates(1000.0, 2000.0).is_ok());
        assert!(validate_rates(2000.0, 2000.0).is_err());
        assert!(validate_rates(0.0, 2000.0).is_err());
        assert!(validate_rates(1000.0, f64::INFINITY).is_err());
    }
}
