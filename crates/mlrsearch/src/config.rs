//! Configuration for a multiple loss ratio search.

use std::time::Duration;

use mlrsearch_core::constants::DEFAULT_EXPANSION_COEFFICIENT;
use mlrsearch_core::PhaseSchedule;

use crate::error::SearchError;

/// Configuration for [`MultipleLossRatioSearch`](crate::MultipleLossRatioSearch).
///
/// Use builder methods to customize:
///
/// ```
/// use std::time::Duration;
/// use mlrsearch::SearchConfig;
///
/// let config = SearchConfig::new()
///     .number_of_intermediate_phases(3)
///     .final_trial_duration(60.0)
///     .timeout(Duration::from_secs(1800));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchConfig {
    // =========================================================================
    // Phases
    // =========================================================================
    /// Number of phases before the final one.
    ///
    /// Each phase lengthens the trial duration and halves the width goal.
    ///
    /// Default: 2.
    pub number_of_intermediate_phases: usize,

    /// Trial duration of bootstrap and the first phase, in seconds.
    ///
    /// Default: 1.0.
    pub initial_trial_duration: f64,

    /// Trial duration of the final phase, in seconds.
    ///
    /// Default: 30.0.
    pub final_trial_duration: f64,

    /// Relative width goal of the final phase.
    ///
    /// Default: 0.005 (half a percent).
    pub final_relative_width: f64,

    /// Duration of a throwaway trial at maximum load before bootstrap, in
    /// seconds.
    ///
    /// The result is discarded. Useful when the system under test needs
    /// traffic to settle caches or learn addresses.
    ///
    /// Default: None (no warmup).
    #[serde(default)]
    pub warmup_duration: Option<f64>,

    // =========================================================================
    // Limits
    // =========================================================================
    /// Wall-clock budget for the whole search.
    ///
    /// Checked between trials; a trial in flight always completes.
    ///
    /// Default: 600 seconds.
    pub timeout: Duration,

    /// How much each external search step grows over the previous one.
    ///
    /// Default: 4.0.
    pub expansion_coefficient: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            number_of_intermediate_phases: 2,
            initial_trial_duration: 1.0,
            final_trial_duration: 30.0,
            final_relative_width: 0.005,
            warmup_duration: None,
            timeout: Duration::from_secs(600),
            expansion_coefficient: DEFAULT_EXPANSION_COEFFICIENT,
        }
    }
}

impl SearchConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a short configuration for smoke runs.
    ///
    /// - 1 intermediate phase
    /// - 1 s initial and 10 s final trials
    /// - 1% final width
    /// - 120 second timeout
    pub fn quick() -> Self {
        Self {
            number_of_intermediate_phases: 1,
            initial_trial_duration: 1.0,
            final_trial_duration: 10.0,
            final_relative_width: 0.01,
            timeout: Duration::from_secs(120),
            ..Default::default()
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Set the number of intermediate phases.
    pub fn number_of_intermediate_phases(mut self, phases: usize) -> Self {
        self.number_of_intermediate_phases = phases;
        self
    }

    /// Set the initial trial duration in seconds.
    pub fn initial_trial_duration(mut self, seconds: f64) -> Self {
        self.initial_trial_duration = seconds;
        self
    }

    /// Set the final trial duration in seconds.
    pub fn final_trial_duration(mut self, seconds: f64) -> Self {
        self.final_trial_duration = seconds;
        self
    }

    /// Set the final relative width goal.
    pub fn final_relative_width(mut self, width: f64) -> Self {
        self.final_relative_width = width;
        self
    }

    /// Run a discarded warmup trial of `seconds` before bootstrap.
    pub fn warmup_duration(mut self, seconds: f64) -> Self {
        self.warmup_duration = Some(seconds);
        self
    }

    /// Set the overall timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the overall timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Set the external search expansion coefficient.
    pub fn expansion_coefficient(mut self, coefficient: f64) -> Self {
        self.expansion_coefficient = coefficient;
        self
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check all fields, reporting the first problem found.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.number_of_intermediate_phases == 0 {
            return Err(SearchError::invalid_config(
                "number_of_intermediate_phases must be at least 1",
            ));
        }
        if !(self.initial_trial_duration.is_finite() && self.initial_trial_duration > 0.0) {
            return Err(SearchError::invalid_config(
                "initial_trial_duration must be positive",
            ));
        }
        if !(self.final_trial_duration.is_finite() && self.final_trial_duration > 0.0) {
            return Err(SearchError::invalid_config(
                "final_trial_duration must be positive",
            ));
        }
        if self.final_trial_duration < self.initial_trial_duration {
            return Err(SearchError::invalid_config(
                "final_trial_duration must be >= initial_trial_duration",
            ));
        }
        if !(self.final_relative_width > 0.0 && self.final_relative_width < 1.0) {
            return Err(SearchError::invalid_config(
                "final_relative_width must be in (0, 1)",
            ));
        }
        if let Some(warmup) = self.warmup_duration {
            if !(warmup.is_finite() && warmup > 0.0) {
                return Err(SearchError::invalid_config(
                    "warmup_duration must be positive when set",
                ));
            }
        }
        if !(self.expansion_coefficient.is_finite() && self.expansion_coefficient > 1.0) {
            return Err(SearchError::invalid_config(
                "expansion_coefficient must be > 1",
            ));
        }
        Ok(())
    }

    /// Phase schedule described by this configuration.
    pub fn schedule(&self) -> Result<PhaseSchedule, SearchError> {
        self.validate()?;
        Ok(PhaseSchedule::new(
            self.number_of_intermediate_phases,
            self.initial_trial_duration,
            self.final_trial_duration,
            self.final_relative_width,
        )?)
    }
}
