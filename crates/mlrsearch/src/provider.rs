//! Trial measurement capability.

use mlrsearch_core::Measurement;

/// Anything that can run one trial.
///
/// A call blocks for about `intended_duration` seconds while traffic is sent
/// at `intended_load` transactions per second, then reports the counts. The
/// returned measurement should carry the same intended duration and load.
///
/// Closures implement this trait:
///
/// ```
/// use mlrsearch::{Measurement, MeasurementProvider};
/// use mlrsearch_core::CoreError;
///
/// let mut lossless = |duration: f64, load: f64| -> Result<Measurement, CoreError> {
///     let offered = (duration * load).round() as i64;
///     Measurement::from_offered_and_loss(duration, load, offered, 0)
/// };
/// let m = lossless.measure(1.0, 1000.0).unwrap();
/// assert_eq!(m.loss_ratio(), 0.0);
/// ```
pub trait MeasurementProvider {
    /// Error reported when a trial cannot be performed.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run one trial.
    fn measure(
        &mut self,
        intended_duration: f64,
        intended_load: f64,
    ) -> Result<Measurement, Self::Error>;
}

impl<F, E> MeasurementProvider for F
where
    F: FnMut(f64, f64) -> Result<Measurement, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn measure(
        &mut self,
        intended_duration: f64,
        intended_load: f64,
    ) -> Result<Measurement, Self::Error> {
        self(intended_duration, intended_load)
    }
}
