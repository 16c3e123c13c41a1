//! Simulated systems under test shared by the integration tests.

#![allow(dead_code)]

use mlrsearch::{CoreError, Measurement, MeasurementProvider};
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn offered(duration: f64, load: f64) -> i64 {
    (load * duration).round() as i64
}

fn with_loss_ratio(duration: f64, load: f64, ratio: f64) -> Result<Measurement, CoreError> {
    let offered = offered(duration, load);
    let loss = (offered as f64 * ratio).round() as i64;
    Measurement::from_offered_and_loss(duration, load, offered, loss)
}

/// Forwards everything up to `capacity`, drops the rest.
#[derive(Debug, Clone)]
pub struct Knee {
    pub capacity: f64,
    pub calls: usize,
}

impl Knee {
    pub fn new(capacity: f64) -> Self {
        Self { capacity, calls: 0 }
    }
}

impl MeasurementProvider for Knee {
    type Error = CoreError;

    fn measure(&mut self, duration: f64, load: f64) -> Result<Measurement, CoreError> {
        self.calls += 1;
        let offered = offered(duration, load);
        let forwarded = offered.min((self.capacity * duration).round() as i64);
        Measurement::from_offered_and_forwarding(duration, load, offered, forwarded)
    }
}

/// Drops every transaction.
#[derive(Debug, Clone, Default)]
pub struct TotalLoss {
    pub calls: usize,
}

impl MeasurementProvider for TotalLoss {
    type Error = CoreError;

    fn measure(&mut self, duration: f64, load: f64) -> Result<Measurement, CoreError> {
        self.calls += 1;
        with_loss_ratio(duration, load, 1.0)
    }
}

/// Lossless below `knee`; at and above it loses `base` plus a linear excess.
#[derive(Debug, Clone)]
pub struct LinearKnee {
    pub knee: f64,
    pub base: f64,
    pub slope: f64,
    pub calls: usize,
}

impl LinearKnee {
    pub fn new(knee: f64) -> Self {
        Self {
            knee,
            base: 0.01,
            slope: 0.5,
            calls: 0,
        }
    }

    pub fn loss_ratio_at(&self, load: f64) -> f64 {
        if load < self.knee {
            0.0
        } else {
            (self.base + self.slope * (load - self.knee) / load).min(1.0)
        }
    }
}

impl MeasurementProvider for LinearKnee {
    type Error = CoreError;

    fn measure(&mut self, duration: f64, load: f64) -> Result<Measurement, CoreError> {
        self.calls += 1;
        with_loss_ratio(duration, load, self.loss_ratio_at(load))
    }
}

/// Knee at `capacity` with occasional small random loss below it.
#[derive(Debug, Clone)]
pub struct Noisy {
    pub capacity: f64,
    pub glitch_probability: f64,
    rng: Xoshiro256PlusPlus,
}

impl Noisy {
    pub fn new(capacity: f64, seed: u64) -> Self {
        Self {
            capacity,
            glitch_probability: 0.2,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl MeasurementProvider for Noisy {
    type Error = CoreError;

    fn measure(&mut self, duration: f64, load: f64) -> Result<Measurement, CoreError> {
        let offered = offered(duration, load);
        let mut forwarded = offered.min((self.capacity * duration).round() as i64);
        if self.rng.gen_bool(self.glitch_probability) {
            let glitch = self.rng.gen_range(0..=offered / 200);
            forwarded = (forwarded - glitch).max(0);
        }
        Measurement::from_offered_and_forwarding(duration, load, offered, forwarded)
    }
}

/// Error from [`Flaky`].
#[derive(Debug, thiserror::Error)]
#[error("traffic generator lost connection after {0} trials")]
pub struct ConnectionLost(pub usize);

/// Works like [`Knee`] for `healthy_trials` calls, then fails.
#[derive(Debug, Clone)]
pub struct Flaky {
    pub inner: Knee,
    pub healthy_trials: usize,
}

impl MeasurementProvider for Flaky {
    type Error = ConnectionLost;

    fn measure(&mut self, duration: f64, load: f64) -> Result<Measurement, ConnectionLost> {
        if self.inner.calls >= self.healthy_trials {
            return Err(ConnectionLost(self.inner.calls));
        }
        self.inner
            .measure(duration, load)
            .map_err(|_| ConnectionLost(self.inner.calls))
    }
}
