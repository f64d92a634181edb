//! Exploration temperature schedules.

/// Maps training progress to an exploration temperature.
///
/// Implemented for any `Fn(max_training_steps, training_steps) -> f64`, so a
/// closure can replace the default schedule.
pub trait TemperatureSchedule {
    /// Temperature to use at `training_steps` out of `max_training_steps`.
    fn temperature(&self, max_training_steps: u64, training_steps: u64) -> f64;
}

impl<F> TemperatureSchedule for F
where
    F: Fn(u64, u64) -> f64,
{
    fn temperature(&self, max_training_steps: u64, training_steps: u64) -> f64 {
        self(max_training_steps, training_steps)
    }
}

/// Default step schedule: 1.0 for the first half of training, 0.5 until
/// three quarters, 0.25 afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepTemperature;

impl TemperatureSchedule for StepTemperature {
    fn temperature(&self, max_training_steps: u64, training_steps: u64) -> f64 {
        temperature(max_training_steps, training_steps)
    }
}

/// The default schedule as a free function.
pub fn temperature(max_training_steps: u64, training_steps: u64) -> f64 {
    let max = max_training_steps as f64;
    let steps = training_steps as f64;
    if steps < 0.5 * max {
        1.0
    } else if steps < 0.75 * max {
        0.5
    } else {
        0.25
    }
}
