//! Capability traits for the collaborators of the training loop.
//!
//! The loop never looks inside the agent model or the environment: search,
//! network inference and optimisation live behind `Agent`, dynamics and
//! rewards behind `Environment`, metric sinks behind `Monitor`.

use std::io;
use std::path::Path;

use crate::core::{ActionId, Metrics, Observation, Policy, Result, RngKey};
use crate::training::TransitionBatch;

/// Options for a single `Agent::act` call.
#[derive(Clone, Debug, PartialEq)]
pub struct ActRequest {
    /// Return the search policy.
    pub with_policy: bool,

    /// Return the value estimate.
    pub with_value: bool,

    /// The observation already carries a leading batch dimension.
    pub batched: bool,

    /// Search budget.
    pub num_simulations: u32,

    /// Exploration temperature (0 = greedy).
    pub temperature: f64,
}

impl ActRequest {
    /// Request used during self-play: policy and value are needed by the tracer.
    pub fn self_play(num_simulations: u32, temperature: f64) -> Self {
        Self {
            with_policy: true,
            with_value: true,
            batched: false,
            num_simulations,
            temperature,
        }
    }

    /// Request used during evaluation: greedy, action only.
    pub fn greedy(num_simulations: u32) -> Self {
        Self {
            with_policy: false,
            with_value: false,
            batched: false,
            num_simulations,
            temperature: 0.0,
        }
    }
}

/// Result of `Agent::act`.
#[derive(Clone, Debug, PartialEq)]
pub struct ActOutput {
    /// Chosen action.
    pub action: ActionId,

    /// Search policy, when requested.
    pub policy: Option<Policy>,

    /// Value estimate, when requested.
    pub value: Option<f32>,
}

/// A planning agent (search + model + optimiser).
pub trait Agent {
    /// Initialise parameters from a sample input with a leading batch dimension.
    fn init(&mut self, key: RngKey, sample_input: &Observation) -> Result<()>;

    /// Choose an action for `observation`.
    fn act(&mut self, key: RngKey, observation: &Observation, request: &ActRequest)
        -> Result<ActOutput>;

    /// Run one gradient update on a sampled batch and report losses.
    fn update(&mut self, batch: &TransitionBatch) -> Result<Metrics>;

    /// Persist the model. The file format belongs to the agent.
    fn save(&self, path: &Path) -> io::Result<()>;
}

/// Outcome of `Environment::step`.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    /// Next observation.
    pub observation: Observation,

    /// Reward for the step.
    pub reward: f32,

    /// The episode reached a true terminal state.
    pub terminal: bool,

    /// The episode was cut short by a step limit.
    pub truncated: bool,

    /// Extra diagnostics.
    pub info: Metrics,
}

/// An episodic environment with a bounded episode length.
pub trait Environment {
    /// Start a new episode.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, Metrics)>;

    /// Apply an action.
    fn step(&mut self, action: ActionId) -> Result<StepOutcome>;

    /// Upper bound on steps per episode.
    fn max_episode_steps(&self) -> usize;

    /// Shape of every observation this environment emits.
    fn observation_shape(&self) -> Vec<usize>;
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, Metrics)> {
        (**self).reset(seed)
    }

    fn step(&mut self, action: ActionId) -> Result<StepOutcome> {
        (**self).step(action)
    }

    fn max_episode_steps(&self) -> usize {
        (**self).max_episode_steps()
    }

    fn observation_shape(&self) -> Vec<usize> {
        (**self).observation_shape()
    }
}

/// Sink for training metrics.
pub trait Monitor {
    /// Record a set of named values.
    fn record_metrics(&mut self, metrics: &Metrics);
}

impl<M: Monitor + ?Sized> Monitor for &mut M {
    fn record_metrics(&mut self, metrics: &Metrics) {
        (**self).record_metrics(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_play_request() {
        let request = ActRequest::self_play(50, 0.5);
        assert!(request.with_policy);
        assert!(request.with_value);
        assert!(!request.batched);
        assert_eq!(request.num_simulations, 50);
        assert_eq!(request.temperature, 0.5);
    }

    #[test]
    fn test_greedy_request() {
        let request = ActRequest::greedy(8);
        assert!(!request.with_policy);
        assert!(!request.with_value);
        assert_eq!(request.temperature, 0.0);
    }
}
