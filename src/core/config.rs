//! Training configuration types.
//!
//! - `TracerConfig`: n-step return parameters
//! - `TrainConfig`: everything the training loop reads, including the tracer
//!
//! Defaults suit a long self-play run. Use the `with_*` builders to
//! override and `validate()` before starting a run; `Trainer::fit` validates
//! on its own.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::{Result, TrainError};

/// Parameters of the n-step return tracer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TracerConfig {
    /// Lookahead depth (number of rewards before bootstrapping).
    pub n: usize,

    /// Discount factor, in `[0, 1)`.
    pub gamma: f64,

    /// Mixing between the n-step target (1.0) and the one-step
    /// value-bootstrapped target (0.0).
    pub lambda: f64,

    /// Exponent applied to `|Rn - v|` to form the sample weight.
    /// 0 gives uniform weights.
    pub priority_exponent: f64,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            n: 50,
            gamma: 0.997,
            lambda: 0.5,
            priority_exponent: 1.0,
        }
    }
}

impl TracerConfig {
    /// Create a tracer config with the given lookahead, discount and mixing.
    pub fn new(n: usize, gamma: f64, lambda: f64) -> Self {
        Self {
            n,
            gamma,
            lambda,
            ..Self::default()
        }
    }

    /// Set the priority exponent.
    pub fn with_priority_exponent(mut self, exponent: f64) -> Self {
        self.priority_exponent = exponent;
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(invalid("tracer n must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(invalid(format!(
                "tracer gamma must be in [0, 1), got {}",
                self.gamma
            )));
        }
        if !(0.0..=1.0).contains(&self.lambda) {
            return Err(invalid(format!(
                "tracer lambda must be in [0, 1], got {}",
                self.lambda
            )));
        }
        if !(self.priority_exponent >= 0.0 && self.priority_exponent.is_finite()) {
            return Err(invalid(format!(
                "priority exponent must be a non-negative number, got {}",
                self.priority_exponent
            )));
        }
        Ok(())
    }
}

/// Configuration for a training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// N-step tracer parameters.
    pub tracer: TracerConfig,

    /// Maximum number of trajectories kept in the replay buffer.
    pub buffer_capacity: usize,

    /// Episode budget of the main loop.
    pub max_episodes: usize,

    /// Gradient update budget. Reaching it ends the run.
    pub max_training_steps: u64,

    /// Evaluate every `test_interval` main-loop episodes.
    pub test_interval: usize,

    /// Episodes per evaluation pass.
    pub num_test_episodes: usize,

    /// Save a checkpoint every `save_every_n_steps` updates.
    pub save_every_n_steps: u64,

    /// Periodic checkpoint path. The best model goes to `<save_path>_best`.
    pub save_path: PathBuf,

    /// Search budget per action.
    pub num_simulations: u32,

    /// Minimum trajectory length and sample window length.
    pub k_steps: usize,

    /// Buffer size required before the main loop starts.
    pub buffer_warm_up: usize,

    /// Trajectories drawn per batch.
    pub num_trajectory: usize,

    /// Windows drawn from each selected trajectory.
    pub sample_per_trajectory: usize,

    /// Root random seed. Also used to reset the training environment.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            tracer: TracerConfig::default(),
            buffer_capacity: 500,
            max_episodes: 1000,
            max_training_steps: 10_000,
            test_interval: 10,
            num_test_episodes: 10,
            save_every_n_steps: 1000,
            save_path: PathBuf::from("model_params"),
            num_simulations: 50,
            k_steps: 10,
            buffer_warm_up: 128,
            num_trajectory: 32,
            sample_per_trajectory: 10,
            seed: 42,
        }
    }
}

impl TrainConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set tracer parameters.
    pub fn with_tracer(mut self, tracer: TracerConfig) -> Self {
        self.tracer = tracer;
        self
    }

    /// Set buffer capacity.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set the episode budget.
    pub fn with_max_episodes(mut self, episodes: usize) -> Self {
        self.max_episodes = episodes;
        self
    }

    /// Set the update budget.
    pub fn with_max_training_steps(mut self, steps: u64) -> Self {
        self.max_training_steps = steps;
        self
    }

    /// Set evaluation cadence and size.
    pub fn with_test(mut self, interval: usize, episodes: usize) -> Self {
        self.test_interval = interval;
        self.num_test_episodes = episodes;
        self
    }

    /// Set checkpoint cadence.
    pub fn with_save_every_n_steps(mut self, steps: u64) -> Self {
        self.save_every_n_steps = steps;
        self
    }

    /// Set checkpoint location.
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = path.into();
        self
    }

    /// Set search budget per action.
    pub fn with_num_simulations(mut self, simulations: u32) -> Self {
        self.num_simulations = simulations;
        self
    }

    /// Set minimum trajectory length / window length.
    pub fn with_k_steps(mut self, k_steps: usize) -> Self {
        self.k_steps = k_steps;
        self
    }

    /// Set warm-up size.
    pub fn with_buffer_warm_up(mut self, warm_up: usize) -> Self {
        self.buffer_warm_up = warm_up;
        self
    }

    /// Set batch composition.
    pub fn with_batch(mut self, num_trajectory: usize, sample_per_trajectory: usize) -> Self {
        self.num_trajectory = num_trajectory;
        self.sample_per_trajectory = sample_per_trajectory;
        self
    }

    /// Set root seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Path of the best-so-far checkpoint.
    pub fn best_save_path(&self) -> PathBuf {
        let mut path = self.save_path.clone().into_os_string();
        path.push("_best");
        PathBuf::from(path)
    }

    /// Check that the options describe a run that can make progress.
    pub fn validate(&self) -> Result<()> {
        self.tracer.validate()?;

        let positive = [
            ("buffer_capacity", self.buffer_capacity),
            ("test_interval", self.test_interval),
            ("num_test_episodes", self.num_test_episodes),
            ("k_steps", self.k_steps),
            ("num_trajectory", self.num_trajectory),
            ("sample_per_trajectory", self.sample_per_trajectory),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(invalid(format!("{} must be at least 1", name)));
            }
        }
        if self.save_every_n_steps == 0 {
            return Err(invalid("save_every_n_steps must be at least 1"));
        }
        if self.buffer_warm_up > self.buffer_capacity {
            return Err(invalid(format!(
                "buffer_warm_up ({}) exceeds buffer_capacity ({})",
                self.buffer_warm_up, self.buffer_capacity
            )));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> TrainError {
    TrainError::Configuration(msg.into())
}
