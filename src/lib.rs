//! # rust-muzero-loop
//!
//! Experience pipeline and training loop for MuZero-style self-play agents.
//!
//! ## Design Principles
//!
//! 1. **Explicit randomness**: Every random decision consumes an `RngKey`.
//!    Keys are split, never reused implicitly, so a run is a pure function
//!    of its seed.
//!
//! 2. **Capabilities at the seams**: The agent, the environment and the
//!    metrics sink are traits. The loop owns sequencing and bookkeeping only.
//!
//! 3. **Errors, not panics**: Contract violations (too-short trajectories,
//!    sampling an empty buffer, bad configuration) are `TrainError`s.
//!
//! ## Modules
//!
//! - `core`: Random keys, configuration, error type, shared data types
//! - `agent`: Agent / Environment / Monitor traits, baseline agent, monitors
//! - `training`: Temperature schedule, n-step tracer, trajectories, replay
//!   buffer, self-play and the training loop controller
//! - `envs`: Toy environments and the environment registry
//! - `python`: PyO3 bindings (feature `python`)

pub mod agent;
pub mod core;
pub mod envs;
pub mod training;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use crate::core::{
    metrics, ActionId, KeyRng, Metrics, Observation, Policy, Result, RngKey, TracerConfig,
    TrainConfig, TrainError,
};

pub use crate::agent::{
    ActOutput, ActRequest, Agent, Environment, MemoryMonitor, Monitor, NullMonitor, StepOutcome,
    TracingMonitor, UniformAgent,
};

pub use crate::training::{
    evaluate, play_episode, temperature, BatchedTransitions, Episode, EpisodeSettings, FitOutcome,
    NStepTracer, Phase, ReplayBuffer, StepTemperature, TemperatureSchedule, Termination, Trainer,
    TrainerSnapshot, TrainingState, Trajectory, Transition, TransitionBatch,
};

pub use crate::envs::{ChainEnv, EnvRegistry};
