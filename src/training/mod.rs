//! Experience pipeline and training loop.
//!
//! ## Overview
//!
//! - **NStepTracer**: Turns raw steps into transitions with n-step return targets
//! - **Trajectory**: Records one episode of transitions and its batched form
//! - **ReplayBuffer**: FIFO store of trajectories with prioritized window sampling
//! - **TemperatureSchedule**: Exploration temperature as a function of progress
//! - **Trainer**: Warm-up, self-play, update, evaluation and checkpointing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rust_muzero_loop::training::Trainer;
//! use rust_muzero_loop::core::TrainConfig;
//! use rust_muzero_loop::agent::{TracingMonitor, UniformAgent};
//! use rust_muzero_loop::envs::ChainEnv;
//!
//! let config = TrainConfig::default()
//!     .with_max_training_steps(1_000)
//!     .with_buffer_warm_up(16);
//!
//! let outcome = Trainer::new(config).fit(
//!     UniformAgent::new(2),
//!     || Ok(ChainEnv::new(16)),
//!     &mut TracingMonitor::new("chain"),
//! )?;
//! println!("best return {}", outcome.state.best_test_return);
//! ```

pub mod replay_buffer;
pub mod schedule;
pub mod self_play;
pub mod tracer;
pub mod trainer;
pub mod trajectory;

// Re-export main types
pub use replay_buffer::{ReplayBuffer, TransitionBatch};
pub use schedule::{temperature, StepTemperature, TemperatureSchedule};
pub use self_play::{evaluate, play_episode, Episode, EpisodeSettings};
pub use tracer::NStepTracer;
pub use trainer::{FitOutcome, Phase, Termination, Trainer, TrainerSnapshot, TrainingState};
pub use trajectory::{BatchedTransitions, Trajectory, Transition};
