//! Error taxonomy for the training pipeline.
//!
//! Every boundary fails fast: nothing in this crate retries. Trajectories that
//! are too short for the buffer are filtered by the caller and never surface
//! here as errors.

use std::io;
use std::path::PathBuf;

/// Errors produced by the experience pipeline and the training loop.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// Invalid option, unknown environment id or incompatible observation shape.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Sampling requested from a buffer that cannot serve it.
    #[error("sampling underflow: {0}")]
    SamplingUnderflow(String),

    /// A sampled trajectory cannot provide a window of `k_steps`.
    #[error("trajectory of length {length} is shorter than k_steps = {k_steps}")]
    TrajectoryTooShort { length: usize, k_steps: usize },

    /// `pop` called on a tracer with no ready transition.
    #[error("tracer has no ready transition")]
    TracerEmpty,

    /// `add` called after episode end before the tracer was drained.
    #[error("episode already ended; drain the tracer before adding new steps")]
    EpisodeDone,

    /// `add` called on a finalized trajectory.
    #[error("trajectory is finalized and can no longer be extended")]
    TrajectoryFinalized,

    /// Buffer insertion of a trajectory that was never finalized.
    #[error("trajectory must be finalized before insertion")]
    NotFinalized,

    /// `finalize` called on a trajectory with no transitions.
    #[error("cannot finalize an empty trajectory")]
    EmptyTrajectory,

    /// Transitions of one trajectory disagree on observation or policy shape.
    #[error("{what} shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Priority that is negative, NaN or infinite.
    #[error("invalid priority {0}")]
    InvalidPriority(f64),

    /// Model checkpoint could not be written.
    #[error("failed to save checkpoint to {}: {source}", .path.display())]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failure reported by the agent model.
    #[error("agent error: {0}")]
    Agent(String),

    /// Failure reported by the environment.
    #[error("environment error: {0}")]
    Environment(String),

    /// Trainer snapshot could not be encoded or decoded.
    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] bincode::Error),

    /// Filesystem error outside of model checkpointing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TrainError>;
