//! Agent, environment and monitor capabilities.
//!
//! ## Overview
//!
//! - **Traits**: `Agent`, `Environment`, `Monitor`
//! - **Baseline**: `UniformAgent` for testing
//! - **Monitors**: `NullMonitor`, `TracingMonitor`, `MemoryMonitor`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rust_muzero_loop::agent::{ActRequest, Agent};
//!
//! let out = agent.act(leaf_key, &observation, &ActRequest::self_play(50, 1.0))?;
//! let (policy, value) = (out.policy, out.value);
//! ```

pub mod baseline;
pub mod monitor;
pub mod traits;

// Re-export main types
pub use baseline::UniformAgent;
pub use monitor::{MemoryMonitor, NullMonitor, TracingMonitor};
pub use traits::{ActOutput, ActRequest, Agent, Environment, Monitor, StepOutcome};
