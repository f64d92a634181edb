//! Environments and the environment registry.
//!
//! - `ChainEnv`: deterministic toy environment used by tests and benches
//! - `EnvRegistry`: constructs environments by string id

mod chain;
mod registry;

pub use chain::ChainEnv;
pub use registry::EnvRegistry;
