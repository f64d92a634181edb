//! Named environment factories.

use rustc_hash::FxHashMap;

use crate::agent::Environment;
use crate::core::{Result, TrainError};

use super::chain::ChainEnv;

type EnvFactory = Box<dyn Fn() -> Box<dyn Environment>>;

/// Maps environment ids to constructors.
///
/// ```rust,ignore
/// let registry = EnvRegistry::with_defaults();
/// let outcome = trainer.fit(agent, || registry.make("chain-v0"), &mut monitor)?;
/// ```
#[derive(Default)]
pub struct EnvRegistry {
    factories: FxHashMap<String, EnvFactory>,
}

impl EnvRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in environments.
    ///
    /// - `chain-v0`: `ChainEnv::new(10)`
    /// - `chain-short-v0`: a chain of 50 cut off after 10 steps
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("chain-v0", || ChainEnv::new(10));
        registry.register("chain-short-v0", || {
            ChainEnv::new(50).with_max_episode_steps(10)
        });
        registry
    }

    /// Register a factory. Replaces an existing entry with the same id.
    pub fn register<E, F>(&mut self, id: impl Into<String>, factory: F)
    where
        E: Environment + 'static,
        F: Fn() -> E + 'static,
    {
        self.factories
            .insert(id.into(), Box::new(move || Box::new(factory())));
    }

    /// Construct the environment registered under `id`.
    pub fn make(&self, id: &str) -> Result<Box<dyn Environment>> {
        self.factories
            .get(id)
            .map(|factory| factory())
            .ok_or_else(|| TrainError::Configuration(format!("unknown environment id '{}'", id)))
    }

    /// Check if an id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Get the number of registered environments.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if no environment is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for EnvRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_registered() {
        let registry = EnvRegistry::with_defaults();
        assert_eq!(registry.ids(), vec!["chain-short-v0", "chain-v0"]);
        assert!(registry.contains("chain-v0"));
        assert!(!registry.contains("CartPole-v1"));

        let env = registry.make("chain-v0").unwrap();
        assert_eq!(env.max_episode_steps(), 10);
        assert_eq!(env.observation_shape(), vec![1]);

        let short = registry.make("chain-short-v0").unwrap();
        assert_eq!(short.max_episode_steps(), 10);
    }

    #[test]
    fn test_unknown_id() {
        let registry = EnvRegistry::with_defaults();
        assert!(matches!(
            registry.make("CartPole-v1"),
            Err(TrainError::Configuration(_))
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = EnvRegistry::new();
        assert!(registry.is_empty());
        registry.register("chain", || ChainEnv::new(3));
        registry.register("chain", || ChainEnv::new(7));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.make("chain").unwrap().max_episode_steps(), 7);
    }
}
