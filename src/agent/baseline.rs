//! Baseline agent for tests, benches and as a template for real agents.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{metrics, Metrics, Observation, Policy, Result, RngKey, TrainError};
use crate::training::TransitionBatch;

use super::traits::{ActOutput, ActRequest, Agent};

/// Uniform policy, zero value, random actions.
///
/// At temperature 0 the first action is taken (argmax of a uniform policy),
/// otherwise the action is drawn from the leaf key. Updates only count
/// batches. `save` writes the agent itself with bincode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UniformAgent {
    num_actions: usize,
    input_shape: Vec<usize>,
    updates: u64,
}

impl UniformAgent {
    /// Create an agent over `num_actions` discrete actions.
    pub fn new(num_actions: usize) -> Self {
        Self {
            num_actions,
            input_shape: Vec::new(),
            updates: 0,
        }
    }

    /// Number of updates applied so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Shape seen by `init`, including the batch dimension.
    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    /// Load an agent written by `save`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn uniform_policy(&self) -> Policy {
        let prob = 1.0 / self.num_actions as f32;
        std::iter::repeat(prob).take(self.num_actions).collect()
    }
}

impl Agent for UniformAgent {
    fn init(&mut self, _key: RngKey, sample_input: &Observation) -> Result<()> {
        self.input_shape = sample_input.shape.clone();
        self.updates = 0;
        Ok(())
    }

    fn act(
        &mut self,
        key: RngKey,
        _observation: &Observation,
        request: &ActRequest,
    ) -> Result<ActOutput> {
        if self.num_actions == 0 {
            return Err(TrainError::Agent("agent has an empty action space".into()));
        }

        let action = if request.temperature <= 0.0 {
            0
        } else {
            key.into_rng().gen_range_usize(0..self.num_actions)
        };

        Ok(ActOutput {
            action,
            policy: request.with_policy.then(|| self.uniform_policy()),
            value: request.with_value.then_some(0.0),
        })
    }

    fn update(&mut self, batch: &TransitionBatch) -> Result<Metrics> {
        self.updates += 1;
        Ok(metrics([
            ("loss", 0.0),
            ("batch_rows", batch.len() as f64),
        ]))
    }

    fn save(&self, path: &Path) -> io::Result<()> {
        let bytes =
            bincode::serialize(self).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(path, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greedy_takes_first_action() {
        let mut agent = UniformAgent::new(4);
        let obs = Observation::from_vec(vec![0.0]);

        for seed in 0..10 {
            let out = agent
                .act(RngKey::new(seed), &obs, &ActRequest::greedy(1))
                .unwrap();
            assert_eq!(out.action, 0);
            assert!(out.policy.is_none());
            assert!(out.value.is_none());
        }
    }

    #[test]
    fn test_self_play_returns_policy_and_value() {
        let mut agent = UniformAgent::new(4);
        let obs = Observation::from_vec(vec![0.0]);

        let out = agent
            .act(RngKey::new(1), &obs, &ActRequest::self_play(1, 1.0))
            .unwrap();

        assert!(out.action < 4);
        let policy = out.policy.unwrap();
        assert_eq!(policy.len(), 4);
        assert!((policy.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert_eq!(out.value, Some(0.0));
    }

    #[test]
    fn test_actions_follow_key() {
        let mut agent = UniformAgent::new(16);
        let obs = Observation::from_vec(vec![0.0]);
        let request = ActRequest::self_play(1, 1.0);

        let a = agent.act(RngKey::new(5), &obs, &request).unwrap().action;
        let b = agent.act(RngKey::new(5), &obs, &request).unwrap().action;
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_action_space() {
        let mut agent = UniformAgent::new(0);
        let obs = Observation::from_vec(vec![0.0]);

        let result = agent.act(RngKey::new(0), &obs, &ActRequest::greedy(1));
        assert!(matches!(result, Err(TrainError::Agent(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("uniform_agent_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("agent.bin");

        let mut agent = UniformAgent::new(3);
        agent
            .init(RngKey::new(0), &Observation::zeros(vec![1, 2]))
            .unwrap();
        agent.save(&path).unwrap();

        let loaded = UniformAgent::load(&path).unwrap();
        assert_eq!(loaded, agent);
        assert_eq!(loaded.input_shape(), &[1, 2]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
