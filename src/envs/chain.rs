//! Deterministic chain environment.

use crate::agent::{Environment, StepOutcome};
use crate::core::{ActionId, Metrics, Observation, Result, TrainError};

/// Walk along a chain of `length` cells; every step moves one cell forward.
///
/// The episode is terminal once the end of the chain is reached. Each step
/// pays 1.0, or only when the chosen action equals `rewarding_action` if one
/// is set. The observation is the fraction of the chain covered so far.
#[derive(Clone, Debug)]
pub struct ChainEnv {
    length: usize,
    num_actions: usize,
    max_episode_steps: usize,
    truncation_flag: bool,
    rewarding_action: Option<ActionId>,
    position: usize,
    steps: usize,
    over: bool,
    reset_seeds: Vec<Option<u64>>,
}

impl ChainEnv {
    /// Create a chain of `length` cells with two actions.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            num_actions: 2,
            max_episode_steps: length,
            truncation_flag: true,
            rewarding_action: None,
            position: 0,
            steps: 0,
            over: true,
            reset_seeds: Vec::new(),
        }
    }

    /// Cut episodes off after `steps` steps.
    pub fn with_max_episode_steps(mut self, steps: usize) -> Self {
        self.max_episode_steps = steps;
        self
    }

    /// Whether hitting the step bound raises the truncated flag.
    pub fn with_truncation_flag(mut self, flag: bool) -> Self {
        self.truncation_flag = flag;
        self
    }

    pub fn with_num_actions(mut self, num_actions: usize) -> Self {
        self.num_actions = num_actions;
        self
    }

    /// Only pay reward for one action.
    pub fn with_rewarding_action(mut self, action: ActionId) -> Self {
        self.rewarding_action = Some(action);
        self
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Seeds passed to every `reset` so far, oldest first.
    pub fn reset_seeds(&self) -> &[Option<u64>] {
        &self.reset_seeds
    }

    fn observe(&self) -> Observation {
        let progress = if self.length == 0 {
            1.0
        } else {
            self.position as f32 / self.length as f32
        };
        Observation::from_vec(vec![progress])
    }
}

impl Environment for ChainEnv {
    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, Metrics)> {
        self.reset_seeds.push(seed);
        self.position = 0;
        self.steps = 0;
        self.over = false;
        Ok((self.observe(), Metrics::default()))
    }

    fn step(&mut self, action: ActionId) -> Result<StepOutcome> {
        if self.over {
            return Err(TrainError::Environment(
                "step called on a finished episode; call reset first".into(),
            ));
        }
        if action >= self.num_actions {
            return Err(TrainError::Environment(format!(
                "action {} out of range for {} actions",
                action, self.num_actions
            )));
        }

        self.position += 1;
        self.steps += 1;
        let reward = match self.rewarding_action {
            Some(rewarded) if rewarded != action => 0.0,
            _ => 1.0,
        };
        let terminal = self.position >= self.length;
        let truncated = !terminal && self.truncation_flag && self.steps >= self.max_episode_steps;
        self.over = terminal || self.steps >= self.max_episode_steps;

        Ok(StepOutcome {
            observation: self.observe(),
            reward,
            terminal,
            truncated,
            info: Metrics::default(),
        })
    }

    fn max_episode_steps(&self) -> usize {
        self.max_episode_steps
    }

    fn observation_shape(&self) -> Vec<usize> {
        vec![1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_reaches_terminal() {
        let mut env = ChainEnv::new(3);
        let (obs, _) = env.reset(Some(1)).unwrap();
        assert_eq!(obs.data, vec![0.0]);

        let first = env.step(0).unwrap();
        assert!(!first.terminal);
        assert_eq!(first.reward, 1.0);
        env.step(1).unwrap();
        let last = env.step(0).unwrap();
        assert!(last.terminal);
        assert!(!last.truncated);
        assert_eq!(last.observation.data, vec![1.0]);
        assert_eq!(env.reset_seeds(), &[Some(1)]);
    }

    #[test]
    fn test_step_bound_truncates() {
        let mut env = ChainEnv::new(10).with_max_episode_steps(2);
        env.reset(None).unwrap();
        assert!(!env.step(0).unwrap().truncated);
        let out = env.step(0).unwrap();
        assert!(out.truncated);
        assert!(!out.terminal);
    }

    #[test]
    fn test_truncation_flag_can_be_disabled() {
        let mut env = ChainEnv::new(10)
            .with_max_episode_steps(1)
            .with_truncation_flag(false);
        env.reset(None).unwrap();
        let out = env.step(0).unwrap();
        assert!(!out.truncated);
        assert!(!out.terminal);
        // Episode is still over
        assert!(matches!(env.step(0), Err(TrainError::Environment(_))));
    }

    #[test]
    fn test_rewarding_action() {
        let mut env = ChainEnv::new(4).with_rewarding_action(1);
        env.reset(None).unwrap();
        assert_eq!(env.step(0).unwrap().reward, 0.0);
        assert_eq!(env.step(1).unwrap().reward, 1.0);
    }

    #[test]
    fn test_invalid_action_rejected() {
        let mut env = ChainEnv::new(4).with_num_actions(3);
        env.reset(None).unwrap();
        assert!(env.step(2).is_ok());
        assert!(matches!(env.step(3), Err(TrainError::Environment(_))));
    }

    #[test]
    fn test_step_before_reset_fails() {
        let mut env = ChainEnv::new(4);
        assert!(env.step(0).is_err());
    }
}
