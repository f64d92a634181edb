//! Transitions, trajectories and their batched form.
//!
//! A trajectory records one self-play episode as the tracer emits it:
//! - Observation, action and reward at each step
//! - The search policy and value estimate at that step
//! - The bootstrapped n-step return and the sample weight
//!
//! `finalize` stacks the transitions into a `BatchedTransitions` (one array
//! per field), which is what the replay buffer slices windows from.

use serde::{Deserialize, Serialize};

use crate::core::{ActionId, Observation, Policy, Result, TrainError};

/// One finished step, produced by the tracer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Observation before the action.
    pub observation: Observation,

    /// The action that was taken.
    pub action: ActionId,

    /// Reward received (after truncation reshaping).
    pub reward: f32,

    /// This was the last step of its episode.
    pub done: bool,

    /// Value estimate at this step.
    pub value: f32,

    /// Search policy at this step.
    pub policy: Policy,

    /// Bootstrapped n-step return target.
    pub n_step_return: f32,

    /// Sample weight (used for trajectory priority).
    pub weight: f32,
}

/// Structure-of-arrays view of consecutive transitions.
///
/// Observations and policies are flattened row-major: row `i` of the
/// observations is `observations[i * obs_len..(i + 1) * obs_len]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchedTransitions {
    /// Shape of a single observation.
    pub observation_shape: Vec<usize>,
    /// Number of entries per policy row.
    pub policy_width: usize,
    pub observations: Vec<f32>,
    pub actions: Vec<ActionId>,
    pub rewards: Vec<f32>,
    pub dones: Vec<bool>,
    pub values: Vec<f32>,
    pub policies: Vec<f32>,
    pub returns: Vec<f32>,
    pub weights: Vec<f32>,
}

impl BatchedTransitions {
    /// Empty batch for rows of the given shapes.
    pub fn with_shapes(observation_shape: Vec<usize>, policy_width: usize) -> Self {
        Self {
            observation_shape,
            policy_width,
            ..Self::default()
        }
    }

    /// Stack transitions. All rows must share observation shape and policy width.
    pub fn stack(transitions: &[Transition]) -> Result<Self> {
        let first = transitions.first().ok_or(TrainError::EmptyTrajectory)?;
        let mut batch =
            Self::with_shapes(first.observation.shape.clone(), first.policy.len());

        for tr in transitions {
            if tr.observation.shape != batch.observation_shape {
                return Err(TrainError::ShapeMismatch {
                    what: "observation",
                    expected: batch.observation_shape.clone(),
                    found: tr.observation.shape.clone(),
                });
            }
            if tr.policy.len() != batch.policy_width {
                return Err(TrainError::ShapeMismatch {
                    what: "policy",
                    expected: vec![batch.policy_width],
                    found: vec![tr.policy.len()],
                });
            }

            batch.observations.extend_from_slice(&tr.observation.data);
            batch.actions.push(tr.action);
            batch.rewards.push(tr.reward);
            batch.dones.push(tr.done);
            batch.values.push(tr.value);
            batch.policies.extend_from_slice(&tr.policy);
            batch.returns.push(tr.n_step_return);
            batch.weights.push(tr.weight);
        }

        Ok(batch)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Elements per observation row.
    pub fn observation_len(&self) -> usize {
        self.observation_shape.iter().product()
    }

    /// Mean of the weight array (0.0 when empty).
    pub fn mean_weight(&self) -> f64 {
        if self.weights.is_empty() {
            return 0.0;
        }
        self.weights.iter().map(|&w| f64::from(w)).sum::<f64>() / self.weights.len() as f64
    }

    /// Append rows `start..start + len` of `other`.
    ///
    /// Panics if the range is out of bounds or the shapes differ; callers
    /// check both.
    pub fn extend_from_rows(&mut self, other: &BatchedTransitions, start: usize, len: usize) {
        assert_eq!(self.observation_shape, other.observation_shape);
        assert_eq!(self.policy_width, other.policy_width);
        let end = start + len;
        let obs_len = self.observation_len();
        let width = self.policy_width;

        self.observations
            .extend_from_slice(&other.observations[start * obs_len..end * obs_len]);
        self.actions.extend_from_slice(&other.actions[start..end]);
        self.rewards.extend_from_slice(&other.rewards[start..end]);
        self.dones.extend_from_slice(&other.dones[start..end]);
        self.values.extend_from_slice(&other.values[start..end]);
        self.policies
            .extend_from_slice(&other.policies[start * width..end * width]);
        self.returns.extend_from_slice(&other.returns[start..end]);
        self.weights.extend_from_slice(&other.weights[start..end]);
    }

    /// Copy rows `start..start + len` into a new batch.
    pub fn rows(&self, start: usize, len: usize) -> BatchedTransitions {
        let mut out = Self::with_shapes(self.observation_shape.clone(), self.policy_width);
        out.extend_from_rows(self, start, len);
        out
    }
}

/// One episode of transitions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    transitions: Vec<Transition>,
    batched: Option<BatchedTransitions>,
}

impl Trajectory {
    /// Create an empty trajectory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition.
    pub fn add(&mut self, transition: Transition) -> Result<()> {
        if self.batched.is_some() {
            return Err(TrainError::TrajectoryFinalized);
        }
        self.transitions.push(transition);
        Ok(())
    }

    /// Stack the transitions. Later calls return the same batch.
    pub fn finalize(&mut self) -> Result<&BatchedTransitions> {
        if self.batched.is_none() {
            self.batched = Some(BatchedTransitions::stack(&self.transitions)?);
        }
        self.batched.as_ref().ok_or(TrainError::NotFinalized)
    }

    /// Check if `finalize` has succeeded.
    pub fn is_finalized(&self) -> bool {
        self.batched.is_some()
    }

    /// The batched form, once finalized.
    pub fn batched(&self) -> Option<&BatchedTransitions> {
        self.batched.as_ref()
    }

    /// Buffer priority: mean sample weight, once finalized.
    pub fn priority(&self) -> Option<f64> {
        self.batched.as_ref().map(BatchedTransitions::mean_weight)
    }

    /// Get the transitions in order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Get the number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if trajectory is empty.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Sum of rewards as stored (after truncation reshaping).
    pub fn total_reward(&self) -> f64 {
        self.transitions.iter().map(|t| f64::from(t.reward)).sum()
    }
}
