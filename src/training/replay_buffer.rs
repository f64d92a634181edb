//! Prioritized trajectory replay buffer.
//!
//! Holds finalized trajectories with a scalar priority each. Sampling picks
//! trajectories with probability proportional to priority, then cuts
//! fixed-length windows out of each picked trajectory.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Result, RngKey, TrainError};

use super::trajectory::{BatchedTransitions, Trajectory};

/// Windows of `k_steps` transitions stacked into one batch.
///
/// Row `w * k_steps + i` is step `i` of window `w`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionBatch {
    /// Number of windows.
    pub num_windows: usize,
    /// Rows per window.
    pub k_steps: usize,
    /// All rows, window after window.
    pub data: BatchedTransitions,
}

impl TransitionBatch {
    /// Total number of rows (`num_windows * k_steps`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the batch holds no rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy out one window.
    pub fn window(&self, index: usize) -> BatchedTransitions {
        self.data.rows(index * self.k_steps, self.k_steps)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Entry {
    trajectory: Trajectory,
    priority: f64,
}

/// Fixed-capacity, priority-weighted trajectory store.
///
/// Uses a FIFO strategy: when full, the oldest trajectory is evicted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayBuffer {
    entries: VecDeque<Entry>,
    capacity: usize,
}

impl ReplayBuffer {
    /// Create a buffer holding at most `capacity` trajectories.
    ///
    /// A capacity of zero is clamped to one. `TrainConfig::validate` rejects a
    /// zero `buffer_capacity` before a trainer builds its buffer.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a finalized trajectory.
    ///
    /// If the buffer is full, the oldest trajectory is removed first.
    pub fn add(&mut self, trajectory: Trajectory, priority: f64) -> Result<()> {
        if !trajectory.is_finalized() {
            return Err(TrainError::NotFinalized);
        }
        if !(priority.is_finite() && priority >= 0.0) {
            return Err(TrainError::InvalidPriority(priority));
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Entry {
            trajectory,
            priority,
        });
        Ok(())
    }

    /// Get the number of trajectories in the buffer.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the maximum capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all trajectories.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over trajectories, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Trajectory> {
        self.entries.iter().map(|e| &e.trajectory)
    }

    /// Priorities, oldest first.
    pub fn priorities(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.priority).collect()
    }

    /// Get the total number of transitions across all trajectories.
    pub fn total_transitions(&self) -> usize {
        self.entries.iter().map(|e| e.trajectory.len()).sum()
    }

    /// Sample a batch of windows.
    ///
    /// Picks `min(num_trajectory, len)` distinct trajectories with probability
    /// proportional to priority, then `sample_per_trajectory` windows of
    /// `k_steps` transitions from each, start offsets uniform.
    pub fn sample(
        &self,
        key: RngKey,
        num_trajectory: usize,
        sample_per_trajectory: usize,
        k_steps: usize,
    ) -> Result<TransitionBatch> {
        if self.entries.is_empty() {
            return Err(TrainError::SamplingUnderflow(
                "replay buffer is empty".into(),
            ));
        }
        if num_trajectory == 0 || sample_per_trajectory == 0 || k_steps == 0 {
            return Err(TrainError::SamplingUnderflow(format!(
                "nothing to sample: num_trajectory={}, sample_per_trajectory={}, k_steps={}",
                num_trajectory, sample_per_trajectory, k_steps
            )));
        }

        let mut rng = key.into_rng();
        let picks = num_trajectory.min(self.entries.len());
        if picks < num_trajectory {
            debug!(
                requested = num_trajectory,
                available = self.entries.len(),
                "sampling fewer trajectories than requested"
            );
        }

        // Successive weighted draws without replacement.
        let mut weights = self.priorities();
        let mut selected = Vec::with_capacity(picks);
        for _ in 0..picks {
            let index = match rng.choose_weighted(&weights) {
                Some(i) => i,
                None => {
                    // Every remaining priority is zero: draw uniformly among them.
                    let remaining: Vec<usize> = (0..weights.len())
                        .filter(|i| !selected.contains(i))
                        .collect();
                    remaining[rng.gen_range_usize(0..remaining.len())]
                }
            };
            weights[index] = 0.0;
            selected.push(index);
        }

        let first = self.batched_at(selected[0])?;
        let mut data =
            BatchedTransitions::with_shapes(first.observation_shape.clone(), first.policy_width);

        for &index in &selected {
            let batched = self.batched_at(index)?;
            let length = batched.len();
            if length < k_steps {
                return Err(TrainError::TrajectoryTooShort { length, k_steps });
            }
            if batched.observation_shape != data.observation_shape {
                return Err(TrainError::ShapeMismatch {
                    what: "observation",
                    expected: data.observation_shape.clone(),
                    found: batched.observation_shape.clone(),
                });
            }
            if batched.policy_width != data.policy_width {
                return Err(TrainError::ShapeMismatch {
                    what: "policy",
                    expected: vec![data.policy_width],
                    found: vec![batched.policy_width],
                });
            }

            for _ in 0..sample_per_trajectory {
                let start = rng.gen_range_usize(0..length - k_steps + 1);
                data.extend_from_rows(batched, start, k_steps);
            }
        }

        Ok(TransitionBatch {
            num_windows: selected.len() * sample_per_trajectory,
            k_steps,
            data,
        })
    }

    fn batched_at(&self, index: usize) -> Result<&BatchedTransitions> {
        self.entries[index]
            .trajectory
            .batched()
            .ok_or(TrainError::NotFinalized)
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new(500)
    }
}
