//! Data types shared by the agent, environment and experience pipeline.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Discrete action index.
pub type ActionId = usize;

/// Action distribution produced by the agent's search.
///
/// SmallVec keeps typical action spaces (< 8 actions) off the heap.
pub type Policy = SmallVec<[f32; 8]>;

/// Named scalar metrics (losses, returns, counters).
pub type Metrics = FxHashMap<String, f64>;

/// Build a metrics map from name/value pairs.
pub fn metrics<const N: usize>(pairs: [(&str, f64); N]) -> Metrics {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Environment observation as a flat tensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Flattened tensor data (row-major order).
    pub data: Vec<f32>,

    /// Shape of the tensor (e.g., [features] or [channels, height, width]).
    pub shape: Vec<usize>,
}

impl Observation {
    /// Create a new observation.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(
            data.len(),
            shape.iter().product::<usize>(),
            "Tensor length must match shape product"
        );
        Self { data, shape }
    }

    /// Create a one-dimensional observation.
    pub fn from_vec(data: Vec<f32>) -> Self {
        let shape = vec![data.len()];
        Self { data, shape }
    }

    /// Create a zero-filled observation with the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self {
            data: vec![0.0; size],
            shape,
        }
    }

    /// Add a leading batch dimension of size one.
    #[must_use]
    pub fn expand_batch(&self) -> Self {
        let mut shape = Vec::with_capacity(self.shape.len() + 1);
        shape.push(1);
        shape.extend_from_slice(&self.shape);
        Self {
            data: self.data.clone(),
            shape,
        }
    }

    /// Get the total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the tensor is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
