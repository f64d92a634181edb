//! Experience pipeline bindings for Python.

use numpy::{PyArray1, PyArray2, PyArrayDyn, PyArrayMethods};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::core::{Observation, RngKey};
use crate::training::{BatchedTransitions, NStepTracer, ReplayBuffer, Trajectory, Transition};

use super::py_core::{to_py_err, PyTracerConfig};

/// Python wrapper for Transition.
#[pyclass(name = "Transition")]
#[derive(Clone)]
pub struct PyTransition(pub Transition);

#[pymethods]
impl PyTransition {
    #[getter]
    fn observation<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArrayDyn<f32>>> {
        PyArray1::from_slice_bound(py, &self.0.observation.data)
            .reshape(self.0.observation.shape.clone())
    }

    #[getter]
    fn action(&self) -> usize {
        self.0.action
    }

    #[getter]
    fn reward(&self) -> f32 {
        self.0.reward
    }

    #[getter]
    fn done(&self) -> bool {
        self.0.done
    }

    #[getter]
    fn value(&self) -> f32 {
        self.0.value
    }

    #[getter]
    fn policy(&self) -> Vec<f32> {
        self.0.policy.to_vec()
    }

    #[getter]
    fn n_step_return(&self) -> f32 {
        self.0.n_step_return
    }

    #[getter]
    fn weight(&self) -> f32 {
        self.0.weight
    }

    fn __repr__(&self) -> String {
        format!(
            "Transition(action={}, reward={}, Rn={:.3}, w={:.3}, done={})",
            self.0.action, self.0.reward, self.0.n_step_return, self.0.weight, self.0.done
        )
    }
}

/// Python wrapper for NStepTracer.
#[pyclass(name = "NStepTracer")]
pub struct PyNStepTracer(pub NStepTracer);

#[pymethods]
impl PyNStepTracer {
    #[new]
    #[pyo3(signature = (config = None))]
    fn new(config: Option<PyTracerConfig>) -> PyResult<Self> {
        NStepTracer::from_config(&config.map(|c| c.0).unwrap_or_default())
            .map(Self)
            .map_err(to_py_err)
    }

    /// Buffer one raw step.
    #[allow(clippy::too_many_arguments)]
    fn add(
        &mut self,
        observation: Vec<f32>,
        action: usize,
        reward: f32,
        terminal: bool,
        value: f32,
        policy: Vec<f32>,
    ) -> PyResult<()> {
        self.0
            .add(
                Observation::from_vec(observation),
                action,
                reward,
                terminal,
                value,
                policy.into_iter().collect(),
            )
            .map_err(to_py_err)
    }

    fn is_ready(&self) -> bool {
        self.0.is_ready()
    }

    fn pop(&mut self) -> PyResult<PyTransition> {
        self.0.pop().map(PyTransition).map_err(to_py_err)
    }

    /// Pop every ready transition.
    fn drain(&mut self) -> PyResult<Vec<PyTransition>> {
        Ok(self
            .0
            .drain_ready()
            .map_err(to_py_err)?
            .into_iter()
            .map(PyTransition)
            .collect())
    }

    fn reset(&mut self) {
        self.0.reset();
    }

    #[getter]
    fn truncation_reward(&self) -> f32 {
        self.0.truncation_reward()
    }

    fn __len__(&self) -> usize {
        self.0.len()
    }
}

/// Python wrapper for Trajectory.
#[pyclass(name = "Trajectory")]
#[derive(Clone)]
pub struct PyTrajectory(pub Trajectory);

#[pymethods]
impl PyTrajectory {
    #[new]
    fn new() -> Self {
        Self(Trajectory::new())
    }

    fn add(&mut self, transition: &PyTransition) -> PyResult<()> {
        self.0.add(transition.0.clone()).map_err(to_py_err)
    }

    /// Stack transitions; returns the priority (mean weight).
    fn finalize(&mut self) -> PyResult<f64> {
        self.0
            .finalize()
            .map(BatchedTransitions::mean_weight)
            .map_err(to_py_err)
    }

    #[getter]
    fn is_finalized(&self) -> bool {
        self.0.is_finalized()
    }

    #[getter]
    fn priority(&self) -> Option<f64> {
        self.0.priority()
    }

    fn transitions(&self) -> Vec<PyTransition> {
        self.0
            .transitions()
            .iter()
            .map(|t| PyTransition(t.clone()))
            .collect()
    }

    fn __len__(&self) -> usize {
        self.0.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Trajectory(len={}, finalized={})",
            self.0.len(),
            self.0.is_finalized()
        )
    }
}

/// Python wrapper for ReplayBuffer.
#[pyclass(name = "ReplayBuffer")]
pub struct PyReplayBuffer {
    inner: ReplayBuffer,
}

#[pymethods]
impl PyReplayBuffer {
    #[new]
    #[pyo3(signature = (capacity = 500))]
    fn new(capacity: usize) -> PyResult<Self> {
        if capacity == 0 {
            return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(
                "replay buffer capacity must be positive",
            ));
        }
        Ok(Self {
            inner: ReplayBuffer::new(capacity),
        })
    }

    /// Add a finalized trajectory. Priority defaults to its mean weight.
    #[pyo3(signature = (trajectory, priority = None))]
    fn add(&mut self, trajectory: &PyTrajectory, priority: Option<f64>) -> PyResult<()> {
        let mut trajectory = trajectory.0.clone();
        let priority = match priority {
            Some(p) => p,
            None => trajectory.finalize().map_err(to_py_err)?.mean_weight(),
        };
        self.inner.add(trajectory, priority).map_err(to_py_err)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    #[getter]
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    /// Sample a batch as a dict of numpy arrays.
    ///
    /// Keys: observations `[W, K, *obs_shape]`, policies `[W, K, A]` and
    /// actions, rewards, dones, values, returns, weights as `[W, K]`.
    fn sample<'py>(
        &self,
        py: Python<'py>,
        seed: u64,
        num_trajectory: usize,
        sample_per_trajectory: usize,
        k_steps: usize,
    ) -> PyResult<Bound<'py, PyDict>> {
        let batch = self
            .inner
            .sample(RngKey::new(seed), num_trajectory, sample_per_trajectory, k_steps)
            .map_err(to_py_err)?;
        let windows = batch.num_windows;
        let data = batch.data;

        let mut obs_shape = vec![windows, k_steps];
        obs_shape.extend_from_slice(&data.observation_shape);
        let to_value_err =
            |e: PyErr| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e));

        let dict = PyDict::new_bound(py);
        dict.set_item(
            "observations",
            PyArray1::from_vec_bound(py, data.observations)
                .reshape(obs_shape)
                .map_err(to_value_err)?,
        )?;
        dict.set_item(
            "policies",
            PyArray1::from_vec_bound(py, data.policies)
                .reshape([windows, k_steps, data.policy_width])
                .map_err(to_value_err)?,
        )?;

        let actions: Vec<i64> = data.actions.iter().map(|&a| a as i64).collect();
        dict.set_item("actions", matrix(py, actions, windows, k_steps)?)?;
        dict.set_item("rewards", matrix(py, data.rewards, windows, k_steps)?)?;
        dict.set_item("dones", matrix(py, data.dones, windows, k_steps)?)?;
        dict.set_item("values", matrix(py, data.values, windows, k_steps)?)?;
        dict.set_item("returns", matrix(py, data.returns, windows, k_steps)?)?;
        dict.set_item("weights", matrix(py, data.weights, windows, k_steps)?)?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        format!(
            "ReplayBuffer(len={}, capacity={}, transitions={})",
            self.inner.len(),
            self.inner.capacity(),
            self.inner.total_transitions()
        )
    }
}

fn matrix<'py, T: numpy::Element>(
    py: Python<'py>,
    values: Vec<T>,
    rows: usize,
    cols: usize,
) -> PyResult<Bound<'py, PyArray2<T>>> {
    PyArray1::from_vec_bound(py, values)
        .reshape([rows, cols])
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e)))
}
