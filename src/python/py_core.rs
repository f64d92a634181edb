//! Config and error bindings for Python.

use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::core::{TracerConfig, TrainConfig, TrainError};
use crate::training::temperature;

/// Map a crate error onto the closest Python exception.
pub(crate) fn to_py_err(err: TrainError) -> PyErr {
    match err {
        TrainError::Io(_) | TrainError::Checkpoint { .. } => PyIOError::new_err(err.to_string()),
        TrainError::Configuration(_)
        | TrainError::InvalidPriority(_)
        | TrainError::ShapeMismatch { .. }
        | TrainError::TrajectoryTooShort { .. } => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Python wrapper for TracerConfig.
#[pyclass(name = "TracerConfig")]
#[derive(Clone, Debug)]
pub struct PyTracerConfig(pub TracerConfig);

#[pymethods]
impl PyTracerConfig {
    #[new]
    #[pyo3(signature = (n = 50, gamma = 0.997, lambda_ = 0.5, priority_exponent = 1.0))]
    fn new(n: usize, gamma: f64, lambda_: f64, priority_exponent: f64) -> PyResult<Self> {
        let config = TracerConfig::new(n, gamma, lambda_).with_priority_exponent(priority_exponent);
        config.validate().map_err(to_py_err)?;
        Ok(Self(config))
    }

    #[getter]
    fn n(&self) -> usize {
        self.0.n
    }

    #[getter]
    fn gamma(&self) -> f64 {
        self.0.gamma
    }

    #[getter]
    fn lambda_(&self) -> f64 {
        self.0.lambda
    }

    #[getter]
    fn priority_exponent(&self) -> f64 {
        self.0.priority_exponent
    }

    fn __repr__(&self) -> String {
        format!(
            "TracerConfig(n={}, gamma={}, lambda_={}, priority_exponent={})",
            self.0.n, self.0.gamma, self.0.lambda, self.0.priority_exponent
        )
    }
}

/// Python wrapper for TrainConfig.
#[pyclass(name = "TrainConfig")]
#[derive(Clone, Debug)]
pub struct PyTrainConfig(pub TrainConfig);

#[pymethods]
impl PyTrainConfig {
    /// Create a training configuration. Unset options keep their defaults.
    #[new]
    #[pyo3(signature = (
        tracer = None,
        buffer_capacity = 500,
        max_episodes = 1000,
        max_training_steps = 10_000,
        test_interval = 10,
        num_test_episodes = 10,
        save_every_n_steps = 1000,
        save_path = String::from("model_params"),
        num_simulations = 50,
        k_steps = 10,
        buffer_warm_up = 128,
        num_trajectory = 32,
        sample_per_trajectory = 10,
        seed = 42
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        tracer: Option<PyTracerConfig>,
        buffer_capacity: usize,
        max_episodes: usize,
        max_training_steps: u64,
        test_interval: usize,
        num_test_episodes: usize,
        save_every_n_steps: u64,
        save_path: String,
        num_simulations: u32,
        k_steps: usize,
        buffer_warm_up: usize,
        num_trajectory: usize,
        sample_per_trajectory: usize,
        seed: u64,
    ) -> PyResult<Self> {
        let config = TrainConfig::new()
            .with_tracer(tracer.map(|t| t.0).unwrap_or_default())
            .with_buffer_capacity(buffer_capacity)
            .with_max_episodes(max_episodes)
            .with_max_training_steps(max_training_steps)
            .with_test(test_interval, num_test_episodes)
            .with_save_every_n_steps(save_every_n_steps)
            .with_save_path(save_path)
            .with_num_simulations(num_simulations)
            .with_k_steps(k_steps)
            .with_buffer_warm_up(buffer_warm_up)
            .with_batch(num_trajectory, sample_per_trajectory)
            .with_seed(seed);
        config.validate().map_err(to_py_err)?;
        Ok(Self(config))
    }

    #[getter]
    fn tracer(&self) -> PyTracerConfig {
        PyTracerConfig(self.0.tracer.clone())
    }

    #[getter]
    fn max_training_steps(&self) -> u64 {
        self.0.max_training_steps
    }

    #[getter]
    fn k_steps(&self) -> usize {
        self.0.k_steps
    }

    #[getter]
    fn seed(&self) -> u64 {
        self.0.seed
    }

    #[getter]
    fn save_path(&self) -> String {
        self.0.save_path.display().to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "TrainConfig(max_training_steps={}, k_steps={}, warm_up={}, seed={})",
            self.0.max_training_steps, self.0.k_steps, self.0.buffer_warm_up, self.0.seed
        )
    }
}

/// Default exploration temperature at `training_steps` out of `max_training_steps`.
#[pyfunction]
#[pyo3(name = "temperature")]
pub fn py_temperature(max_training_steps: u64, training_steps: u64) -> f64 {
    temperature(max_training_steps, training_steps)
}
