//! Training loop bindings for Python.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::agent::{TracingMonitor, UniformAgent};
use crate::envs::EnvRegistry;
use crate::training::Trainer;

use super::py_core::{to_py_err, PyTrainConfig};

/// Run the training loop with the uniform baseline agent on a registered
/// environment. Returns a dict with the final counters.
#[pyfunction]
#[pyo3(signature = (env_id, config, num_actions = 2))]
pub fn train_uniform<'py>(
    py: Python<'py>,
    env_id: &str,
    config: &PyTrainConfig,
    num_actions: usize,
) -> PyResult<Bound<'py, PyDict>> {
    let registry = EnvRegistry::with_defaults();
    let mut monitor = TracingMonitor::new(env_id);
    let outcome = Trainer::new(config.0.clone())
        .fit(
            UniformAgent::new(num_actions),
            || registry.make(env_id),
            &mut monitor,
        )
        .map_err(to_py_err)?;

    let dict = PyDict::new_bound(py);
    dict.set_item("training_step", outcome.state.training_step)?;
    dict.set_item("episodes", outcome.state.episode)?;
    dict.set_item("best_test_return", outcome.state.best_test_return)?;
    dict.set_item("buffer_len", outcome.buffer.len())?;
    dict.set_item("termination", format!("{:?}", outcome.termination))?;
    Ok(dict)
}

/// Ids of the built-in environments.
#[pyfunction]
pub fn env_ids() -> Vec<String> {
    EnvRegistry::with_defaults()
        .ids()
        .into_iter()
        .map(String::from)
        .collect()
}
