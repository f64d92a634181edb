//! Python bindings for the rust-muzero-loop experience pipeline.
//!
//! # Quick Start
//!
//! ```python
//! import rust_muzero_loop as ml
//!
//! tracer = ml.NStepTracer(ml.TracerConfig(n=5, gamma=0.99, lambda_=0.5))
//! traj = ml.Trajectory()
//! for t in range(8):
//!     tracer.add([float(t)], 0, 1.0, t == 7, 0.0, [0.5, 0.5])
//!     for tr in tracer.drain():
//!         traj.add(tr)
//!
//! buffer = ml.ReplayBuffer(capacity=100)
//! buffer.add(traj)
//! batch = buffer.sample(seed=0, num_trajectory=1, sample_per_trajectory=4, k_steps=3)
//! batch["observations"].shape  # (4, 3, 1)
//! ```

use pyo3::prelude::*;

mod py_core;
mod py_trainer;
mod py_training;

pub use py_core::*;
pub use py_trainer::*;
pub use py_training::*;

/// rust_muzero_loop: experience pipeline for MuZero-style training.
#[pymodule]
fn rust_muzero_loop(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Config
    m.add_class::<PyTracerConfig>()?;
    m.add_class::<PyTrainConfig>()?;
    m.add_function(wrap_pyfunction!(py_temperature, m)?)?;

    // Pipeline
    m.add_class::<PyTransition>()?;
    m.add_class::<PyNStepTracer>()?;
    m.add_class::<PyTrajectory>()?;
    m.add_class::<PyReplayBuffer>()?;

    // Training loop
    m.add_function(wrap_pyfunction!(train_uniform, m)?)?;
    m.add_function(wrap_pyfunction!(env_ids, m)?)?;

    Ok(())
}
