//! Integration tests for the tracer -> trajectory -> replay buffer pipeline.

use rust_muzero_loop::core::{Observation, RngKey, TrainError};
use rust_muzero_loop::training::{NStepTracer, ReplayBuffer, Trajectory};
use smallvec::smallvec;

fn run_episode(tracer: &mut NStepTracer, rewards: &[f32], values: &[f32]) -> Trajectory {
    let mut trajectory = Trajectory::new();
    let last = rewards.len() - 1;
    for (t, (&r, &v)) in rewards.iter().zip(values).enumerate() {
        tracer
            .add(
                Observation::from_vec(vec![t as f32]),
                t % 2,
                r,
                t == last,
                v,
                smallvec![0.5, 0.5],
            )
            .unwrap();
        for transition in tracer.drain_ready().unwrap() {
            trajectory.add(transition).unwrap();
        }
    }
    trajectory
}

// =============================================================================
// Tracer -> Trajectory
// =============================================================================

#[test]
fn test_episode_yields_one_transition_per_step() {
    let mut tracer = NStepTracer::new(2, 0.5, 1.0).unwrap();
    let trajectory = run_episode(&mut tracer, &[1.0, 1.0, 1.0], &[0.0, 2.0, 4.0]);

    assert_eq!(trajectory.len(), 3);
    assert!(tracer.is_empty());

    let returns: Vec<f32> = trajectory
        .transitions()
        .iter()
        .map(|t| t.n_step_return)
        .collect();
    // 1 + 0.5 * 1 + 0.25 * 4, then no bootstrap for the tail
    assert_eq!(returns, vec![2.5, 1.5, 1.0]);

    let dones: Vec<bool> = trajectory.transitions().iter().map(|t| t.done).collect();
    assert_eq!(dones, vec![false, false, true]);
}

#[test]
fn test_one_step_mixing() {
    // lambda = 0: pure one-step target r + gamma * v_next
    let mut tracer = NStepTracer::new(3, 0.5, 0.0).unwrap();
    let trajectory = run_episode(&mut tracer, &[1.0, 2.0, 3.0], &[0.0, 2.0, 4.0]);

    let returns: Vec<f32> = trajectory
        .transitions()
        .iter()
        .map(|t| t.n_step_return)
        .collect();
    assert_eq!(returns, vec![2.0, 4.0, 3.0]);
}

#[test]
fn test_consecutive_episodes_share_tracer() {
    let mut tracer = NStepTracer::new(4, 0.9, 0.5).unwrap();
    let first = run_episode(&mut tracer, &[1.0; 6], &[0.0; 6]);
    let second = run_episode(&mut tracer, &[1.0; 2], &[0.0; 2]);

    assert_eq!(first.len(), 6);
    assert_eq!(second.len(), 2);
    assert!(second.transitions()[1].done);
}

#[test]
fn test_add_after_undrained_terminal_fails() {
    let mut tracer = NStepTracer::new(2, 0.9, 0.5).unwrap();
    let obs = || Observation::from_vec(vec![0.0]);
    tracer.add(obs(), 0, 1.0, true, 0.0, smallvec![1.0]).unwrap();

    let result = tracer.add(obs(), 0, 1.0, false, 0.0, smallvec![1.0]);
    assert!(matches!(result, Err(TrainError::EpisodeDone)));
}

#[test]
fn test_priority_tracks_prediction_error() {
    let mut tracer = NStepTracer::new(2, 0.9, 1.0).unwrap();
    let mut accurate = run_episode(&mut tracer, &[0.0; 4], &[0.0; 4]);
    let mut wrong = run_episode(&mut tracer, &[1.0; 4], &[0.0; 4]);

    let low = accurate.finalize().unwrap().mean_weight();
    let high = wrong.finalize().unwrap().mean_weight();
    assert!(low > 0.0);
    assert!(high > low);
}

// =============================================================================
// Replay buffer
// =============================================================================

fn finalized(len: usize) -> Trajectory {
    let mut tracer = NStepTracer::new(3, 0.9, 0.5).unwrap();
    let mut trajectory = run_episode(&mut tracer, &vec![1.0; len], &vec![0.5; len]);
    trajectory.finalize().unwrap();
    trajectory
}

#[test]
fn test_sample_windows_are_contiguous() {
    let mut buffer = ReplayBuffer::new(10);
    buffer.add(finalized(8), 1.0).unwrap();
    buffer.add(finalized(5), 1.0).unwrap();

    let batch = buffer.sample(RngKey::new(3), 2, 4, 3).unwrap();
    assert_eq!(batch.num_windows, 8);
    assert_eq!(batch.len(), 8);
    assert_eq!(batch.data.len(), 24);

    for i in 0..batch.num_windows {
        let window = batch.window(i);
        let steps: Vec<f32> = window.observations.clone();
        assert_eq!(steps[1], steps[0] + 1.0);
        assert_eq!(steps[2], steps[1] + 1.0);
    }
}

#[test]
fn test_sampling_is_deterministic_per_key() {
    let mut buffer = ReplayBuffer::new(10);
    for len in [4, 6, 9] {
        buffer.add(finalized(len), len as f64).unwrap();
    }

    let a = buffer.sample(RngKey::new(11), 2, 3, 2).unwrap();
    let b = buffer.sample(RngKey::new(11), 2, 3, 2).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_fifo_eviction() {
    let mut buffer = ReplayBuffer::new(2);
    buffer.add(finalized(3), 1.0).unwrap();
    buffer.add(finalized(4), 1.0).unwrap();
    buffer.add(finalized(5), 1.0).unwrap();

    let lengths: Vec<usize> = buffer.iter().map(Trajectory::len).collect();
    assert_eq!(lengths, vec![4, 5]);
}

#[test]
fn test_zero_priorities_still_sample() {
    let mut buffer = ReplayBuffer::new(4);
    buffer.add(finalized(3), 0.0).unwrap();
    buffer.add(finalized(3), 0.0).unwrap();

    let batch = buffer.sample(RngKey::new(0), 2, 1, 3).unwrap();
    assert_eq!(batch.num_windows, 2);
}

#[test]
fn test_sampling_contract_errors() {
    let mut buffer = ReplayBuffer::new(4);
    assert!(matches!(
        buffer.sample(RngKey::new(0), 1, 1, 1),
        Err(TrainError::SamplingUnderflow(_))
    ));

    buffer.add(finalized(2), 1.0).unwrap();
    assert!(matches!(
        buffer.sample(RngKey::new(0), 1, 1, 3),
        Err(TrainError::TrajectoryTooShort { length: 2, k_steps: 3 })
    ));

    let unfinished = Trajectory::new();
    assert!(matches!(
        buffer.add(unfinished, 1.0),
        Err(TrainError::NotFinalized)
    ));
}
