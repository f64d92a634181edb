//! Self-play episodes and evaluation passes.
//!
//! Both functions take the random key by value and (for self-play) hand back
//! the continuation key, so the caller decides what state flows forward.

use tracing::debug;

use crate::agent::{ActRequest, Agent, Environment, Monitor};
use crate::core::{metrics, Observation, Result, RngKey, TrainError};

use super::tracer::NStepTracer;
use super::trajectory::Trajectory;

/// Per-episode settings for self-play.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeSettings {
    /// Search budget per action.
    pub num_simulations: u32,

    /// Exploration temperature for the whole episode.
    pub temperature: f64,

    /// Seed passed to `Environment::reset`.
    pub reset_seed: Option<u64>,
}

/// A finished self-play episode.
#[derive(Clone, Debug, PartialEq)]
pub struct Episode {
    /// Finalized trajectory (not finalized only if the episode took no step).
    pub trajectory: Trajectory,

    /// Environment steps taken.
    pub steps: usize,

    /// Undiscounted sum of environment rewards, before truncation reshaping.
    pub episode_return: f64,

    /// Actions in the order they were taken.
    pub actions: Vec<usize>,
}

/// Run one self-play episode and return the continuation key with it.
///
/// Each step splits the key, asks the agent for an action with policy and
/// value, steps the environment, feeds the tracer and drains every ready
/// transition into the trajectory. A truncated, non-terminal final step gets
/// the reward `1 / (1 - gamma)`. Running into the environment's step bound
/// without a terminal or truncated flag counts as truncation, so the tracer
/// is always flushed when the episode ends.
pub fn play_episode<A, E>(
    agent: &mut A,
    env: &mut E,
    tracer: &mut NStepTracer,
    key: RngKey,
    settings: &EpisodeSettings,
    mut monitor: Option<&mut dyn Monitor>,
) -> Result<(RngKey, Episode)>
where
    A: Agent + ?Sized,
    E: Environment + ?Sized,
{
    debug_assert!(tracer.is_empty(), "tracer carried steps across episodes");

    let (mut observation, _info) = env.reset(settings.reset_seed)?;
    check_shape(&*env, &observation)?;
    let max_steps = env.max_episode_steps();
    let request = ActRequest::self_play(settings.num_simulations, settings.temperature);

    let mut key = key;
    let mut trajectory = Trajectory::new();
    let mut actions = Vec::new();
    let mut episode_return = 0.0;

    for t in 0..max_steps {
        let (next_key, leaf) = key.split();
        key = next_key;

        let out = agent.act(leaf, &observation, &request)?;
        let policy = out
            .policy
            .ok_or_else(|| TrainError::Agent("self-play requires a search policy".into()))?;
        let value = out
            .value
            .ok_or_else(|| TrainError::Agent("self-play requires a value estimate".into()))?;

        let step = env.step(out.action)?;
        actions.push(out.action);
        episode_return += f64::from(step.reward);

        let truncated = step.truncated || t + 1 == max_steps;
        let reward = if truncated && !step.terminal {
            tracer.truncation_reward()
        } else {
            step.reward
        };
        let episode_over = step.terminal || truncated;

        tracer.add(observation, out.action, reward, episode_over, value, policy)?;
        while tracer.is_ready() {
            let transition = tracer.pop()?;
            if let Some(monitor) = monitor.as_deref_mut() {
                monitor.record_metrics(&metrics([
                    ("v", f64::from(transition.value)),
                    ("Rn", f64::from(transition.n_step_return)),
                ]));
            }
            trajectory.add(transition)?;
        }

        if episode_over {
            break;
        }
        observation = step.observation;
    }

    if !trajectory.is_empty() {
        trajectory.finalize()?;
    }
    debug!(
        steps = actions.len(),
        episode_return, "self-play episode finished"
    );

    Ok((
        key,
        Episode {
            steps: actions.len(),
            trajectory,
            episode_return,
            actions,
        },
    ))
}

/// Mean undiscounted return of `num_episodes` greedy episodes.
///
/// The key is consumed locally: passing the same key again replays the same
/// random decisions.
pub fn evaluate<A, E>(
    agent: &mut A,
    env: &mut E,
    key: RngKey,
    num_simulations: u32,
    num_episodes: usize,
) -> Result<f64>
where
    A: Agent + ?Sized,
    E: Environment + ?Sized,
{
    if num_episodes == 0 {
        return Err(TrainError::Configuration(
            "evaluation needs at least one episode".into(),
        ));
    }

    let request = ActRequest::greedy(num_simulations);
    let max_steps = env.max_episode_steps();
    let mut key = key;
    let mut total = 0.0;

    for _ in 0..num_episodes {
        let (mut observation, _info) = env.reset(None)?;
        check_shape(&*env, &observation)?;
        let mut episode_return = 0.0;

        for _ in 0..max_steps {
            let (next_key, leaf) = key.split();
            key = next_key;

            let out = agent.act(leaf, &observation, &request)?;
            let step = env.step(out.action)?;
            episode_return += f64::from(step.reward);
            if step.terminal || step.truncated {
                break;
            }
            observation = step.observation;
        }

        total += episode_return;
    }

    Ok(total / num_episodes as f64)
}

fn check_shape<E: Environment + ?Sized>(env: &E, observation: &Observation) -> Result<()> {
    let declared = env.observation_shape();
    if observation.shape != declared {
        return Err(TrainError::Configuration(format!(
            "environment reset produced shape {:?}, declared {:?}",
            observation.shape, declared
        )));
    }
    Ok(())
}
