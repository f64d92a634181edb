//! Training loop controller.
//!
//! Sequences the phases of a run:
//!
//! ```text
//! Init -> WarmUp -> { SelfPlay <-> SampleAndUpdate } -> Terminal
//! ```
//!
//! with evaluation and best-checkpoint selection inside the cycle. The tracer
//! and the replay buffer are built fresh for every `fit` call; `resume`
//! continues from a `TrainerSnapshot` instead.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::{Agent, Environment, Monitor};
use crate::core::{metrics, Observation, Result, RngKey, TrainConfig, TrainError};

use super::replay_buffer::ReplayBuffer;
use super::schedule::{StepTemperature, TemperatureSchedule};
use super::self_play::{evaluate, play_episode, Episode, EpisodeSettings};
use super::tracer::NStepTracer;
use super::trajectory::Trajectory;

/// Controller phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Init,
    WarmUp,
    SelfPlay,
    SampleAndUpdate,
    Terminal,
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// `max_training_steps` updates were performed.
    StepBudget,
    /// `max_episodes` main-loop episodes were played.
    EpisodeBudget,
}

/// Mutable state of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Gradient updates performed.
    pub training_step: u64,

    /// Best evaluation return so far (`-inf` before the first evaluation).
    pub best_test_return: f64,

    /// Index of the next main-loop episode.
    pub episode: usize,

    /// Stream key for self-play and sampling.
    pub key: RngKey,

    /// Evaluation key, reused unchanged by every evaluation.
    pub test_key: RngKey,

    /// Current phase.
    pub phase: Phase,
}

impl TrainingState {
    fn new(key: RngKey, test_key: RngKey) -> Self {
        Self {
            training_step: 0,
            best_test_return: f64::NEG_INFINITY,
            episode: 0,
            key,
            test_key,
            phase: Phase::Init,
        }
    }

    /// Advance the stream key and return a leaf for one decision.
    fn next_leaf(&mut self) -> RngKey {
        let (next, leaf) = self.key.clone().split();
        self.key = next;
        leaf
    }
}

/// Everything needed to continue a run, except the agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainerSnapshot {
    pub state: TrainingState,
    pub buffer: ReplayBuffer,
}

impl TrainerSnapshot {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode bytes written by `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Write the snapshot to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read a snapshot written by `save`.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }
}

/// Result of `Trainer::fit` / `Trainer::resume`.
#[derive(Debug)]
pub struct FitOutcome<A> {
    /// The trained agent.
    pub agent: A,
    /// Final training state.
    pub state: TrainingState,
    /// Final buffer contents.
    pub buffer: ReplayBuffer,
    /// Which budget ended the run.
    pub termination: Termination,
}

impl<A> FitOutcome<A> {
    /// Capture state and buffer for a later `resume`.
    pub fn snapshot(&self) -> TrainerSnapshot {
        TrainerSnapshot {
            state: self.state.clone(),
            buffer: self.buffer.clone(),
        }
    }
}

/// Runs self-play training for an agent.
///
/// ```rust,ignore
/// let trainer = Trainer::new(TrainConfig::default().with_max_training_steps(1000));
/// let outcome = trainer.fit(agent, || Ok(ChainEnv::new(8)), &mut TracingMonitor::new("chain"))?;
/// ```
#[derive(Clone, Debug)]
pub struct Trainer<S = StepTemperature> {
    config: TrainConfig,
    schedule: S,
}

impl Trainer<StepTemperature> {
    /// Create a trainer with the default temperature schedule.
    pub fn new(config: TrainConfig) -> Self {
        Self {
            config,
            schedule: StepTemperature,
        }
    }
}

impl<S: TemperatureSchedule> Trainer<S> {
    /// Replace the temperature schedule.
    pub fn with_temperature_schedule<T: TemperatureSchedule>(self, schedule: T) -> Trainer<T> {
        Trainer {
            config: self.config,
            schedule,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train `agent` from scratch.
    ///
    /// `make_env` is called twice: once for the training environment and once
    /// for the evaluation environment.
    pub fn fit<A, E, F, M>(&self, agent: A, make_env: F, monitor: &mut M) -> Result<FitOutcome<A>>
    where
        A: Agent,
        E: Environment,
        F: FnMut() -> Result<E>,
        M: Monitor,
    {
        self.config.validate()?;
        let (env, test_env) = make_envs(make_env)?;

        let sample_input = Observation::zeros(env.observation_shape()).expand_batch();
        let (key, test_key, init_key) = RngKey::new(self.config.seed).split3();
        let mut agent = agent;
        agent.init(init_key, &sample_input)?;
        info!(seed = self.config.seed, shape = ?sample_input.shape, "agent initialised");

        let run = Run {
            config: &self.config,
            schedule: &self.schedule,
            agent,
            env,
            test_env,
            tracer: NStepTracer::from_config(&self.config.tracer)?,
            buffer: ReplayBuffer::new(self.config.buffer_capacity),
            state: TrainingState::new(key, test_key),
            monitor,
        };
        run.execute()
    }

    /// Continue a run from a snapshot with an already restored agent.
    ///
    /// Warm-up only runs if the snapshot buffer is below `buffer_warm_up`;
    /// the main loop picks up at `snapshot.state.episode`.
    pub fn resume<A, E, F, M>(
        &self,
        agent: A,
        make_env: F,
        monitor: &mut M,
        snapshot: TrainerSnapshot,
    ) -> Result<FitOutcome<A>>
    where
        A: Agent,
        E: Environment,
        F: FnMut() -> Result<E>,
        M: Monitor,
    {
        self.config.validate()?;
        if snapshot.buffer.capacity() != self.config.buffer_capacity {
            return Err(TrainError::Configuration(format!(
                "snapshot buffer capacity {} differs from configured {}",
                snapshot.buffer.capacity(),
                self.config.buffer_capacity
            )));
        }
        if snapshot.state.training_step >= self.config.max_training_steps {
            return Err(TrainError::Configuration(format!(
                "snapshot already reached the step budget ({} >= {})",
                snapshot.state.training_step, self.config.max_training_steps
            )));
        }
        let (env, test_env) = make_envs(make_env)?;
        info!(
            episode = snapshot.state.episode,
            training_step = snapshot.state.training_step,
            "resuming run"
        );

        let run = Run {
            config: &self.config,
            schedule: &self.schedule,
            agent,
            env,
            test_env,
            tracer: NStepTracer::from_config(&self.config.tracer)?,
            buffer: snapshot.buffer,
            state: snapshot.state,
            monitor,
        };
        run.execute()
    }
}

fn make_envs<E, F>(mut make_env: F) -> Result<(E, E)>
where
    E: Environment,
    F: FnMut() -> Result<E>,
{
    let env = make_env()?;
    let test_env = make_env()?;

    if env.max_episode_steps() == 0 {
        return Err(TrainError::Configuration(
            "environment allows no steps per episode".into(),
        ));
    }
    if env.observation_shape() != test_env.observation_shape() {
        return Err(TrainError::Configuration(format!(
            "training and evaluation environments disagree on observation shape: {:?} vs {:?}",
            env.observation_shape(),
            test_env.observation_shape()
        )));
    }
    Ok((env, test_env))
}

/// One in-flight run. Owns every piece of mutable state.
struct Run<'a, S, A, E, M> {
    config: &'a TrainConfig,
    schedule: &'a S,
    agent: A,
    env: E,
    test_env: E,
    tracer: NStepTracer,
    buffer: ReplayBuffer,
    state: TrainingState,
    monitor: &'a mut M,
}

impl<'a, S, A, E, M> Run<'a, S, A, E, M>
where
    S: TemperatureSchedule,
    A: Agent,
    E: Environment,
    M: Monitor,
{
    fn execute(mut self) -> Result<FitOutcome<A>> {
        self.warm_up()?;
        let termination = self.main_loop()?;
        self.state.phase = Phase::Terminal;
        info!(
            ?termination,
            training_step = self.state.training_step,
            best_test_return = self.state.best_test_return,
            "training finished"
        );

        Ok(FitOutcome {
            agent: self.agent,
            state: self.state,
            buffer: self.buffer,
            termination,
        })
    }

    fn warm_up(&mut self) -> Result<()> {
        if self.buffer.len() >= self.config.buffer_warm_up {
            return Ok(());
        }

        self.state.phase = Phase::WarmUp;
        info!(target = self.config.buffer_warm_up, "buffer warm up stage");
        while self.buffer.len() < self.config.buffer_warm_up {
            let episode = self.self_play(None, false)?;
            self.store(episode.trajectory)?;
        }
        Ok(())
    }

    fn main_loop(&mut self) -> Result<Termination> {
        info!(max_episodes = self.config.max_episodes, "start training");

        while self.state.episode < self.config.max_episodes {
            let ep = self.state.episode;

            self.state.phase = Phase::SelfPlay;
            let episode = self.self_play(Some(self.config.seed), true)?;
            let steps = episode.steps;
            self.monitor.record_metrics(&metrics([
                ("episode", ep as f64),
                ("episode_return", episode.episode_return),
                ("episode_length", steps as f64),
            ]));
            self.store(episode.trajectory)?;

            // One update per environment step of the episode just played.
            self.state.phase = Phase::SampleAndUpdate;
            for _ in 0..steps {
                if self.update_step()? {
                    self.state.episode = ep + 1;
                    return Ok(Termination::StepBudget);
                }
            }
            self.monitor.record_metrics(&metrics([(
                "training_step",
                self.state.training_step as f64,
            )]));

            if ep % self.config.test_interval == 0 {
                self.evaluate_and_select()?;
            }
            self.state.episode = ep + 1;
        }

        Ok(Termination::EpisodeBudget)
    }

    fn self_play(&mut self, reset_seed: Option<u64>, record: bool) -> Result<Episode> {
        let settings = EpisodeSettings {
            num_simulations: self.config.num_simulations,
            temperature: self
                .schedule
                .temperature(self.config.max_training_steps, self.state.training_step),
            reset_seed,
        };
        let monitor: Option<&mut dyn Monitor> = if record {
            Some(&mut *self.monitor)
        } else {
            None
        };

        let (key, episode) = play_episode(
            &mut self.agent,
            &mut self.env,
            &mut self.tracer,
            self.state.key.clone(),
            &settings,
            monitor,
        )?;
        self.state.key = key;
        Ok(episode)
    }

    /// Insert a trajectory if it is long enough to sample windows from.
    fn store(&mut self, mut trajectory: Trajectory) -> Result<()> {
        if trajectory.len() < self.config.k_steps {
            debug!(
                length = trajectory.len(),
                k_steps = self.config.k_steps,
                "dropping short trajectory"
            );
            return Ok(());
        }

        let priority = trajectory.finalize()?.mean_weight();
        self.buffer.add(trajectory, priority)
    }

    /// One sample + update. Returns true once the step budget is reached.
    fn update_step(&mut self) -> Result<bool> {
        let leaf = self.state.next_leaf();
        let batch = self.buffer.sample(
            leaf,
            self.config.num_trajectory,
            self.config.sample_per_trajectory,
            self.config.k_steps,
        )?;
        let loss = self.agent.update(&batch)?;
        self.state.training_step += 1;
        self.monitor.record_metrics(&loss);

        if self.state.training_step % self.config.save_every_n_steps == 0 {
            self.save_checkpoint(&self.config.save_path)?;
            info!(
                training_step = self.state.training_step,
                path = %self.config.save_path.display(),
                "checkpoint saved"
            );
        }

        if self.state.training_step >= self.config.max_training_steps {
            self.evaluate_and_select()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Evaluate and keep the model if it is at least as good as the best so far.
    fn evaluate_and_select(&mut self) -> Result<f64> {
        let test_return = evaluate(
            &mut self.agent,
            &mut self.test_env,
            self.state.test_key.clone(),
            self.config.num_simulations,
            self.config.num_test_episodes,
        )?;
        self.monitor.record_metrics(&metrics([("test_G", test_return)]));
        info!(
            episode = self.state.episode,
            training_step = self.state.training_step,
            test_return,
            "evaluation"
        );

        // Ties go to the newer model.
        if test_return >= self.state.best_test_return {
            self.state.best_test_return = test_return;
            let best = self.config.best_save_path();
            self.save_checkpoint(&best)?;
            info!(test_return, path = %best.display(), "new best model");
        }
        Ok(test_return)
    }

    fn save_checkpoint(&self, path: &Path) -> Result<()> {
        self.agent
            .save(path)
            .map_err(|source| TrainError::Checkpoint {
                path: path.to_path_buf(),
                source,
            })
    }
}
