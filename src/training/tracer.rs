//! N-step return tracer.
//!
//! Turns a live stream of single environment steps into `Transition`s that
//! carry a bootstrapped return. A step becomes ready once `n` later steps are
//! known or its episode has ended; at episode end every pending step becomes
//! ready, so draining after each `add` never leaves a step behind.
//!
//! For the step at time t, with rewards r and value estimates v:
//!
//! - `G_n = sum_{k<m} gamma^k r_{t+k} + gamma^n v_{t+n}` (m = n, or fewer at episode end;
//!   the bootstrap term is dropped when step t+n does not exist)
//! - `G_1 = r_t + gamma v_{t+1}` (bootstrap dropped at the final step)
//! - `Rn = lambda G_n + (1 - lambda) G_1`
//! - `w = (|Rn - v_t| + eps)^alpha`

use std::collections::VecDeque;

use crate::core::{ActionId, Observation, Policy, Result, TrainError, TracerConfig};

use super::trajectory::Transition;

/// Keeps weights strictly positive so no step becomes unsampleable.
const WEIGHT_EPSILON: f64 = 1e-6;

/// A raw step waiting for enough lookahead.
#[derive(Clone, Debug)]
struct PendingStep {
    observation: Observation,
    action: ActionId,
    reward: f32,
    value: f32,
    policy: Policy,
}

/// Bounded-lookahead n-step return accumulator.
#[derive(Clone, Debug)]
pub struct NStepTracer {
    n: usize,
    gamma: f64,
    lambda: f64,
    priority_exponent: f64,
    /// `gamma^k` for `k in 0..n`.
    discounts: Vec<f64>,
    /// `gamma^n`.
    discount_n: f64,
    pending: VecDeque<PendingStep>,
    episode_done: bool,
}

impl NStepTracer {
    /// Create a tracer with lookahead `n`, discount `gamma` and mixing `lambda`.
    pub fn new(n: usize, gamma: f64, lambda: f64) -> Result<Self> {
        Self::from_config(&TracerConfig::new(n, gamma, lambda))
    }

    /// Create a tracer from a config. Fails with `Configuration` on invalid
    /// parameters (`n == 0`, `gamma` outside `[0, 1)`, ...).
    pub fn from_config(config: &TracerConfig) -> Result<Self> {
        config.validate()?;
        let discounts = (0..config.n).map(|k| config.gamma.powi(k as i32)).collect();
        Ok(Self {
            n: config.n,
            gamma: config.gamma,
            lambda: config.lambda,
            priority_exponent: config.priority_exponent,
            discounts,
            discount_n: config.gamma.powi(config.n as i32),
            pending: VecDeque::with_capacity(config.n + 1),
            episode_done: false,
        })
    }

    /// Discount factor.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Lookahead depth.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Synthetic reward for a truncated (not terminal) final step:
    /// the value of receiving reward 1 forever, `1 / (1 - gamma)`.
    pub fn truncation_reward(&self) -> f32 {
        (1.0 / (1.0 - self.gamma)) as f32
    }

    /// Number of buffered steps, ready or not.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if no steps are buffered.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Check if `pop` would succeed.
    pub fn is_ready(&self) -> bool {
        !self.pending.is_empty() && (self.episode_done || self.pending.len() > self.n)
    }

    /// Discard all buffered steps.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.episode_done = false;
    }

    /// Buffer one raw step.
    ///
    /// `terminal` must be true for the last step of an episode, whether the
    /// episode terminated or was truncated.
    pub fn add(
        &mut self,
        observation: Observation,
        action: ActionId,
        reward: f32,
        terminal: bool,
        value: f32,
        policy: Policy,
    ) -> Result<()> {
        if self.episode_done {
            if !self.pending.is_empty() {
                return Err(TrainError::EpisodeDone);
            }
            self.episode_done = false;
        }

        self.pending.push_back(PendingStep {
            observation,
            action,
            reward,
            value,
            policy,
        });
        self.episode_done = terminal;
        Ok(())
    }

    /// Remove the oldest ready step as a finished transition.
    pub fn pop(&mut self) -> Result<Transition> {
        if !self.is_ready() {
            return Err(TrainError::TracerEmpty);
        }
        let step = self.pending.pop_front().ok_or(TrainError::TracerEmpty)?;

        // The popped step's reward, then up to n - 1 later rewards.
        let partial: f64 = std::iter::once(step.reward)
            .chain(self.pending.iter().map(|s| s.reward))
            .zip(&self.discounts)
            .map(|(r, d)| d * f64::from(r))
            .sum();

        let bootstrap_n = if self.pending.len() >= self.n {
            self.discount_n * f64::from(self.pending[self.n - 1].value)
        } else {
            0.0
        };
        let g_n = partial + bootstrap_n;

        let g_1 = f64::from(step.reward)
            + self
                .pending
                .front()
                .map_or(0.0, |next| self.gamma * f64::from(next.value));

        let n_step_return = self.lambda * g_n + (1.0 - self.lambda) * g_1;
        let weight = ((n_step_return - f64::from(step.value)).abs() + WEIGHT_EPSILON)
            .powf(self.priority_exponent);

        let done = self.episode_done && self.pending.is_empty();
        if done {
            self.episode_done = false;
        }

        Ok(Transition {
            observation: step.observation,
            action: step.action,
            reward: step.reward,
            done,
            value: step.value,
            policy: step.policy,
            n_step_return: n_step_return as f32,
            weight: weight as f32,
        })
    }

    /// Pop every ready transition, oldest first.
    pub fn drain_ready(&mut self) -> Result<Vec<Transition>> {
        let mut out = Vec::new();
        while self.is_ready() {
            out.push(self.pop()?);
        }
        Ok(out)
    }
}
